//! Audio sink using the Web Audio API
//!
//! Effects are generated procedurally; the theme is a looping media element.

use web_sys::{AudioContext, GainNode, HtmlAudioElement, OscillatorNode, OscillatorType};

use super::{AudioSink, SoundEffect, THEME_VOLUME};

/// Theme track served next to the wasm bundle
const THEME_URL: &str = "/suiflap_themesong.mp3";

/// Audio manager for the browser
pub struct WebAudio {
    ctx: Option<AudioContext>,
    theme: Option<HtmlAudioElement>,
    master_volume: f32,
    sfx_volume: f32,
    music_volume: f32,
    muted: bool,
    theme_wanted: bool,
}

impl WebAudio {
    pub fn new(master_volume: f32, sfx_volume: f32, music_volume: f32, muted: bool) -> Self {
        // Try to create audio context (may fail if not in secure context)
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - effects disabled");
        }
        let theme = HtmlAudioElement::new_with_src(THEME_URL).ok();
        match &theme {
            Some(el) => el.set_loop(true),
            None => log::warn!("Failed to create theme element - music disabled"),
        }
        let mut audio = Self {
            ctx,
            theme,
            master_volume: master_volume.clamp(0.0, 1.0),
            sfx_volume: sfx_volume.clamp(0.0, 1.0),
            music_volume: music_volume.clamp(0.0, 1.0),
            muted,
            theme_wanted: false,
        };
        audio.apply_theme();
        audio
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    fn effect_volume(&self, effect: SoundEffect) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume * effect.base_volume()
        }
    }

    /// Start or pause the theme element to match mute and phase
    fn apply_theme(&mut self) {
        let Some(theme) = &self.theme else { return };
        if self.theme_wanted && !self.muted {
            theme.set_volume((self.master_volume * self.music_volume * THEME_VOLUME) as f64);
            if let Err(e) = theme.play() {
                log::debug!("Theme play failed: {:?}", e);
            }
        } else {
            let _ = theme.pause();
        }
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Jump - quick upward chirp
    fn play_jump(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 300.0, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.4, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.12)
            .ok();
        osc.frequency().set_value_at_time(300.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(700.0, t + 0.1)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.15).ok();
    }

    /// Score - two-note coin
    fn play_coin(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [988.0, 1319.0].iter().enumerate() {
            let delay = i as f64 * 0.07;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Square) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol * 0.2, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.25)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.3).ok();
            }
        }
    }

    /// Fail - sad descending
    fn play_fail(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [400.0, 350.0, 300.0, 200.0].iter().enumerate() {
            let delay = i as f64 * 0.2;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol * 0.3, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                    .ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.4).ok();
            }
        }
    }
}

impl AudioSink for WebAudio {
    fn play(&mut self, effect: SoundEffect) {
        let vol = self.effect_volume(effect);
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match effect {
            SoundEffect::Jump => self.play_jump(ctx, vol),
            SoundEffect::Score => self.play_coin(ctx, vol),
            SoundEffect::Fail => self.play_fail(ctx, vol),
        }
    }

    fn set_theme(&mut self, playing: bool) {
        self.theme_wanted = playing;
        self.apply_theme();
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.apply_theme();
    }

    fn is_muted(&self) -> bool {
        self.muted
    }
}
