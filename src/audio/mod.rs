//! Audio feedback
//!
//! The simulation never plays sound itself. Game events are routed to an
//! [`AudioSink`], which is fire-and-forget: a failed or muted playback has
//! no effect on the game.

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

use crate::sim::{GameEvent, GamePhase};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Actor jumped
    Jump,
    /// Obstacle passed
    Score,
    /// Session ended
    Fail,
}

impl SoundEffect {
    /// Base volume before settings are applied
    pub fn base_volume(self) -> f32 {
        match self {
            SoundEffect::Jump => 0.5,
            SoundEffect::Score => 0.7,
            SoundEffect::Fail => 0.8,
        }
    }
}

/// Base volume of the menu theme
pub const THEME_VOLUME: f32 = 0.5;

/// What a sink should do for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCue {
    Effect(SoundEffect),
    /// Start (true) or stop (false) the looping theme
    Theme(bool),
}

/// Map a game event to its audio cue, if any
pub fn cue_for(event: &GameEvent) -> Option<AudioCue> {
    match event {
        GameEvent::Jumped => Some(AudioCue::Effect(SoundEffect::Jump)),
        GameEvent::Scored { .. } => Some(AudioCue::Effect(SoundEffect::Score)),
        GameEvent::Crashed { .. } => Some(AudioCue::Effect(SoundEffect::Fail)),
        GameEvent::PhaseChanged { to, .. } => Some(AudioCue::Theme(*to == GamePhase::Menu)),
        _ => None,
    }
}

/// Something that can make noise
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);

    fn set_theme(&mut self, playing: bool);

    fn set_muted(&mut self, muted: bool);

    fn is_muted(&self) -> bool;

    fn toggle_muted(&mut self) -> bool {
        let muted = !self.is_muted();
        self.set_muted(muted);
        muted
    }

    /// Route one game event
    fn handle_event(&mut self, event: &GameEvent) {
        match cue_for(event) {
            Some(AudioCue::Effect(effect)) => self.play(effect),
            Some(AudioCue::Theme(playing)) => self.set_theme(playing),
            None => {}
        }
    }
}

/// Sink that only logs; used natively where there is no audio device
#[derive(Debug, Clone, Default)]
pub struct LogAudio {
    muted: bool,
    theme_wanted: bool,
    played: Vec<SoundEffect>,
}

impl LogAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effects that would have been audible
    pub fn played(&self) -> &[SoundEffect] {
        &self.played
    }

    pub fn theme_audible(&self) -> bool {
        self.theme_wanted && !self.muted
    }
}

impl AudioSink for LogAudio {
    fn play(&mut self, effect: SoundEffect) {
        if self.muted {
            return;
        }
        log::debug!("sfx {:?}", effect);
        self.played.push(effect);
    }

    fn set_theme(&mut self, playing: bool) {
        self.theme_wanted = playing;
        log::debug!("theme {}", if self.theme_audible() { "on" } else { "off" });
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn is_muted(&self) -> bool {
        self.muted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::CrashCause;

    #[test]
    fn test_event_cues() {
        assert_eq!(cue_for(&GameEvent::Jumped), Some(AudioCue::Effect(SoundEffect::Jump)));
        assert_eq!(
            cue_for(&GameEvent::Crashed {
                cause: CrashCause::Collision,
                score: 1,
                new_high_score: true
            }),
            Some(AudioCue::Effect(SoundEffect::Fail))
        );
        assert_eq!(
            cue_for(&GameEvent::PhaseChanged {
                from: GamePhase::Menu,
                to: GamePhase::Playing
            }),
            Some(AudioCue::Theme(false))
        );
        assert_eq!(cue_for(&GameEvent::RewardEligiblePass { tokens_earned: 1 }), None);
    }

    #[test]
    fn test_mute_silences_effects_and_theme() {
        let mut audio = LogAudio::new();
        audio.handle_event(&GameEvent::PhaseChanged {
            from: GamePhase::GameOver,
            to: GamePhase::Menu,
        });
        assert!(audio.theme_audible());

        assert!(audio.toggle_muted());
        assert!(!audio.theme_audible());
        audio.handle_event(&GameEvent::Jumped);
        assert!(audio.played().is_empty());

        // Unmuting in the menu brings the theme back
        assert!(!audio.toggle_muted());
        assert!(audio.theme_audible());
        audio.handle_event(&GameEvent::Scored { score: 1 });
        assert_eq!(audio.played(), &[SoundEffect::Score]);
    }
}
