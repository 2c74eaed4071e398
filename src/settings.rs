//! Game settings and preferences
//!
//! Persisted as JSON in LocalStorage on the web. Natively, an optional JSON
//! file named by `SUI_FLAP_SETTINGS` is read; there is nothing to save to.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::LedgerConfig;
use crate::reward::RewardPolicy;

/// Selectable character (cosmetic only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Character {
    #[default]
    Puldeng,
    Pingu,
    Blub,
    Mitsuki,
}

impl Character {
    pub const ALL: [Character; 4] = [
        Character::Puldeng,
        Character::Pingu,
        Character::Blub,
        Character::Mitsuki,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Character::Puldeng => "Puldeng",
            Character::Pingu => "Pingu",
            Character::Blub => "Blub",
            Character::Mitsuki => "Mitsuki",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Character::Puldeng => "🦛",
            Character::Pingu => "🐧",
            Character::Blub => "🐟",
            Character::Mitsuki => "🐈",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("cannot read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("{field} must be within 0..=1, got {value}")]
    InvalidVolume { field: &'static str, value: f32 },
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    pub sound_enabled: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,

    pub character: Character,

    /// Fixed RNG seed; a fresh one is drawn when absent
    pub seed: Option<u64>,

    // === Rewards ===
    pub ledger: LedgerConfig,
    pub reward: RewardPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            master_volume: 1.0,
            sfx_volume: 1.0,
            music_volume: 1.0,
            character: Character::default(),
            seed: None,
            ledger: LedgerConfig::default(),
            reward: RewardPolicy::default(),
        }
    }
}

impl Settings {
    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "sui_flap_settings";

    /// Environment variable naming a settings file (native)
    pub const PATH_ENV: &'static str = "SUI_FLAP_SETTINGS";

    /// Parse and validate; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        for (field, value) in [
            ("master_volume", self.master_volume),
            ("sfx_volume", self.sfx_volume),
            ("music_volume", self.music_volume),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SettingsError::InvalidVolume { field, value });
            }
        }
        Ok(())
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            match self.to_json() {
                Ok(json) => {
                    let _ = storage.set_item(Self::STORAGE_KEY, &json);
                    log::info!("Settings saved");
                }
                Err(e) => log::warn!("Settings not saved: {}", e),
            }
        }
    }

    /// Load from the file named by `SUI_FLAP_SETTINGS`, else defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Ok(path) = std::env::var(Self::PATH_ENV) else {
            return Self::default();
        };
        match Self::load_file(std::path::Path::new(&path)) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path);
                settings
            }
            Err(e) => {
                log::warn!("Using default settings: {}", e);
                Self::default()
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_file(path: &std::path::Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
