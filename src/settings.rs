//! Game settings and preferences
//!
//! Persisted separately from the best score in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::platform::storage;

/// Shuffle pace presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Pace {
    Relaxed,
    #[default]
    Normal,
    Brisk,
}

impl Pace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pace::Relaxed => "Relaxed",
            Pace::Normal => "Normal",
            Pace::Brisk => "Brisk",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "relaxed" | "slow" => Some(Pace::Relaxed),
            "normal" => Some(Pace::Normal),
            "brisk" | "fast" => Some(Pace::Brisk),
            _ => None,
        }
    }

    /// Next preset in the settings toggle cycle
    pub fn next(&self) -> Self {
        match self {
            Pace::Relaxed => Pace::Normal,
            Pace::Normal => Pace::Brisk,
            Pace::Brisk => Pace::Relaxed,
        }
    }

    /// Shuffle duration multiplier
    pub fn multiplier(&self) -> f32 {
        match self {
            Pace::Relaxed => 1.25,
            Pace::Normal => 1.0,
            Pace::Brisk => 0.8,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Shuffle pace
    pub pace: Pace,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
    /// Pause when window loses focus
    pub pause_on_blur: bool,

    // === Accessibility ===
    /// Reduced motion (no shell lift, no red flash)
    pub reduced_motion: bool,
    /// High contrast mode
    pub high_contrast: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pace: Pace::Normal,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            pause_on_blur: true,

            reduced_motion: false,
            high_contrast: false,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "pearl_shell_settings";

    /// Effective shell lift animation (respects reduced_motion)
    pub fn effective_lift(&self) -> bool {
        !self.reduced_motion
    }

    /// Effective wrong-guess flash (respects reduced_motion)
    pub fn effective_flash(&self) -> bool {
        !self.reduced_motion
    }

    /// Effective sound effect volume
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Load settings from storage
    pub fn load() -> Self {
        if let Some(json) = storage::get_item(Self::STORAGE_KEY) {
            match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
                Err(e) => {
                    log::warn!("Discarding stored settings: {}", e);
                    storage::remove_item(Self::STORAGE_KEY);
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to storage
    pub fn save(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            if storage::set_item(Self::STORAGE_KEY, &json) {
                log::info!("Settings saved");
            }
        }
    }
}
