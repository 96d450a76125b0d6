//! Game settings and preferences
//!
//! The simulation and effects layers only ever read these. Loading and saving
//! the settings file belongs to the host; this module just converts to and
//! from the JSON representation.

use serde::{Deserialize, Serialize};

/// Difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "med" | "medium" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// `(speed_mult, count_mult, score_mult)`
    pub fn multipliers(&self) -> (f32, f32, f32) {
        match self {
            Difficulty::Easy => (0.8, 0.75, 0.5),
            Difficulty::Normal => (1.0, 1.0, 1.0),
            Difficulty::Hard => (1.3, 1.5, 2.0),
        }
    }
}

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    /// Trail particle pool capacity for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 128,
            QualityPreset::Medium => 512,
            QualityPreset::High => 2048,
        }
    }

    /// Added to every asteroid's LOD level (higher = coarser)
    pub fn lod_bias(&self) -> u8 {
        match self {
            QualityPreset::Low => 1,
            QualityPreset::Medium | QualityPreset::High => 0,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Background grid
    pub grid_visible: bool,
    /// Trail and explosion particles
    pub particles_enabled: bool,
    /// Screen shake on explosions/impacts
    pub screen_shake: bool,
    /// Full-screen flashes and fades
    pub flashes: bool,

    // === Accessibility ===
    /// Reduced motion (suppresses shake and flashes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            quality: QualityPreset::Medium,
            grid_visible: true,
            particles_enabled: true,
            screen_shake: true,
            flashes: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings for a difficulty (everything else default)
    pub fn with_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    /// `(speed_mult, count_mult, score_mult)` for the current difficulty
    pub fn difficulty_multipliers(&self) -> (f32, f32, f32) {
        self.difficulty.multipliers()
    }

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective flashes (respects reduced_motion)
    pub fn effective_flashes(&self) -> bool {
        self.flashes && !self.reduced_motion
    }

    /// Effective particle cap
    pub fn max_particles(&self) -> usize {
        if !self.particles_enabled {
            0
        } else {
            self.quality.max_particles()
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Parse settings, falling back to defaults on malformed input
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("Invalid settings ({err}), using defaults");
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
