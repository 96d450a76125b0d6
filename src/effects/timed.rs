//! A single decaying screen effect

use serde::{Deserialize, Serialize};

use super::easing::Easing;
use crate::color::Color;

/// What a timed effect does to the frame accumulators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Random camera offset
    Shake,
    /// Overlay color, strongest wins
    Flash,
    /// Overlay color, strongest wins (slow flash)
    Fade,
    /// Oscillating zoom
    Pulse,
    /// Zoom in
    Zoom,
    /// Horizontal wave offset
    Distortion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedEffect {
    pub kind: EffectKind,
    /// Peak intensity
    pub intensity: f32,
    /// Seconds left (never above `total`)
    remaining: f32,
    total: f32,
    pub color: Color,
    pub easing: Easing,
    active: bool,
}

impl TimedEffect {
    /// Create an effect. A zero, negative or non-finite duration yields an
    /// effect that is already expired.
    pub fn new(kind: EffectKind, intensity: f32, duration: f32, color: Color, easing: Easing) -> Self {
        let valid = duration.is_finite() && duration > 0.0;
        let total = if valid { duration } else { 0.0 };
        Self {
            kind,
            intensity,
            remaining: total,
            total,
            color,
            easing,
            active: valid,
        }
    }

    pub fn shake(intensity: f32, duration: f32, easing: Easing) -> Self {
        Self::new(EffectKind::Shake, intensity, duration, Color::TRANSPARENT, easing)
    }

    pub fn flash(color: Color, intensity: f32, duration: f32, easing: Easing) -> Self {
        Self::new(EffectKind::Flash, intensity, duration, color, easing)
    }

    pub fn fade(color: Color, intensity: f32, duration: f32, easing: Easing) -> Self {
        Self::new(EffectKind::Fade, intensity, duration, color, easing)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn total(&self) -> f32 {
        self.total
    }

    /// Lifetime progress in `[0, 1]`
    pub fn progress(&self) -> f32 {
        if self.total <= 0.0 {
            1.0
        } else {
            1.0 - self.remaining / self.total
        }
    }

    /// Count down by `dt`. Returns false once the effect has expired.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.active {
            return false;
        }
        self.remaining -= super::frame_dt(dt);
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            self.active = false;
        }
        self.active
    }

    /// `intensity * easing(progress)`; exactly 0 once inactive
    pub fn current_intensity(&self) -> f32 {
        if !self.active {
            return 0.0;
        }
        self.intensity * self.easing.apply(self.progress())
    }
}
