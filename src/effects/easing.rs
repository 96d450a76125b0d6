//! Decay curves for timed effects
//!
//! Every curve maps lifetime progress `t` (0 = just started, 1 = expired) to
//! a weight in `[0, 1]`, starting at 1 and never increasing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    /// `1 - t`
    #[default]
    Linear,
    /// `(1 - t)²`: drops off fast, long tail
    QuadOut,
    /// `(1 - t)³`
    CubicOut,
    /// `1 - t²`: holds near full strength, then falls away
    QuadIn,
    /// `1 - smoothstep(t)`
    SmoothStep,
    /// Full strength until expiry
    Constant,
}

impl Easing {
    /// Weight at progress `t` (clamped to `[0, 1]`)
    pub fn apply(&self, t: f32) -> f32 {
        let t = if t.is_nan() { 1.0 } else { t.clamp(0.0, 1.0) };
        let u = 1.0 - t;
        match self {
            Easing::Linear => u,
            Easing::QuadOut => u * u,
            Easing::CubicOut => u * u * u,
            Easing::QuadIn => 1.0 - t * t,
            Easing::SmoothStep => 1.0 - t * t * (3.0 - 2.0 * t),
            Easing::Constant => {
                if t < 1.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub const ALL: [Easing; 6] = [
        Easing::Linear,
        Easing::QuadOut,
        Easing::CubicOut,
        Easing::QuadIn,
        Easing::SmoothStep,
        Easing::Constant,
    ];
}
