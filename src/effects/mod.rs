//! Visual feedback layered over the simulation
//!
//! Nothing in here feeds back into gameplay. The simulation reports
//! [`GameEvent`](crate::sim::GameEvent)s and the orchestrator turns them into
//! effects.

pub mod easing;
pub mod pool;
pub mod screen;
pub mod timed;
pub mod vfx;

pub use easing::Easing;
pub use pool::{ObjectPool, PoolError, PoolGrowth, PoolHandle};
pub use screen::ScreenEffects;
pub use timed::{EffectKind, TimedEffect};
pub use vfx::{Flash, Shake, TrailParticle, VisualEffects};

use rand::Rng;

/// Step usable by effect timers. Negative or non-finite input counts as no
/// time passing.
#[inline]
pub(crate) fn frame_dt(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 { dt } else { 0.0 }
}

/// Uniform random value in `[-amount, amount]`
#[inline]
pub(crate) fn jitter<R: Rng + ?Sized>(rng: &mut R, amount: f32) -> f32 {
    (rng.random::<f32>() * 2.0 - 1.0) * amount
}
