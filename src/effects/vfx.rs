//! Visual effects manager
//!
//! Game-feel feedback layered on top of the simulation: camera shakes,
//! flashes (full-screen or anchored at a point), pooled trail particles and a
//! global time-scale. Each collection decays on its own every frame.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::{frame_dt, jitter};
use super::pool::{ObjectPool, PoolError, PoolGrowth, PoolHandle};
use crate::color::Color;
use crate::consts::{MAX_TIME_SCALE, MIN_TIME_SCALE};
use crate::renderer::Renderer;
use crate::settings::Settings;
use crate::{heading, polar_to_cartesian};

/// Velocity retained by a trail particle each frame
pub const TRAIL_FRICTION: f32 = 0.98;
/// Camera offset retained each frame
pub const CAMERA_DAMPING: f32 = 0.9;
/// Fraction of thrust frames that emit nothing
pub const THRUST_SKIP_CHANCE: f32 = 0.7;

/// A pooled particle. Velocity is in pixels per frame, life in frames.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailParticle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub max_life: f32,
    pub color: Color,
    pub size: f32,
    pub active: bool,
}

impl Default for TrailParticle {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            life: 0.0,
            max_life: 1.0,
            color: Color::WHITE,
            size: 2.0,
            active: false,
        }
    }
}

impl TrailParticle {
    pub fn init(&mut self, pos: Vec2, vel: Vec2, life: f32, color: Color, size: f32) {
        self.pos = pos;
        self.vel = vel;
        self.life = life;
        self.max_life = life.max(f32::EPSILON);
        self.color = color;
        self.size = size;
        self.active = life > 0.0;
    }

    /// Advance one frame. Returns false once the particle has burned out.
    pub fn update(&mut self, time_scale: f32) -> bool {
        if !self.active {
            return false;
        }
        self.pos += self.vel * time_scale;
        self.vel *= TRAIL_FRICTION;
        self.life -= time_scale;
        if self.life <= 0.0 {
            self.active = false;
        }
        self.active
    }

    /// Remaining life as 0-1 (used for fade-out)
    pub fn life_fraction(&self) -> f32 {
        (self.life / self.max_life).clamp(0.0, 1.0)
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A camera shake; strength fades linearly over its duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shake {
    pub intensity: f32,
    pub duration: f32,
    pub remaining: f32,
}

impl Shake {
    fn strength(&self) -> f32 {
        if self.duration <= 0.0 {
            0.0
        } else {
            self.intensity * (self.remaining / self.duration)
        }
    }
}

/// A flash. `pos: None` covers the whole screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flash {
    pub color: Color,
    pub intensity: f32,
    pub duration: f32,
    pub remaining: f32,
    pub pos: Option<Vec2>,
}

impl Flash {
    pub fn current_intensity(&self) -> f32 {
        if self.duration <= 0.0 {
            0.0
        } else {
            self.intensity * (self.remaining / self.duration).clamp(0.0, 1.0)
        }
    }
}

pub struct VisualEffects<R: Rng = Pcg32> {
    shakes: Vec<Shake>,
    flashes: Vec<Flash>,
    trails: ObjectPool<TrailParticle>,
    /// Handles of live particles; a handle leaves this list before it is released
    active_trails: Vec<PoolHandle>,
    time_scale: f32,
    /// Real seconds left before `time_scale` returns to 1.0
    slow_motion_timer: Option<f32>,
    camera_offset: Vec2,
    rng: R,
    allow_shake: bool,
    allow_flashes: bool,
    particles_enabled: bool,
    dropped_particles: u64,
    warned_exhausted: bool,
}

impl VisualEffects<Pcg32> {
    pub fn with_seed(seed: u64, settings: &Settings) -> Self {
        Self::with_rng(Pcg32::seed_from_u64(seed), settings)
    }
}

impl<R: Rng> VisualEffects<R> {
    /// The particle pool is sized from the quality preset and never grows
    pub fn with_rng(rng: R, settings: &Settings) -> Self {
        let trails = ObjectPool::new(
            settings.max_particles(),
            PoolGrowth::Fixed,
            TrailParticle::default,
            TrailParticle::reset,
        );
        Self {
            shakes: Vec::new(),
            flashes: Vec::new(),
            trails,
            active_trails: Vec::new(),
            time_scale: 1.0,
            slow_motion_timer: None,
            camera_offset: Vec2::ZERO,
            rng,
            allow_shake: settings.effective_screen_shake(),
            allow_flashes: settings.effective_flashes(),
            particles_enabled: settings.particles_enabled,
            dropped_particles: 0,
            warned_exhausted: false,
        }
    }

    /// Re-read the effect toggles (pool capacity is fixed at construction)
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.allow_shake = settings.effective_screen_shake();
        self.allow_flashes = settings.effective_flashes();
        self.particles_enabled = settings.particles_enabled;
    }

    // === Time scale ===

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Set the time scale, clamped to `[0.1, 2.0]`; cancels any slow-motion timer
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = clamp_time_scale(scale);
        self.slow_motion_timer = None;
    }

    /// Run at `scale` for `duration` real seconds, then return to 1.0
    pub fn slow_motion(&mut self, scale: f32, duration: f32) {
        self.time_scale = clamp_time_scale(scale);
        self.slow_motion_timer = Some(duration.max(0.0));
    }

    // === Primitives ===

    pub fn add_shake(&mut self, intensity: f32, duration: f32) {
        if !self.allow_shake || duration <= 0.0 {
            return;
        }
        self.shakes.push(Shake {
            intensity,
            duration,
            remaining: duration,
        });
    }

    fn add_flash(&mut self, color: Color, intensity: f32, duration: f32, pos: Option<Vec2>) {
        if duration <= 0.0 {
            return;
        }
        if !self.allow_flashes {
            return;
        }
        self.flashes.push(Flash {
            color,
            intensity,
            duration,
            remaining: duration,
            pos,
        });
    }

    /// Full-screen flash
    pub fn screen_flash(&mut self, color: Color, intensity: f32, duration: f32) {
        self.add_flash(color, intensity, duration, None);
    }

    /// Flash anchored at a world position
    pub fn point_flash(&mut self, pos: Vec2, color: Color, intensity: f32, duration: f32) {
        self.add_flash(color, intensity, duration, Some(pos));
    }

    /// Emit one particle. Returns false if it was dropped (particles off or pool full).
    pub fn emit_particle(&mut self, pos: Vec2, vel: Vec2, life: f32, color: Color, size: f32) -> bool {
        if !self.particles_enabled {
            return false;
        }
        match self.trails.acquire() {
            Ok(handle) => {
                if let Some(particle) = self.trails.get_mut(handle) {
                    particle.init(pos, vel, life, color, size);
                }
                self.active_trails.push(handle);
                true
            }
            Err(PoolError::Exhausted { capacity }) => {
                self.dropped_particles += 1;
                if !self.warned_exhausted {
                    log::warn!("Trail pool exhausted ({capacity} live), dropping particles");
                    self.warned_exhausted = true;
                }
                false
            }
            Err(err) => {
                log::error!("Trail pool acquire failed: {err}");
                false
            }
        }
    }

    // === Recipes ===

    /// Shake, anchored flash and a burst of debris
    pub fn explosion(&mut self, pos: Vec2, color: Color, scale: f32) {
        self.add_shake(4.0 * scale, 0.3);
        self.point_flash(pos, color, 1.0, 0.35);

        let count = (12.0 * scale).round().max(1.0) as usize;
        for _ in 0..count {
            let angle = self.rng.random_range(0.0..TAU);
            let speed = self.rng.random_range(1.0..4.0);
            let life = self.rng.random_range(20.0..40.0);
            let size = self.rng.random_range(2.0..4.0);
            let tint = color.lerp(Color::YELLOW, self.rng.random::<f32>() * 0.5);
            self.emit_particle(pos, polar_to_cartesian(speed, angle), life, tint, size);
        }
    }

    pub fn bullet_impact(&mut self, pos: Vec2, color: Color) {
        self.point_flash(pos, color, 0.6, 0.1);
        for _ in 0..4 {
            let angle = self.rng.random_range(0.0..TAU);
            let speed = self.rng.random_range(1.0..3.0);
            let life = self.rng.random_range(8.0..15.0);
            self.emit_particle(pos, polar_to_cartesian(speed, angle), life, color, 1.5);
        }
    }

    /// Exhaust particle behind a thrusting ship. Most frames emit nothing.
    pub fn thrust_trail(&mut self, pos: Vec2, rotation: f32) {
        if self.rng.random::<f32>() < THRUST_SKIP_CHANCE {
            return;
        }
        let angle = rotation + PI + jitter(&mut self.rng, 0.3);
        let speed = self.rng.random_range(1.5..2.5);
        let life = self.rng.random_range(15.0..25.0);
        let color = Color::ORANGE.lerp(Color::YELLOW, self.rng.random::<f32>());
        // Spawn at the ship's tail
        let tail = pos - heading(rotation) * 10.0;
        self.emit_particle(tail, polar_to_cartesian(speed, angle), life, color, 2.0);
    }

    // === Frame ===

    /// Order: shakes → flashes → trails → camera damping
    pub fn update(&mut self, dt: f32) {
        let dt = frame_dt(dt);
        self.warned_exhausted = false;

        if let Some(timer) = self.slow_motion_timer.as_mut() {
            *timer -= dt;
            if *timer <= 0.0 {
                self.slow_motion_timer = None;
                self.time_scale = 1.0;
            }
        }

        let scaled_dt = dt * self.time_scale;
        let time_scale = self.time_scale;

        let Self {
            shakes,
            flashes,
            trails,
            active_trails,
            camera_offset,
            rng,
            ..
        } = self;

        shakes.retain_mut(|shake| {
            shake.remaining -= scaled_dt;
            if shake.remaining <= 0.0 {
                return false;
            }
            let strength = shake.strength();
            *camera_offset += Vec2::new(jitter(rng, strength), jitter(rng, strength));
            true
        });

        flashes.retain_mut(|flash| {
            flash.remaining -= scaled_dt;
            flash.remaining > 0.0
        });

        let mut expired = Vec::new();
        active_trails.retain(|&handle| {
            let alive = trails
                .get_mut(handle)
                .map(|particle| particle.update(time_scale))
                .unwrap_or(false);
            if !alive {
                expired.push(handle);
            }
            alive
        });
        for handle in expired {
            let released = trails.release(handle);
            debug_assert!(released.is_ok(), "trail particle release failed: {released:?}");
            if let Err(err) = released {
                log::error!("{err}");
            }
        }

        *camera_offset *= CAMERA_DAMPING;
    }

    pub fn render(&self, renderer: &mut dyn Renderer) {
        for &handle in &self.active_trails {
            if let Some(p) = self.trails.get(handle) {
                renderer.render_particle(p.pos, p.color.with_intensity(p.life_fraction()), p.size);
            }
        }
        for flash in &self.flashes {
            let intensity = flash.current_intensity();
            match flash.pos {
                Some(pos) => renderer.render_explosion(pos, intensity, flash.color),
                None => renderer.render_overlay(flash.color.with_intensity(intensity)),
            }
        }
    }

    pub fn clear(&mut self) {
        self.shakes.clear();
        self.flashes.clear();
        for handle in self.active_trails.drain(..) {
            if let Err(err) = self.trails.release(handle) {
                log::error!("{err}");
            }
        }
        self.camera_offset = Vec2::ZERO;
        self.set_time_scale(1.0);
    }

    // === Queries ===

    pub fn camera_offset(&self) -> Vec2 {
        self.camera_offset
    }

    pub fn shake_count(&self) -> usize {
        self.shakes.len()
    }

    pub fn flashes(&self) -> &[Flash] {
        &self.flashes
    }

    pub fn active_particles(&self) -> usize {
        self.active_trails.len()
    }

    pub fn particles(&self) -> impl Iterator<Item = &TrailParticle> {
        self.active_trails.iter().filter_map(|&h| self.trails.get(h))
    }

    /// Particles dropped because the pool was full
    pub fn dropped_particles(&self) -> u64 {
        self.dropped_particles
    }

    pub fn pool(&self) -> &ObjectPool<TrailParticle> {
        &self.trails
    }
}

fn clamp_time_scale(scale: f32) -> f32 {
    if scale.is_nan() {
        1.0
    } else {
        scale.clamp(MIN_TIME_SCALE, MAX_TIME_SCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{DrawCall, RecordingRenderer};

    fn vfx() -> VisualEffects {
        VisualEffects::with_seed(42, &Settings::default())
    }

    #[test]
    fn test_trail_particle_physics() {
        let mut p = TrailParticle::default();
        p.init(Vec2::new(100.0, 50.0), Vec2::new(10.0, 0.0), 20.0, Color::WHITE, 2.0);

        assert!(p.update(1.0));
        assert!((p.pos.x - 110.0).abs() < 1e-5);
        assert!((p.vel.x - 9.8).abs() < 1e-5);
        assert!((p.life - 19.0).abs() < 1e-6);

        for _ in 0..18 {
            assert!(p.update(1.0));
        }
        assert!(!p.update(1.0));
        assert!(!p.active);
    }

    #[test]
    fn test_particles_return_to_pool() {
        let mut fx = vfx();
        let capacity = fx.pool().capacity();
        assert!(fx.emit_particle(Vec2::ZERO, Vec2::new(10.0, 0.0), 20.0, Color::WHITE, 2.0));
        assert_eq!(fx.active_particles(), 1);
        assert_eq!(fx.pool().checked_out(), 1);

        fx.update(1.0 / 60.0);
        let p = fx.particles().next().unwrap();
        assert!((p.pos.x - 10.0).abs() < 1e-5);

        for _ in 0..19 {
            fx.update(1.0 / 60.0);
        }
        assert_eq!(fx.active_particles(), 0);
        assert_eq!(fx.pool().checked_out(), 0);
        assert_eq!(fx.pool().available(), capacity);
    }

    #[test]
    fn test_time_scale_slows_particles() {
        let mut fx = vfx();
        fx.set_time_scale(0.5);
        fx.emit_particle(Vec2::ZERO, Vec2::new(10.0, 0.0), 20.0, Color::WHITE, 2.0);
        fx.update(1.0 / 60.0);
        let p = fx.particles().next().unwrap();
        assert!((p.pos.x - 5.0).abs() < 1e-5);
        assert!((p.life - 19.5).abs() < 1e-5);
    }

    #[test]
    fn test_time_scale_clamped() {
        let mut fx = vfx();
        fx.set_time_scale(10.0);
        assert_eq!(fx.time_scale(), 2.0);
        fx.set_time_scale(0.0);
        assert_eq!(fx.time_scale(), 0.1);
        fx.set_time_scale(f32::NAN);
        assert_eq!(fx.time_scale(), 1.0);
    }

    #[test]
    fn test_slow_motion_expires() {
        let mut fx = vfx();
        fx.slow_motion(0.3, 0.5);
        assert!((fx.time_scale() - 0.3).abs() < 1e-6);
        for _ in 0..20 {
            fx.update(1.0 / 60.0);
        }
        assert!((fx.time_scale() - 0.3).abs() < 1e-6);
        for _ in 0..20 {
            fx.update(1.0 / 60.0);
        }
        assert_eq!(fx.time_scale(), 1.0);
    }

    #[test]
    fn test_camera_offset_decays_to_zero() {
        let mut fx = vfx();
        fx.add_shake(20.0, 0.3);
        for _ in 0..10 {
            fx.update(1.0 / 60.0);
        }
        assert!(fx.camera_offset().length() > 0.0);

        while fx.shake_count() > 0 {
            fx.update(1.0 / 60.0);
        }
        for _ in 0..400 {
            fx.update(1.0 / 60.0);
        }
        assert!(fx.camera_offset().length() < 1e-6);
    }

    #[test]
    fn test_bad_step_keeps_state_finite() {
        let mut fx = vfx();
        fx.add_shake(10.0, 0.2);
        fx.screen_flash(Color::WHITE, 0.5, 0.2);
        fx.update(f32::NAN);
        fx.update(-0.5);
        assert!(fx.camera_offset().is_finite());
        for _ in 0..30 {
            fx.update(1.0 / 60.0);
        }
        assert_eq!(fx.shake_count(), 0);
        assert!(fx.flashes().is_empty());
        assert!(fx.camera_offset().is_finite());
    }

    #[test]
    fn test_flashes_expire() {
        let mut fx = vfx();
        fx.screen_flash(Color::WHITE, 0.8, 0.1);
        fx.point_flash(Vec2::new(10.0, 10.0), Color::ORANGE, 1.0, 0.2);
        assert_eq!(fx.flashes().len(), 2);
        for _ in 0..7 {
            fx.update(1.0 / 60.0);
        }
        assert_eq!(fx.flashes().len(), 1);
        for _ in 0..7 {
            fx.update(1.0 / 60.0);
        }
        assert!(fx.flashes().is_empty());
    }

    #[test]
    fn test_fixed_pool_drops_when_full() {
        let settings = Settings {
            quality: crate::settings::QualityPreset::Low,
            ..Settings::default()
        };
        let mut fx = VisualEffects::with_seed(1, &settings);
        let capacity = settings.max_particles();
        for _ in 0..capacity {
            assert!(fx.emit_particle(Vec2::ZERO, Vec2::ZERO, 30.0, Color::WHITE, 1.0));
        }
        assert!(!fx.emit_particle(Vec2::ZERO, Vec2::ZERO, 30.0, Color::WHITE, 1.0));
        assert_eq!(fx.dropped_particles(), 1);
        assert_eq!(fx.active_particles(), capacity);
    }

    #[test]
    fn test_disabled_particles_and_shake() {
        let settings = Settings {
            particles_enabled: false,
            screen_shake: false,
            ..Settings::default()
        };
        let mut fx = VisualEffects::with_seed(3, &settings);
        fx.explosion(Vec2::new(100.0, 100.0), Color::ORANGE, 1.0);
        assert_eq!(fx.active_particles(), 0);
        assert_eq!(fx.shake_count(), 0);
        // The anchored flash still shows
        assert_eq!(fx.flashes().len(), 1);
    }

    #[test]
    fn test_reduced_motion_drops_every_flash() {
        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        let mut fx = VisualEffects::with_seed(3, &settings);
        fx.explosion(Vec2::new(100.0, 100.0), Color::ORANGE, 1.0);
        fx.bullet_impact(Vec2::new(50.0, 50.0), Color::YELLOW);
        fx.screen_flash(Color::WHITE, 0.5, 0.3);
        assert!(fx.flashes().is_empty());
        assert_eq!(fx.shake_count(), 0);
        assert!(fx.active_particles() > 0);
    }

    #[test]
    fn test_explosion_recipe() {
        let mut fx = vfx();
        fx.explosion(Vec2::new(200.0, 200.0), Color::ORANGE, 1.0);
        assert_eq!(fx.shake_count(), 1);
        assert_eq!(fx.flashes().len(), 1);
        assert_eq!(fx.active_particles(), 12);
        for p in fx.particles() {
            assert!(p.life >= 20.0 && p.life < 40.0);
            let speed = p.vel.length();
            assert!(speed > 1.0 - 1e-4 && speed < 4.0 + 1e-4);
        }
    }

    #[test]
    fn test_thrust_trail_skip_rate() {
        let mut fx = vfx();
        let frames = 1000;
        for _ in 0..frames {
            fx.thrust_trail(Vec2::new(400.0, 300.0), 0.0);
        }
        let emitted = fx.active_particles() as f32 / frames as f32;
        // ~30% of frames emit
        assert!((0.25..0.35).contains(&emitted), "emit rate {emitted}");
        // Exhaust goes backwards
        assert!(fx.particles().all(|p| p.vel.x < 0.0));
    }

    #[test]
    fn test_render_draws_particles_and_flashes() {
        let mut fx = vfx();
        let mut renderer = RecordingRenderer::new();
        fx.bullet_impact(Vec2::new(50.0, 50.0), Color::WHITE);
        fx.screen_flash(Color::RED, 0.5, 1.0);
        renderer.begin_frame();
        fx.render(&mut renderer);
        assert_eq!(renderer.count(|c| matches!(c, DrawCall::Particle { .. })), 4);
        assert_eq!(renderer.count(|c| matches!(c, DrawCall::Explosion { .. })), 1);
        assert_eq!(renderer.count(|c| matches!(c, DrawCall::Overlay { .. })), 1);
    }

    #[test]
    fn test_clear_returns_everything() {
        let mut fx = vfx();
        fx.explosion(Vec2::new(1.0, 1.0), Color::ORANGE, 2.0);
        fx.slow_motion(0.2, 5.0);
        fx.clear();
        assert_eq!(fx.active_particles(), 0);
        assert_eq!(fx.pool().checked_out(), 0);
        assert_eq!(fx.time_scale(), 1.0);
        assert_eq!(fx.camera_offset(), Vec2::ZERO);
    }
}
