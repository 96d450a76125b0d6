//! Astro Blast - an Asteroids-style arcade game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, enemy AI, collisions, game state)
//! - `effects`: Time-driven visual feedback (screen effects, particle pool, VFX manager)
//! - `renderer`: Renderer contract consumed by the core, plus a headless recorder
//! - `settings`: Read-only difficulty multipliers and feature toggles
//! - `game`: Frame orchestrator (tick → effects → render)

pub mod color;
pub mod effects;
pub mod game;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use color::Color;
pub use game::Game;
pub use settings::{Difficulty, QualityPreset, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 5;

    /// Playfield dimensions
    pub const WORLD_WIDTH: f32 = 800.0;
    pub const WORLD_HEIGHT: f32 = 600.0;

    /// Player ship
    pub const PLAYER_RADIUS: f32 = 15.0;
    pub const PLAYER_ROTATION_SPEED: f32 = 4.5; // radians/sec
    pub const PLAYER_THRUST: f32 = 300.0; // px/s²
    /// Velocity retained per 60 Hz frame
    pub const PLAYER_FRICTION: f32 = 0.99;
    pub const PLAYER_MAX_SPEED: f32 = 350.0;
    pub const PLAYER_FIRE_COOLDOWN: f32 = 0.25;
    pub const PLAYER_RAPID_FIRE_COOLDOWN: f32 = 0.1;
    pub const PLAYER_SHIELD_DURATION: f32 = 3.0;
    pub const PLAYER_RESPAWN_INVULNERABLE: f32 = 2.0;
    pub const PLAYER_RAPID_FIRE_DURATION: f32 = 8.0;
    pub const STARTING_LIVES: u8 = 3;
    pub const EXTRA_LIFE_SCORE_STEP: u64 = 10_000;

    /// Bullets
    pub const BULLET_RADIUS: f32 = 2.0;
    pub const BULLET_SPEED: f32 = 500.0;
    pub const ENEMY_BULLET_SPEED: f32 = 300.0;
    pub const BULLET_LIFETIME: f32 = 1.2;
    pub const BULLET_DAMAGE: f32 = 20.0;

    /// Asteroids
    pub const ASTEROID_RADIUS_LARGE: f32 = 40.0;
    pub const ASTEROID_RADIUS_MEDIUM: f32 = 22.0;
    pub const ASTEROID_RADIUS_SMALL: f32 = 12.0;
    pub const SCORE_LARGE_ASTEROID: u64 = 20;
    pub const SCORE_MEDIUM_ASTEROID: u64 = 50;
    pub const SCORE_SMALL_ASTEROID: u64 = 100;
    pub const INITIAL_WAVE_ASTEROID_COUNT: u32 = 4;
    /// Asteroids never spawn closer than this to the player
    pub const SPAWN_SAFE_DISTANCE: f32 = 150.0;

    /// Enemies
    pub const ENEMY_FIRST_WAVE: u32 = 2;
    /// Seconds the damage flash stays lit after a hit
    pub const DAMAGE_FLASH_DURATION: f32 = 0.2;

    /// Power-ups
    pub const POWERUP_RADIUS: f32 = 12.0;
    pub const POWERUP_LIFETIME: f32 = 10.0;
    pub const POWERUP_SPIN: f32 = 1.5;
    /// Chance a destroyed enemy drops a power-up
    pub const POWERUP_DROP_CHANCE: f64 = 0.35;

    /// Time-scale clamp for the VFX manager
    pub const MIN_TIME_SCALE: f32 = 0.1;
    pub const MAX_TIME_SCALE: f32 = 2.0;

    /// Default broad-phase cell size
    pub const COLLISION_CELL_SIZE: f32 = 64.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Unit vector a ship with the given rotation points along
#[inline]
pub fn heading(rotation: f32) -> Vec2 {
    polar_to_cartesian(1.0, rotation)
}

/// Wrap a position around the playfield edges.
///
/// An entity leaves one edge only once it is fully off-screen (`margin` past the
/// edge) and re-enters `margin` beyond the opposite edge, so large asteroids
/// don't pop in and out.
pub fn wrap_position(pos: Vec2, margin: f32) -> Vec2 {
    let mut wrapped = pos;
    if wrapped.x < -margin {
        wrapped.x = consts::WORLD_WIDTH + margin;
    } else if wrapped.x > consts::WORLD_WIDTH + margin {
        wrapped.x = -margin;
    }
    if wrapped.y < -margin {
        wrapped.y = consts::WORLD_HEIGHT + margin;
    } else if wrapped.y > consts::WORLD_HEIGHT + margin {
        wrapped.y = -margin;
    }
    wrapped
}

/// Center of the playfield
#[inline]
pub fn screen_center() -> Vec2 {
    Vec2::new(consts::WORLD_WIDTH / 2.0, consts::WORLD_HEIGHT / 2.0)
}
