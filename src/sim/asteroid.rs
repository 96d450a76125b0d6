//! Asteroids: drift, spin, split into smaller rocks when shot

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{Body, Entity, EntityId, WorldContext};
use crate::color::Color;
use crate::consts::*;
use crate::renderer::Renderer;
use crate::{heading, normalize_angle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AsteroidSize {
    Large,
    Medium,
    Small,
}

impl AsteroidSize {
    pub fn radius(&self) -> f32 {
        match self {
            AsteroidSize::Large => ASTEROID_RADIUS_LARGE,
            AsteroidSize::Medium => ASTEROID_RADIUS_MEDIUM,
            AsteroidSize::Small => ASTEROID_RADIUS_SMALL,
        }
    }

    /// Base score for destroying an asteroid of this size
    pub fn score(&self) -> u64 {
        match self {
            AsteroidSize::Large => SCORE_LARGE_ASTEROID,
            AsteroidSize::Medium => SCORE_MEDIUM_ASTEROID,
            AsteroidSize::Small => SCORE_SMALL_ASTEROID,
        }
    }

    /// Speed range (px/s) before difficulty scaling
    pub fn speed_range(&self) -> (f32, f32) {
        match self {
            AsteroidSize::Large => (40.0, 80.0),
            AsteroidSize::Medium => (60.0, 110.0),
            AsteroidSize::Small => (90.0, 150.0),
        }
    }

    /// Size of the fragments, or `None` if this size is destroyed outright
    pub fn smaller(&self) -> Option<AsteroidSize> {
        match self {
            AsteroidSize::Large => Some(AsteroidSize::Medium),
            AsteroidSize::Medium => Some(AsteroidSize::Small),
            AsteroidSize::Small => None,
        }
    }

    /// Base level of detail (0 = finest)
    pub fn lod_level(&self) -> u8 {
        match self {
            AsteroidSize::Large => 0,
            AsteroidSize::Medium => 1,
            AsteroidSize::Small => 2,
        }
    }

    /// Effect scale for explosions
    pub fn explosion_scale(&self) -> f32 {
        match self {
            AsteroidSize::Large => 1.5,
            AsteroidSize::Medium => 1.0,
            AsteroidSize::Small => 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asteroid {
    pub body: Body,
    pub size: AsteroidSize,
    /// Shape seed handed to the renderer
    pub seed: u32,
    /// Angular velocity (rad/s)
    pub spin: f32,
    lod_bias: u8,
}

impl Asteroid {
    pub fn new(id: EntityId, pos: Vec2, vel: Vec2, size: AsteroidSize, seed: u32, spin: f32) -> Self {
        Self {
            body: Body::new(id, pos, vel),
            size,
            seed,
            spin,
            lod_bias: 0,
        }
    }

    pub fn with_lod_bias(mut self, bias: u8) -> Self {
        self.lod_bias = bias;
        self
    }

    pub fn lod_level(&self) -> u8 {
        self.size.lod_level().saturating_add(self.lod_bias).min(3)
    }

    /// Random velocity for a new asteroid of `size`
    pub fn random_velocity<R: Rng + ?Sized>(rng: &mut R, size: AsteroidSize, speed_mult: f32) -> Vec2 {
        let (min, max) = size.speed_range();
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        heading(angle) * rng.random_range(min..max) * speed_mult
    }

    /// Velocities for the two fragments of this asteroid, or an empty list
    /// if it is already the smallest size. Fragments fly off on either side
    /// of the parent's heading.
    pub fn split_velocities<R: Rng + ?Sized>(&self, rng: &mut R, speed_mult: f32) -> Vec<(AsteroidSize, Vec2)> {
        let Some(child) = self.size.smaller() else {
            return Vec::new();
        };
        let (min, max) = child.speed_range();
        let base = if self.body.vel.length_squared() > 1e-6 {
            self.body.vel.y.atan2(self.body.vel.x)
        } else {
            rng.random_range(0.0..std::f32::consts::TAU)
        };

        [-1.0f32, 1.0]
            .into_iter()
            .map(|side| {
                let spread = rng.random_range(0.5..1.0) * side;
                let speed = rng.random_range(min..max) * speed_mult;
                (child, heading(normalize_angle(base + spread)) * speed)
            })
            .collect()
    }
}

impl Entity for Asteroid {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn radius(&self) -> f32 {
        self.size.radius()
    }

    fn update(&mut self, dt: f32, _ctx: &WorldContext) {
        if !self.body.active {
            return;
        }
        self.body.integrate(dt);
        self.body.rotation = normalize_angle(self.body.rotation + self.spin * dt);
        self.body.wrap(self.size.radius());
    }

    fn render(&self, renderer: &mut dyn Renderer) {
        let radius = self.size.radius();
        if !renderer.is_in_view_frustum(self.body.pos, radius) {
            return;
        }
        renderer.render_asteroid(self.body.pos, radius, Color::ROCK, self.seed, self.lod_level());
    }
}
