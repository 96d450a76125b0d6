//! Collectible power-ups dropped by destroyed enemies

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{Body, Entity, EntityId, WorldContext};
use crate::consts::*;
use crate::normalize_angle;
use crate::renderer::Renderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Temporary shield
    Shield,
    /// Shorter fire cooldown for a while
    RapidFire,
    ExtraLife,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [PowerUpKind::Shield, PowerUpKind::RapidFire, PowerUpKind::ExtraLife];

    /// Weighted pick: extra lives are rarer than the rest
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        match rng.random_range(0..10) {
            0..=4 => PowerUpKind::Shield,
            5..=8 => PowerUpKind::RapidFire,
            _ => PowerUpKind::ExtraLife,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub body: Body,
    pub kind: PowerUpKind,
    pub age: f32,
}

impl PowerUp {
    pub fn new(id: EntityId, pos: Vec2, kind: PowerUpKind) -> Self {
        Self {
            body: Body::new(id, pos, Vec2::ZERO),
            kind,
            age: 0.0,
        }
    }

    /// Render scale: `1 + 0.15 sin(4t)`
    pub fn pulse_scale(&self) -> f32 {
        1.0 + 0.15 * (self.age * 4.0).sin()
    }
}

impl Entity for PowerUp {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn radius(&self) -> f32 {
        POWERUP_RADIUS
    }

    fn update(&mut self, dt: f32, _ctx: &WorldContext) {
        if !self.body.active {
            return;
        }
        self.body.integrate(dt);
        self.body.wrap(POWERUP_RADIUS);
        self.body.rotation = normalize_angle(self.body.rotation + POWERUP_SPIN * dt);
        self.age += dt;
        if self.age >= POWERUP_LIFETIME {
            self.body.active = false;
        }
    }

    fn render(&self, renderer: &mut dyn Renderer) {
        if renderer.is_in_view_frustum(self.body.pos, POWERUP_RADIUS) {
            renderer.render_power_up(self.body.pos, self.kind, self.pulse_scale(), self.body.rotation);
        }
    }
}
