//! Projectiles fired by the player and by enemies

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{Body, Entity, EntityId, WorldContext};
use crate::color::Color;
use crate::consts::*;
use crate::renderer::Renderer;

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletOwner {
    Player,
    Enemy(EntityId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub body: Body,
    pub owner: BulletOwner,
    /// Seconds since fired
    pub age: f32,
    pub lifetime: f32,
}

impl Bullet {
    pub fn new(id: EntityId, pos: Vec2, vel: Vec2, owner: BulletOwner) -> Self {
        Self {
            body: Body::new(id, pos, vel),
            owner,
            age: 0.0,
            lifetime: BULLET_LIFETIME,
        }
    }

    pub fn is_player_owned(&self) -> bool {
        self.owner == BulletOwner::Player
    }

    pub fn color(&self) -> Color {
        match self.owner {
            BulletOwner::Player => Color::YELLOW,
            BulletOwner::Enemy(_) => Color::RED,
        }
    }
}

impl Entity for Bullet {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn radius(&self) -> f32 {
        BULLET_RADIUS
    }

    fn update(&mut self, dt: f32, _ctx: &WorldContext) {
        if !self.body.active {
            return;
        }
        self.body.integrate(dt);
        self.body.wrap(BULLET_RADIUS);
        self.age += dt;
        if self.age >= self.lifetime {
            self.body.active = false;
        }
    }

    fn render(&self, renderer: &mut dyn Renderer) {
        if renderer.is_in_view_frustum(self.body.pos, BULLET_RADIUS) {
            renderer.render_bullet(self.body.pos, self.color());
        }
    }
}
