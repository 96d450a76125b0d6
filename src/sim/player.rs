//! The player's ship

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bullet::{Bullet, BulletOwner};
use super::state::{Body, Entity, EntityId, IdAllocator, WorldContext};
use crate::color::Color;
use crate::consts::*;
use crate::renderer::Renderer;
use crate::{heading, normalize_angle, screen_center};

/// Ship rotation when spawned (nose pointing up the screen)
const SPAWN_ROTATION: f32 = -std::f32::consts::FRAC_PI_2;

/// Shield fades out over its last half second
const SHIELD_FADE_TIME: f32 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: Body,
    /// Thrust was applied this tick
    pub thrusting: bool,
    pub shield_timer: f32,
    pub invulnerable_timer: f32,
    pub rapid_fire_timer: f32,
    /// Seconds of red tint left after a hit
    pub damage_flash: f32,
    /// Sim time of the last shot
    last_shot: Option<f32>,
    /// Seconds the ship has existed (drives the shield shimmer)
    age: f32,
}

impl Player {
    pub fn new(id: EntityId, pos: Vec2) -> Self {
        let mut body = Body::new(id, pos, Vec2::ZERO);
        body.rotation = SPAWN_ROTATION;
        Self {
            body,
            thrusting: false,
            shield_timer: 0.0,
            invulnerable_timer: 0.0,
            rapid_fire_timer: 0.0,
            damage_flash: 0.0,
            last_shot: None,
            age: 0.0,
        }
    }

    /// Apply steering for one tick. `turn` is -1 (left) .. 1 (right).
    pub fn apply_controls(&mut self, turn: f32, thrust: bool, dt: f32) {
        if !self.body.active {
            self.thrusting = false;
            return;
        }
        let turn = turn.clamp(-1.0, 1.0);
        self.body.rotation = normalize_angle(self.body.rotation + turn * PLAYER_ROTATION_SPEED * dt);

        self.thrusting = thrust;
        if thrust {
            self.body.vel += heading(self.body.rotation) * PLAYER_THRUST * dt;
        }
        // Friction is specified per 60 Hz frame
        self.body.vel *= PLAYER_FRICTION.powf(dt * 60.0);
        self.body.vel = self.body.vel.clamp_length_max(PLAYER_MAX_SPEED);
    }

    pub fn fire_cooldown(&self) -> f32 {
        if self.rapid_fire_timer > 0.0 {
            PLAYER_RAPID_FIRE_COOLDOWN
        } else {
            PLAYER_FIRE_COOLDOWN
        }
    }

    pub fn can_shoot(&self, now: f32) -> bool {
        self.body.active && self.last_shot.is_none_or(|t| now - t >= self.fire_cooldown())
    }

    /// Fire from the nose if the cooldown allows
    pub fn fire(&mut self, now: f32, ids: &mut IdAllocator) -> Option<Bullet> {
        if !self.can_shoot(now) {
            return None;
        }
        self.last_shot = Some(now);
        let dir = heading(self.body.rotation);
        Some(Bullet::new(
            ids.allocate(),
            self.body.pos + dir * PLAYER_RADIUS,
            dir * BULLET_SPEED + self.body.vel,
            BulletOwner::Player,
        ))
    }

    pub fn activate_shield(&mut self) {
        self.shield_timer = PLAYER_SHIELD_DURATION;
    }

    pub fn grant_rapid_fire(&mut self) {
        self.rapid_fire_timer = PLAYER_RAPID_FIRE_DURATION;
    }

    pub fn shield_active(&self) -> bool {
        self.shield_timer > 0.0
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_timer > 0.0
    }

    /// Can a hit cost a life right now
    pub fn is_vulnerable(&self) -> bool {
        self.body.active && !self.shield_active() && !self.is_invulnerable()
    }

    /// Shield bubble opacity: shimmers, then fades out at the end
    pub fn shield_alpha(&self) -> f32 {
        if !self.shield_active() {
            return 0.0;
        }
        let shimmer = 0.5 + 0.3 * (self.age * 10.0).sin();
        shimmer * (self.shield_timer / SHIELD_FADE_TIME).min(1.0)
    }

    /// Flash red for `DAMAGE_FLASH_DURATION`. Life accounting belongs to the
    /// game state.
    pub fn take_hit(&mut self) {
        self.damage_flash = DAMAGE_FLASH_DURATION;
    }

    pub fn color(&self) -> Color {
        if self.damage_flash > 0.0 {
            Color::RED
        } else {
            Color::WHITE
        }
    }

    /// Back to the center after losing a life
    pub fn respawn(&mut self) {
        self.body.pos = screen_center();
        self.body.vel = Vec2::ZERO;
        self.body.rotation = SPAWN_ROTATION;
        self.thrusting = false;
        self.shield_timer = 0.0;
        self.invulnerable_timer = PLAYER_RESPAWN_INVULNERABLE;
    }

    /// Blink while invulnerable
    fn visible(&self) -> bool {
        !self.is_invulnerable() || (self.invulnerable_timer * 10.0) as i32 % 2 == 0
    }
}

impl Entity for Player {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn radius(&self) -> f32 {
        PLAYER_RADIUS
    }

    fn update(&mut self, dt: f32, _ctx: &WorldContext) {
        if !self.body.active {
            return;
        }
        self.age += dt;
        self.body.integrate(dt);
        self.body.wrap(PLAYER_RADIUS);

        self.shield_timer = (self.shield_timer - dt).max(0.0);
        self.invulnerable_timer = (self.invulnerable_timer - dt).max(0.0);
        self.rapid_fire_timer = (self.rapid_fire_timer - dt).max(0.0);
        self.damage_flash = (self.damage_flash - dt).max(0.0);
    }

    fn render(&self, renderer: &mut dyn Renderer) {
        if !self.body.active || !self.visible() {
            return;
        }
        renderer.render_player(
            self.body.pos,
            self.body.rotation,
            self.color(),
            self.shield_active(),
            self.shield_alpha(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::new(EntityId(1), screen_center())
    }

    #[test]
    fn test_thrust_accelerates_along_heading() {
        let mut p = player();
        p.apply_controls(0.0, true, SIM_DT);
        assert!(p.thrusting);
        // Spawned pointing up (-y)
        assert!(p.body.vel.y < 0.0);
        assert!(p.body.vel.x.abs() < 1e-3);
    }

    #[test]
    fn test_speed_is_capped() {
        let mut p = player();
        for _ in 0..600 {
            p.apply_controls(0.0, true, SIM_DT);
        }
        assert!(p.body.vel.length() <= PLAYER_MAX_SPEED + 1e-3);
    }

    #[test]
    fn test_friction_slows_coasting_ship() {
        let mut p = player();
        p.body.vel = Vec2::new(100.0, 0.0);
        p.apply_controls(0.0, false, SIM_DT);
        assert!((p.body.vel.x - 99.0).abs() < 1e-3);
    }

    #[test]
    fn test_fire_respects_cooldown() {
        let mut p = player();
        let mut ids = IdAllocator::new();
        assert!(p.fire(0.0, &mut ids).is_some());
        assert!(p.fire(0.1, &mut ids).is_none());
        assert!(p.fire(PLAYER_FIRE_COOLDOWN, &mut ids).is_some());

        p.grant_rapid_fire();
        let t = PLAYER_FIRE_COOLDOWN + 0.15;
        assert!(p.fire(t, &mut ids).is_some());
    }

    #[test]
    fn test_bullet_leaves_from_nose() {
        let mut p = player();
        let mut ids = IdAllocator::new();
        let b = p.fire(0.0, &mut ids).unwrap();
        assert!(b.is_player_owned());
        assert!(((b.body.pos - p.body.pos).length() - PLAYER_RADIUS).abs() < 1e-3);
        assert!(b.body.vel.y < -BULLET_SPEED + 1.0);
    }

    #[test]
    fn test_shield_and_invulnerability_block_hits() {
        let mut p = player();
        assert!(p.is_vulnerable());
        p.activate_shield();
        assert!(!p.is_vulnerable());
        assert!(p.shield_alpha() > 0.0);

        p.update(PLAYER_SHIELD_DURATION + 0.1, &WorldContext::default());
        assert!(!p.shield_active());
        assert_eq!(p.shield_alpha(), 0.0);

        p.respawn();
        assert!(p.is_invulnerable());
        assert!(!p.is_vulnerable());
        assert_eq!(p.body.pos, screen_center());
    }

    #[test]
    fn test_hit_flashes_red_briefly() {
        let mut p = player();
        assert_eq!(p.color(), Color::WHITE);
        p.take_hit();
        assert_eq!(p.color(), Color::RED);

        p.update(0.1, &WorldContext::default());
        assert_eq!(p.color(), Color::RED);
        p.update(DAMAGE_FLASH_DURATION, &WorldContext::default());
        assert_eq!(p.color(), Color::WHITE);
    }

    #[test]
    fn test_render_uses_damage_color() {
        use crate::renderer::{DrawCall, RecordingRenderer};
        let mut p = player();
        p.take_hit();
        let mut renderer = RecordingRenderer::new();
        p.render(&mut renderer);
        assert!(matches!(
            renderer.calls().first(),
            Some(DrawCall::Player { color, .. }) if *color == Color::RED
        ));
    }

    #[test]
    fn test_dead_player_cannot_shoot() {
        let mut p = player();
        p.deactivate();
        assert!(!p.can_shoot(10.0));
    }
}
