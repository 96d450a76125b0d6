//! Enemy ships driven by the behavior state machine in [`super::ai`]

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ai::{self, AiContext, AiProfile, EnemyState};
use super::bullet::{Bullet, BulletOwner};
use super::state::{Body, Entity, EntityId, IdAllocator, WorldContext};
use crate::color::Color;
use crate::consts::*;
use crate::renderer::Renderer;

/// How quickly an enemy turns its velocity toward the desired one (1/s)
const STEER_RATE: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Small, fast, fragile
    Scout,
    Fighter,
    /// Slow heavy gunship
    Destroyer,
}

/// Per-kind tuning table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub size: f32,
    pub health: f32,
    pub speed: f32,
    pub fire_cooldown: f32,
    pub score: u64,
    pub detection_range: f32,
    pub attack_range: f32,
    pub retreat_distance: f32,
    /// First wave this kind can appear in
    pub min_wave: u32,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Scout, EnemyKind::Fighter, EnemyKind::Destroyer];

    pub fn stats(&self) -> EnemyStats {
        match self {
            EnemyKind::Scout => EnemyStats {
                size: 12.0,
                health: 20.0,
                speed: 160.0,
                fire_cooldown: 1.5,
                score: 150,
                detection_range: 450.0,
                attack_range: 200.0,
                retreat_distance: 80.0,
                min_wave: 2,
            },
            EnemyKind::Fighter => EnemyStats {
                size: 16.0,
                health: 40.0,
                speed: 120.0,
                fire_cooldown: 1.0,
                score: 250,
                detection_range: 400.0,
                attack_range: 250.0,
                retreat_distance: 90.0,
                min_wave: 3,
            },
            EnemyKind::Destroyer => EnemyStats {
                size: 24.0,
                health: 80.0,
                speed: 80.0,
                fire_cooldown: 0.7,
                score: 500,
                detection_range: 350.0,
                attack_range: 300.0,
                retreat_distance: 120.0,
                min_wave: 5,
            },
        }
    }

    pub fn color(&self) -> Color {
        match self {
            EnemyKind::Scout => Color::ORANGE,
            EnemyKind::Fighter => Color::RED,
            EnemyKind::Destroyer => Color::DARK_RED,
        }
    }

    /// Kinds that may appear in `wave`
    pub fn available(wave: u32) -> impl Iterator<Item = EnemyKind> {
        Self::ALL.into_iter().filter(move |k| wave >= k.stats().min_wave)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyKind::Scout => "Scout",
            EnemyKind::Fighter => "Fighter",
            EnemyKind::Destroyer => "Destroyer",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub body: Body,
    pub kind: EnemyKind,
    pub health: f32,
    pub max_health: f32,
    /// Seconds left on the white hit flash
    pub damage_flash: f32,
    pub state: EnemyState,
    /// Seconds in `state`
    pub state_time: f32,
    /// Offset from the formation leader, if this enemy flies in formation
    pub formation_slot: Option<Vec2>,
    /// +1 / -1 orbit direction
    pub orbit_dir: f32,
    /// Set by `update` when the AI wants to shoot and the cooldown allows
    pub wants_to_fire: bool,
    last_shot: Option<f32>,
}

impl Enemy {
    pub fn new(id: EntityId, pos: Vec2, kind: EnemyKind, formation_slot: Option<Vec2>) -> Self {
        let stats = kind.stats();
        Self {
            body: Body::new(id, pos, Vec2::ZERO),
            kind,
            health: stats.health,
            max_health: stats.health,
            damage_flash: 0.0,
            state: if formation_slot.is_some() {
                EnemyState::FormationFlying
            } else {
                EnemyState::Idle
            },
            state_time: 0.0,
            formation_slot,
            orbit_dir: if id.0 % 2 == 0 { 1.0 } else { -1.0 },
            wants_to_fire: false,
            last_shot: None,
        }
    }

    pub fn profile(&self, speed_mult: f32) -> AiProfile {
        let stats = self.kind.stats();
        AiProfile {
            speed: stats.speed * speed_mult,
            detection_range: stats.detection_range,
            attack_range: stats.attack_range,
            retreat_distance: stats.retreat_distance,
        }
    }

    pub fn health_pct(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }

    /// Subtract health and light the hit flash. Returns true if this hit
    /// destroyed the enemy.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.body.active {
            return false;
        }
        self.health -= amount;
        self.damage_flash = DAMAGE_FLASH_DURATION;
        if self.health <= 0.0 {
            self.health = 0.0;
            self.body.active = false;
            return true;
        }
        false
    }

    pub fn can_shoot(&self, now: f32) -> bool {
        self.body.active
            && self
                .last_shot
                .is_none_or(|t| now - t >= self.kind.stats().fire_cooldown)
    }

    /// Shoot at `target` if the AI asked to and the cooldown allows
    pub fn fire(&mut self, now: f32, ids: &mut IdAllocator, target: Vec2) -> Option<Bullet> {
        if !self.wants_to_fire || !self.can_shoot(now) {
            return None;
        }
        self.wants_to_fire = false;
        self.last_shot = Some(now);
        let dir = (target - self.body.pos).normalize_or_zero();
        if dir == Vec2::ZERO {
            return None;
        }
        Some(Bullet::new(
            ids.allocate(),
            self.body.pos + dir * self.kind.stats().size,
            dir * ENEMY_BULLET_SPEED,
            BulletOwner::Enemy(self.body.id),
        ))
    }

    pub fn color(&self) -> Color {
        if self.damage_flash > 0.0 {
            Color::WHITE
        } else {
            self.kind.color()
        }
    }
}

impl Entity for Enemy {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn radius(&self) -> f32 {
        self.kind.stats().size
    }

    fn update(&mut self, dt: f32, ctx: &WorldContext) {
        if !self.body.active {
            return;
        }
        let recently_damaged = self.damage_flash > 0.0;
        self.damage_flash = (self.damage_flash - dt).max(0.0);
        self.state_time += dt;

        let update = ai::evaluate(&AiContext {
            state: self.state,
            state_time: self.state_time,
            position: self.body.pos,
            velocity: self.body.vel,
            player_pos: ctx.player_pos,
            player_vel: ctx.player_vel,
            profile: self.profile(ctx.speed_mult),
            health_pct: self.health_pct(),
            recently_damaged,
            formation_target: ctx.formation_anchor.zip(self.formation_slot).map(|(a, s)| a + s),
            orbit_dir: self.orbit_dir,
        });
        if update.state_changed {
            log::debug!(
                "{} {} {:?} -> {:?}",
                self.kind.as_str(),
                self.body.id.0,
                self.state,
                update.new_state
            );
            self.state = update.new_state;
            self.state_time = 0.0;
        }

        let blend = (STEER_RATE * dt).min(1.0);
        self.body.vel += (update.desired_velocity - self.body.vel) * blend;
        self.body.integrate(dt);
        self.body.wrap(self.kind.stats().size);

        let facing = match ctx.player_pos {
            Some(player) if self.state != EnemyState::Retreating => player - self.body.pos,
            _ => self.body.vel,
        };
        if facing.length_squared() > 1e-6 {
            self.body.rotation = facing.y.atan2(facing.x);
        }

        self.wants_to_fire = update.wants_to_fire && self.can_shoot(ctx.time);
    }

    fn render(&self, renderer: &mut dyn Renderer) {
        let size = self.kind.stats().size;
        if !renderer.is_in_view_frustum(self.body.pos, size) {
            return;
        }
        renderer.render_enemy(
            self.body.pos,
            self.body.rotation,
            self.kind,
            self.color(),
            size,
            self.health_pct(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fighter() -> Enemy {
        Enemy::new(EntityId(4), Vec2::new(100.0, 100.0), EnemyKind::Fighter, None)
    }

    fn ctx_with_player(player: Vec2, time: f32) -> WorldContext {
        WorldContext {
            time,
            player_pos: Some(player),
            ..WorldContext::default()
        }
    }

    #[test]
    fn test_take_damage_flashes_then_kills() {
        let mut e = fighter();
        assert!(!e.take_damage(BULLET_DAMAGE));
        assert_eq!(e.health, 20.0);
        assert!(e.damage_flash > 0.0);
        assert_eq!(e.color(), Color::WHITE);
        assert!((e.health_pct() - 0.5).abs() < 1e-6);

        assert!(e.take_damage(BULLET_DAMAGE));
        assert!(!e.body.active);
        assert_eq!(e.health, 0.0);
        // Already dead: no double kill
        assert!(!e.take_damage(BULLET_DAMAGE));
    }

    #[test]
    fn test_flash_decays() {
        let mut e = fighter();
        e.take_damage(1.0);
        let ctx = WorldContext::default();
        for _ in 0..30 {
            e.update(SIM_DT, &ctx);
        }
        assert_eq!(e.damage_flash, 0.0);
        assert_eq!(e.color(), EnemyKind::Fighter.color());
    }

    #[test]
    fn test_enemy_closes_in_and_fires() {
        let mut e = fighter();
        let player = Vec2::new(400.0, 100.0);
        let mut ids = IdAllocator::new();
        let mut shots = 0;
        for frame in 0..600 {
            let t = frame as f32 * SIM_DT;
            e.update(SIM_DT, &ctx_with_player(player, t));
            if let Some(b) = e.fire(t, &mut ids, player) {
                assert_eq!(b.owner, BulletOwner::Enemy(e.body.id));
                assert!((b.body.vel.length() - ENEMY_BULLET_SPEED).abs() < 1e-2);
                shots += 1;
            }
        }
        assert!(shots > 0);
        // Cooldown bounds the fire rate
        assert!(shots as f32 <= 10.0 / e.kind.stats().fire_cooldown + 1.0);
    }

    #[test]
    fn test_fire_needs_ai_request() {
        let mut e = fighter();
        let mut ids = IdAllocator::new();
        assert!(e.fire(0.0, &mut ids, Vec2::new(200.0, 100.0)).is_none());
    }

    #[test]
    fn test_formation_member_starts_in_formation() {
        let e = Enemy::new(EntityId(5), Vec2::ZERO, EnemyKind::Scout, Some(Vec2::new(-30.0, 30.0)));
        assert_eq!(e.state, EnemyState::FormationFlying);
        assert_eq!(fighter().state, EnemyState::Idle);
    }

    #[test]
    fn test_kinds_by_wave() {
        assert_eq!(EnemyKind::available(1).count(), 0);
        assert_eq!(EnemyKind::available(2).collect::<Vec<_>>(), vec![EnemyKind::Scout]);
        assert_eq!(EnemyKind::available(5).count(), 3);
    }
}
