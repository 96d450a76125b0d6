//! Game state and core simulation types

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::asteroid::{Asteroid, AsteroidSize};
use super::bullet::Bullet;
use super::collision::{CollisionManager, CollisionResult};
use super::enemy::{Enemy, EnemyKind};
use super::player::Player;
use super::powerup::{PowerUp, PowerUpKind};
use crate::consts::*;
use crate::renderer::Renderer;
use crate::settings::Settings;
use crate::wrap_position;

/// Unique entity identifier (never reused within a run)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Hands out entity IDs in increasing order. Owned by [`GameState`] and
/// reset when a new run starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// Next ID that `allocate` will return
    pub fn peek(&self) -> EntityId {
        EntityId(self.next)
    }

    pub fn reset(&mut self) {
        self.next = 1;
    }
}

/// Kinematic state shared by every entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub rotation: f32,
    pub active: bool,
}

impl Body {
    pub fn new(id: EntityId, pos: Vec2, vel: Vec2) -> Self {
        Self {
            id,
            pos,
            vel,
            rotation: 0.0,
            active: true,
        }
    }

    /// `pos += vel * dt`
    #[inline]
    pub fn integrate(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }

    /// Screen-wrap with a margin equal to the entity's size
    #[inline]
    pub fn wrap(&mut self, margin: f32) {
        self.pos = wrap_position(self.pos, margin);
    }
}

/// Anything the collision manager can test: a circle at a position
pub trait Collidable {
    fn id(&self) -> EntityId;
    fn position(&self) -> Vec2;
    fn collision_radius(&self) -> f32;
    fn is_active(&self) -> bool;
}

/// Read-only view of the world handed to every entity update
#[derive(Debug, Clone, Copy)]
pub struct WorldContext {
    /// Seconds since the run started
    pub time: f32,
    pub player_pos: Option<Vec2>,
    pub player_vel: Vec2,
    /// Difficulty speed multiplier
    pub speed_mult: f32,
    /// Position enemies in formation keep station around
    pub formation_anchor: Option<Vec2>,
}

impl Default for WorldContext {
    fn default() -> Self {
        Self {
            time: 0.0,
            player_pos: None,
            player_vel: Vec2::ZERO,
            speed_mult: 1.0,
            formation_anchor: None,
        }
    }
}

/// Shared capability set of every game entity
pub trait Entity {
    fn body(&self) -> &Body;
    fn body_mut(&mut self) -> &mut Body;
    fn radius(&self) -> f32;
    fn update(&mut self, dt: f32, ctx: &WorldContext);
    fn render(&self, renderer: &mut dyn Renderer);

    fn deactivate(&mut self) {
        self.body_mut().active = false;
    }
}

impl<T: Entity> Collidable for T {
    fn id(&self) -> EntityId {
        self.body().id
    }

    fn position(&self) -> Vec2 {
        self.body().pos
    }

    fn collision_radius(&self) -> f32 {
        self.radius()
    }

    fn is_active(&self) -> bool {
        self.body().active
    }
}

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    Paused,
    GameOver,
}

/// Things that happened during a tick, consumed by the effects layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    WaveStarted { wave: u32, asteroids: u32, enemies: u32 },
    WaveCleared { wave: u32 },
    AsteroidDestroyed { pos: Vec2, size: AsteroidSize, score: u64 },
    /// A player bullet struck an enemy without killing it
    BulletHit { pos: Vec2 },
    EnemyDestroyed { pos: Vec2, kind: EnemyKind, score: u64 },
    PlayerHit { pos: Vec2, lives_left: u8 },
    /// The shield absorbed a hit
    ShieldBlocked { pos: Vec2 },
    ShieldActivated,
    PowerUpCollected { pos: Vec2, kind: PowerUpKind },
    PlayerFired { pos: Vec2 },
    PlayerThrust { pos: Vec2, rotation: f32 },
    ExtraLife { lives: u8 },
    GameOver { score: u64, wave: u32 },
}

/// Complete simulation state (deterministic for a given seed and input sequence)
pub struct GameState {
    pub seed: u64,
    pub rng: Pcg32,
    pub ids: IdAllocator,
    pub phase: GamePhase,
    /// Current wave (1-based)
    pub wave: u32,
    pub lives: u8,
    pub score: u64,
    /// Score at which the next extra life is awarded
    pub next_extra_life: u64,
    /// Simulated seconds
    pub time: f32,
    pub frame: u64,
    /// Difficulty multipliers captured at the start of the run
    pub speed_mult: f32,
    pub count_mult: f32,
    pub score_mult: f32,
    /// Quality preset LOD bias applied to new asteroids
    pub lod_bias: u8,
    pub player: Player,
    pub asteroids: Vec<Asteroid>,
    pub bullets: Vec<Bullet>,
    pub enemies: Vec<Enemy>,
    pub powerups: Vec<PowerUp>,
    pub collisions: CollisionManager,
    /// Pairs detected during the most recent tick
    pub last_collisions: CollisionResult,
    /// Events produced since the last drain
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// New run with no asteroids spawned yet (see `tick::start_wave`)
    pub fn new(seed: u64, settings: &Settings) -> Self {
        let (speed_mult, count_mult, score_mult) = settings.difficulty_multipliers();
        let mut ids = IdAllocator::new();
        let player = Player::new(ids.allocate(), crate::screen_center());
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            ids,
            phase: GamePhase::Playing,
            wave: 0,
            lives: STARTING_LIVES,
            score: 0,
            next_extra_life: EXTRA_LIFE_SCORE_STEP,
            time: 0.0,
            frame: 0,
            speed_mult,
            count_mult,
            score_mult,
            lod_bias: settings.quality.lod_bias(),
            player,
            asteroids: Vec::new(),
            bullets: Vec::new(),
            enemies: Vec::new(),
            powerups: Vec::new(),
            collisions: CollisionManager::default(),
            last_collisions: CollisionResult::default(),
            events: Vec::new(),
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        self.ids.allocate()
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Context handed to entity updates this tick
    pub fn world_context(&self) -> WorldContext {
        let player_alive = self.player.body.active;
        WorldContext {
            time: self.time,
            player_pos: player_alive.then_some(self.player.body.pos),
            player_vel: self.player.body.vel,
            speed_mult: self.speed_mult,
            formation_anchor: self
                .enemies
                .iter()
                .find(|e| e.body.active && e.formation_slot.is_none())
                .map(|e| e.body.pos),
        }
    }

    /// Drop everything that died this tick
    pub fn remove_inactive(&mut self) {
        self.asteroids.retain(|a| a.body.active);
        self.bullets.retain(|b| b.body.active);
        self.enemies.retain(|e| e.body.active);
        self.powerups.retain(|p| p.body.active);
    }

    /// Apply a score award (scaled by difficulty)
    pub fn award(&mut self, base: u64) -> u64 {
        let points = (base as f32 * self.score_mult).round() as u64;
        self.score += points;
        points
    }

    /// Wave is over once every asteroid and enemy is gone
    pub fn wave_cleared(&self) -> bool {
        self.asteroids.is_empty() && self.enemies.is_empty()
    }

    pub fn hostile_count(&self) -> usize {
        self.asteroids.len() + self.enemies.len()
    }

    /// Spawn an asteroid with a fresh shape seed and spin
    pub fn spawn_asteroid(&mut self, pos: Vec2, vel: Vec2, size: AsteroidSize) -> EntityId {
        use rand::Rng;
        let id = self.next_entity_id();
        let seed = self.rng.random::<u32>();
        let spin = self.rng.random_range(-1.5..1.5);
        let asteroid = Asteroid::new(id, pos, vel, size, seed, spin).with_lod_bias(self.lod_bias);
        self.asteroids.push(asteroid);
        id
    }

    pub fn spawn_enemy(&mut self, pos: Vec2, kind: EnemyKind, formation_slot: Option<Vec2>) -> EntityId {
        let id = self.next_entity_id();
        self.enemies.push(Enemy::new(id, pos, kind, formation_slot));
        id
    }

    pub fn spawn_powerup(&mut self, pos: Vec2, kind: PowerUpKind) -> EntityId {
        let id = self.next_entity_id();
        self.powerups.push(PowerUp::new(id, pos, kind));
        id
    }
}
