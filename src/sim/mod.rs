//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (spawn order, IDs never reused)
//! - No rendering state: entities describe themselves to a `Renderer`

pub mod ai;
pub mod asteroid;
pub mod bullet;
pub mod collision;
pub mod enemy;
pub mod player;
pub mod powerup;
pub mod spatial;
pub mod state;
pub mod tick;

pub use ai::{AiContext, AiProfile, AiUpdate, EnemyState};
pub use asteroid::{Asteroid, AsteroidSize};
pub use bullet::{Bullet, BulletOwner};
pub use collision::{
    BroadPhase, CollisionInput, CollisionManager, CollisionResult, ContactPair, circles_overlap,
};
pub use enemy::{Enemy, EnemyKind, EnemyStats};
pub use player::Player;
pub use powerup::{PowerUp, PowerUpKind};
pub use spatial::SpatialGrid;
pub use state::{
    Body, Collidable, Entity, EntityId, GameEvent, GamePhase, GameState, IdAllocator, WorldContext,
};
pub use tick::{TickInput, resolve_collisions, start_wave, tick};
