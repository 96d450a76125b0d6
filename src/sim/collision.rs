//! Collision detection between entity collections
//!
//! The manager only reports overlapping pairs; it never mutates entities.
//! Resolution (damage, splitting, scoring) happens in `tick`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::asteroid::Asteroid;
use super::bullet::Bullet;
use super::enemy::Enemy;
use super::player::Player;
use super::powerup::PowerUp;
use super::spatial::SpatialGrid;
use super::state::{Collidable, EntityId, GameState};
use crate::consts::COLLISION_CELL_SIZE;

/// `(first, second)` IDs of an overlapping pair, ordered as the result
/// field's name reads
pub type ContactPair = (EntityId, EntityId);

/// How candidate pairs are found. Both strategies report the same pairs in
/// the same order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BroadPhase {
    /// Test every pair
    BruteForce,
    /// Bucket the second collection into a uniform grid
    Grid { cell_size: f32 },
}

impl Default for BroadPhase {
    fn default() -> Self {
        BroadPhase::Grid {
            cell_size: COLLISION_CELL_SIZE,
        }
    }
}

/// Pairs detected this frame, partitioned by type pair
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionResult {
    /// (bullet, asteroid), any owner
    pub bullet_asteroid: Vec<ContactPair>,
    /// (player, asteroid)
    pub player_asteroid: Vec<ContactPair>,
    /// (player bullet, enemy)
    pub bullet_enemy: Vec<ContactPair>,
    /// (enemy bullet, player)
    pub enemy_bullet_player: Vec<ContactPair>,
    /// (player, enemy)
    pub player_enemy: Vec<ContactPair>,
    /// (player, power-up)
    pub player_powerup: Vec<ContactPair>,
}

impl CollisionResult {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total pairs across every partition
    pub fn len(&self) -> usize {
        self.bullet_asteroid.len()
            + self.player_asteroid.len()
            + self.bullet_enemy.len()
            + self.enemy_bullet_player.len()
            + self.player_enemy.len()
            + self.player_powerup.len()
    }
}

/// Snapshot of the collections to test
#[derive(Debug, Clone, Copy, Default)]
pub struct CollisionInput<'a> {
    pub bullets: &'a [Bullet],
    pub asteroids: &'a [Asteroid],
    pub player: Option<&'a Player>,
    pub enemies: &'a [Enemy],
    pub powerups: &'a [PowerUp],
}

impl<'a> CollisionInput<'a> {
    pub fn from_state(state: &'a GameState) -> Self {
        Self {
            bullets: &state.bullets,
            asteroids: &state.asteroids,
            player: Some(&state.player),
            enemies: &state.enemies,
            powerups: &state.powerups,
        }
    }
}

/// Circle-circle test: `distance(centers) <= ra + rb`. Non-finite input
/// never overlaps.
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let reach = ra + rb;
    reach.is_finite() && a.distance_squared(b) <= reach * reach
}

/// Both entities are active and their circles overlap
#[inline]
pub fn collides<A: Collidable + ?Sized, B: Collidable + ?Sized>(a: &A, b: &B) -> bool {
    a.is_active()
        && b.is_active()
        && circles_overlap(a.position(), a.collision_radius(), b.position(), b.collision_radius())
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionManager {
    pub broad_phase: BroadPhase,
}

impl CollisionManager {
    pub fn new(broad_phase: BroadPhase) -> Self {
        Self { broad_phase }
    }

    pub fn brute_force() -> Self {
        Self::new(BroadPhase::BruteForce)
    }

    /// Test every partition. Empty collections yield an empty result.
    pub fn detect(&self, input: &CollisionInput<'_>) -> CollisionResult {
        let player = input.player.map(std::slice::from_ref).unwrap_or(&[]);
        CollisionResult {
            bullet_asteroid: self.sweep(input.bullets, input.asteroids, |_| true),
            player_asteroid: self.sweep(player, input.asteroids, |_| true),
            bullet_enemy: self.sweep(input.bullets, input.enemies, Bullet::is_player_owned),
            enemy_bullet_player: self.sweep(input.bullets, player, |b| !b.is_player_owned()),
            player_enemy: self.sweep(player, input.enemies, |_| true),
            player_powerup: self.sweep(player, input.powerups, |_| true),
        }
    }

    /// Every active `a` (passing `filter`) against every active `b`. Pairs
    /// come out in `a` order, then `b` order.
    pub fn sweep<A, B>(&self, a: &[A], b: &[B], filter: impl Fn(&A) -> bool) -> Vec<ContactPair>
    where
        A: Collidable,
        B: Collidable,
    {
        let mut pairs = Vec::new();
        if a.is_empty() || b.is_empty() {
            return pairs;
        }
        let candidates_a = a.iter().filter(|x| x.is_active() && filter(*x));

        match self.broad_phase {
            BroadPhase::BruteForce => {
                for x in candidates_a {
                    for y in b {
                        if collides(x, y) {
                            pairs.push((x.id(), y.id()));
                        }
                    }
                }
            }
            BroadPhase::Grid { cell_size } => {
                let mut grid = SpatialGrid::new(cell_size);
                for (i, y) in b.iter().enumerate().filter(|(_, y)| y.is_active()) {
                    grid.insert(i, y.position(), y.collision_radius());
                }
                let mut nearby = Vec::new();
                for x in candidates_a {
                    grid.query(x.position(), x.collision_radius(), &mut nearby);
                    for &j in &nearby {
                        if collides(x, &b[j]) {
                            pairs.push((x.id(), b[j].id()));
                        }
                    }
                }
            }
        }
        pairs
    }
}
