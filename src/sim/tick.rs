//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. Each tick runs
//! in a fixed order: input → entity update → collision detection → collision
//! resolution → cleanup → wave progression.

use glam::Vec2;
use rand::Rng;

use super::asteroid::{Asteroid, AsteroidSize};
use super::collision::{CollisionInput, CollisionResult};
use super::enemy::EnemyKind;
use super::powerup::PowerUpKind;
use super::state::{Entity, EntityId, GameEvent, GamePhase, GameState};
use crate::consts::*;
use crate::{heading, normalize_angle};

/// Formation offsets for wingmen, relative to the leader
const FORMATION_SLOTS: [Vec2; 4] = [
    Vec2::new(-30.0, 30.0),
    Vec2::new(30.0, 30.0),
    Vec2::new(-60.0, 60.0),
    Vec2::new(60.0, 60.0),
];

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Turn rate: -1 (left) .. 1 (right)
    pub turn: f32,
    pub thrust: bool,
    pub fire: bool,
    /// Pause toggle
    pub pause: bool,
    /// Skip to next wave (debug/testing)
    pub skip_wave: bool,
    /// Idle/demo mode - autopilot flies the ship
    pub idle_mode: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            GamePhase::GameOver => {}
        }
    }

    // Don't tick if paused or game over
    if state.phase != GamePhase::Playing {
        state.last_collisions = CollisionResult::default();
        return;
    }

    let mut input = input.clone();
    if input.idle_mode {
        autopilot(state, &mut input);
    }
    let input = &input;

    // Debug: skip to next wave
    if input.skip_wave {
        state.asteroids.clear();
        state.enemies.clear();
        let next = state.wave + 1;
        start_wave(state, next);
        return;
    }

    state.frame += 1;
    state.time += dt;

    apply_player_input(state, input, dt);
    update_entities(state, dt);

    // Detection reads positions only after every entity has moved
    let result = state.collisions.detect(&CollisionInput::from_state(state));
    resolve_collisions(state, &result);
    state.last_collisions = result;

    state.remove_inactive();
    award_extra_lives(state);

    if state.phase == GamePhase::Playing && state.wave_cleared() {
        let cleared = state.wave;
        log::info!("Wave {} cleared (score {})", cleared, state.score);
        state.events.push(GameEvent::WaveCleared { wave: cleared });
        start_wave(state, cleared + 1);
    }
}

fn apply_player_input(state: &mut GameState, input: &TickInput, dt: f32) {
    let player = &mut state.player;
    player.apply_controls(input.turn, input.thrust, dt);
    if player.thrusting {
        let tail = player.body.pos - heading(player.body.rotation) * PLAYER_RADIUS;
        state.events.push(GameEvent::PlayerThrust {
            pos: tail,
            rotation: player.body.rotation,
        });
    }

    if input.fire {
        if let Some(bullet) = player.fire(state.time, &mut state.ids) {
            state.events.push(GameEvent::PlayerFired { pos: bullet.body.pos });
            state.bullets.push(bullet);
        }
    }
}

fn update_entities(state: &mut GameState, dt: f32) {
    let ctx = state.world_context();

    state.player.update(dt, &ctx);
    for asteroid in &mut state.asteroids {
        asteroid.update(dt, &ctx);
    }
    for bullet in &mut state.bullets {
        bullet.update(dt, &ctx);
    }
    for powerup in &mut state.powerups {
        powerup.update(dt, &ctx);
    }

    let mut enemy_shots = Vec::new();
    for enemy in &mut state.enemies {
        enemy.update(dt, &ctx);
        if let Some(target) = ctx.player_pos {
            if let Some(bullet) = enemy.fire(state.time, &mut state.ids, target) {
                enemy_shots.push(bullet);
            }
        }
    }
    state.bullets.extend(enemy_shots);
}

fn index_of<E: Entity>(items: &[E], id: EntityId) -> Option<usize> {
    items.iter().position(|e| e.body().id == id && e.body().active)
}

/// Apply a frame's collision pairs. Pairs referring to an entity that an
/// earlier pair already consumed are skipped.
pub fn resolve_collisions(state: &mut GameState, result: &CollisionResult) {
    for &(bullet_id, asteroid_id) in &result.bullet_asteroid {
        let (Some(bi), Some(ai)) = (index_of(&state.bullets, bullet_id), index_of(&state.asteroids, asteroid_id))
        else {
            continue;
        };
        state.bullets[bi].deactivate();
        let scored = state.bullets[bi].is_player_owned();
        destroy_asteroid(state, ai, scored);
    }

    for &(_, asteroid_id) in &result.player_asteroid {
        let Some(ai) = index_of(&state.asteroids, asteroid_id) else {
            continue;
        };
        if state.player.shield_active() {
            state.events.push(GameEvent::ShieldBlocked {
                pos: state.asteroids[ai].body.pos,
            });
            destroy_asteroid(state, ai, true);
        } else if state.player.is_vulnerable() {
            destroy_asteroid(state, ai, true);
            player_hit(state);
        }
    }

    for &(bullet_id, enemy_id) in &result.bullet_enemy {
        let (Some(bi), Some(ei)) = (index_of(&state.bullets, bullet_id), index_of(&state.enemies, enemy_id)) else {
            continue;
        };
        let pos = state.bullets[bi].body.pos;
        state.bullets[bi].deactivate();
        if state.enemies[ei].take_damage(BULLET_DAMAGE) {
            enemy_destroyed(state, ei);
        } else {
            state.events.push(GameEvent::BulletHit { pos });
        }
    }

    for &(bullet_id, _) in &result.enemy_bullet_player {
        let Some(bi) = index_of(&state.bullets, bullet_id) else {
            continue;
        };
        if state.player.shield_active() {
            state.bullets[bi].deactivate();
            state.events.push(GameEvent::ShieldBlocked {
                pos: state.bullets[bi].body.pos,
            });
        } else if state.player.is_vulnerable() {
            state.bullets[bi].deactivate();
            player_hit(state);
        }
    }

    for &(_, enemy_id) in &result.player_enemy {
        let Some(ei) = index_of(&state.enemies, enemy_id) else {
            continue;
        };
        let shielded = state.player.shield_active();
        if !shielded && !state.player.is_vulnerable() {
            continue;
        }
        // Ramming is fatal to the enemy either way
        let max_health = state.enemies[ei].max_health;
        state.enemies[ei].take_damage(max_health);
        if shielded {
            state.events.push(GameEvent::ShieldBlocked {
                pos: state.enemies[ei].body.pos,
            });
        }
        enemy_destroyed(state, ei);
        if !shielded {
            player_hit(state);
        }
    }

    for &(_, powerup_id) in &result.player_powerup {
        let Some(pi) = index_of(&state.powerups, powerup_id) else {
            continue;
        };
        if !state.player.body.active {
            continue;
        }
        state.powerups[pi].deactivate();
        let pos = state.powerups[pi].body.pos;
        let kind = state.powerups[pi].kind;
        collect_powerup(state, kind);
        state.events.push(GameEvent::PowerUpCollected { pos, kind });
    }
}

/// Destroy an asteroid, spawning its fragments. Scores only when `scored`.
fn destroy_asteroid(state: &mut GameState, index: usize, scored: bool) {
    let asteroid = &mut state.asteroids[index];
    asteroid.deactivate();
    let pos = asteroid.body.pos;
    let size = asteroid.size;
    let fragments = state.asteroids[index].split_velocities(&mut state.rng, state.speed_mult);

    let score = if scored { state.award(size.score()) } else { 0 };
    state.events.push(GameEvent::AsteroidDestroyed { pos, size, score });

    for (child, vel) in fragments {
        let offset = vel.normalize_or_zero() * child.radius() * 0.5;
        state.spawn_asteroid(pos + offset, vel, child);
    }
}

fn enemy_destroyed(state: &mut GameState, index: usize) {
    let enemy = &state.enemies[index];
    let (pos, kind) = (enemy.body.pos, enemy.kind);
    let score = state.award(kind.stats().score);
    log::debug!("{} destroyed (+{})", kind.as_str(), score);
    state.events.push(GameEvent::EnemyDestroyed { pos, kind, score });

    if state.rng.random_bool(POWERUP_DROP_CHANCE) {
        let drop = PowerUpKind::random(&mut state.rng);
        state.spawn_powerup(pos, drop);
    }
}

fn collect_powerup(state: &mut GameState, kind: PowerUpKind) {
    match kind {
        PowerUpKind::Shield => {
            state.player.activate_shield();
            state.events.push(GameEvent::ShieldActivated);
        }
        PowerUpKind::RapidFire => state.player.grant_rapid_fire(),
        PowerUpKind::ExtraLife => {
            state.lives = state.lives.saturating_add(1);
            state.events.push(GameEvent::ExtraLife { lives: state.lives });
        }
    }
}

/// The player lost a life: respawn or end the run
fn player_hit(state: &mut GameState) {
    let pos = state.player.body.pos;
    state.lives = state.lives.saturating_sub(1);
    log::debug!("Player hit, {} lives left", state.lives);
    state.events.push(GameEvent::PlayerHit {
        pos,
        lives_left: state.lives,
    });

    if state.lives == 0 {
        state.phase = GamePhase::GameOver;
        state.player.deactivate();
        log::info!("Game over: score {}, wave {}", state.score, state.wave);
        state.events.push(GameEvent::GameOver {
            score: state.score,
            wave: state.wave,
        });
    } else {
        state.player.respawn();
        state.player.take_hit();
    }
}

fn award_extra_lives(state: &mut GameState) {
    while state.score >= state.next_extra_life {
        state.next_extra_life += EXTRA_LIFE_SCORE_STEP;
        if state.phase != GamePhase::Playing {
            continue;
        }
        state.lives = state.lives.saturating_add(1);
        log::info!("Extra life at {} points ({} lives)", state.score, state.lives);
        state.events.push(GameEvent::ExtraLife { lives: state.lives });
    }
}

/// Populate `wave`: large asteroids along the edges, plus enemies from
/// the second wave on
pub fn start_wave(state: &mut GameState, wave: u32) {
    state.wave = wave;

    let base = INITIAL_WAVE_ASTEROID_COUNT + wave.saturating_sub(1);
    let asteroid_count = ((base as f32 * state.count_mult).round() as u32).max(1);
    for _ in 0..asteroid_count {
        let pos = safe_spawn_position(state);
        let vel = Asteroid::random_velocity(&mut state.rng, AsteroidSize::Large, state.speed_mult);
        state.spawn_asteroid(pos, vel, AsteroidSize::Large);
    }

    let kinds: Vec<EnemyKind> = EnemyKind::available(wave).collect();
    let enemy_count = if wave >= ENEMY_FIRST_WAVE && !kinds.is_empty() {
        let base = (wave - ENEMY_FIRST_WAVE + 1).min(FORMATION_SLOTS.len() as u32 + 1);
        (base as f32 * state.count_mult).round() as u32
    } else {
        0
    };
    if enemy_count > 0 {
        let leader_pos = safe_spawn_position(state);
        for i in 0..enemy_count as usize {
            let kind = kinds[state.rng.random_range(0..kinds.len())];
            let slot = i.checked_sub(1).and_then(|s| FORMATION_SLOTS.get(s)).copied();
            state.spawn_enemy(leader_pos + slot.unwrap_or(Vec2::ZERO), kind, slot);
        }
    }

    log::info!("Wave {}: {} asteroids, {} enemies", wave, asteroid_count, enemy_count);
    state.events.push(GameEvent::WaveStarted {
        wave,
        asteroids: asteroid_count,
        enemies: enemy_count,
    });
}

/// Random point on the playfield edge, away from the player
fn safe_spawn_position(state: &mut GameState) -> Vec2 {
    let player = state.player.body.pos;
    let min_dist = SPAWN_SAFE_DISTANCE + ASTEROID_RADIUS_LARGE;
    for _ in 0..16 {
        let pos = match state.rng.random_range(0..4) {
            0 => Vec2::new(state.rng.random_range(0.0..WORLD_WIDTH), 0.0),
            1 => Vec2::new(state.rng.random_range(0.0..WORLD_WIDTH), WORLD_HEIGHT),
            2 => Vec2::new(0.0, state.rng.random_range(0.0..WORLD_HEIGHT)),
            _ => Vec2::new(WORLD_WIDTH, state.rng.random_range(0.0..WORLD_HEIGHT)),
        };
        if pos.distance(player) >= min_dist {
            return pos;
        }
    }
    // Opposite corner of the torus from the player
    Vec2::new(
        (player.x + WORLD_WIDTH / 2.0).rem_euclid(WORLD_WIDTH),
        (player.y + WORLD_HEIGHT / 2.0).rem_euclid(WORLD_HEIGHT),
    )
}

/// Demo autopilot: turn toward the nearest threat, lead it, shoot
fn autopilot(state: &GameState, input: &mut TickInput) {
    let player = &state.player;
    if !player.body.active {
        return;
    }
    let ship = player.body.pos;

    let nearest = state
        .asteroids
        .iter()
        .map(|a| (a.body.pos, a.body.vel))
        .chain(state.enemies.iter().map(|e| (e.body.pos, e.body.vel)))
        .min_by(|a, b| {
            a.0.distance_squared(ship)
                .partial_cmp(&b.0.distance_squared(ship))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    let Some((target_pos, target_vel)) = nearest else {
        input.turn = 0.0;
        input.thrust = false;
        return;
    };

    // Lead the target by the bullet's flight time
    let dist = target_pos.distance(ship);
    let lead = target_pos + target_vel * (dist / BULLET_SPEED);
    let to_target = lead - ship;
    let desired = to_target.y.atan2(to_target.x);
    let diff = normalize_angle(desired - player.body.rotation);

    // Add a slow wobble so runs don't loop identically
    let wobble = (state.time * 0.7).sin() * 0.05;
    input.turn = ((diff + wobble) * 4.0).clamp(-1.0, 1.0);
    input.fire = diff.abs() < 0.15;
    input.thrust = dist > 300.0 && player.body.vel.length() < 100.0;
}
