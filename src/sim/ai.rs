//! Enemy behavior state machine
//!
//! Pure functions: given an enemy's situation, pick its next state and the
//! velocity it wants to fly at. The caller owns the enemy and applies the
//! result (resetting its state timer when the state changes).
//!
//! Transitions (d = distance to the player):
//!
//! | From            | To              | When                                      |
//! |-----------------|-----------------|-------------------------------------------|
//! | any             | Evading         | just hit and health below 50%             |
//! | any             | Idle            | no live player (formations hold station)  |
//! | Idle            | Pursuing        | d <= detection range                      |
//! | FormationFlying | Attacking       | d <= attack range                         |
//! | FormationFlying | Pursuing        | formation leader gone                     |
//! | Pursuing        | Retreating      | d < retreat distance                      |
//! | Pursuing        | Attacking       | d <= attack range                         |
//! | Pursuing        | Idle            | d > 1.5 x detection range                 |
//! | Pursuing        | Intercepting    | player speed > 150 after 1 s of pursuit   |
//! | Intercepting    | Attacking       | d <= attack range                         |
//! | Intercepting    | Pursuing        | 4 s without closing in                    |
//! | Attacking       | Retreating      | d < retreat distance                      |
//! | Attacking       | Pursuing        | d > 1.2 x attack range                    |
//! | Attacking       | Circling        | 3 s in state                              |
//! | Circling        | Retreating      | d < retreat distance                      |
//! | Circling        | Pursuing        | d > 1.5 x attack range                    |
//! | Circling        | Attacking       | 2.5 s in state                            |
//! | Retreating      | Circling        | d >= attack range or 1.5 s in state       |
//! | Evading         | Retreating      | 1 s in state                              |

use glam::Vec2;
use serde::{Deserialize, Serialize};

const LOSE_TRACK_FACTOR: f32 = 1.5;
const ATTACK_EXIT_FACTOR: f32 = 1.2;
const CIRCLE_EXIT_FACTOR: f32 = 1.5;
const ATTACK_DURATION: f32 = 3.0;
const CIRCLE_DURATION: f32 = 2.5;
const RETREAT_DURATION: f32 = 1.5;
const INTERCEPT_TIMEOUT: f32 = 4.0;
const INTERCEPT_DELAY: f32 = 1.0;
const EVADE_DURATION: f32 = 1.0;
/// Player speed (px/s) that makes a pursuer switch to leading its target
const INTERCEPT_PLAYER_SPEED: f32 = 150.0;
const EVADE_HEALTH_PCT: f32 = 0.5;
/// Fraction of top speed used while idling
const IDLE_DRIFT: f32 = 0.3;
/// Attackers and circlers hold station at this fraction of attack range
const STANDOFF_FACTOR: f32 = 0.8;
/// Cap on how far ahead an interceptor leads the player (s)
const MAX_LEAD_TIME: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EnemyState {
    #[default]
    Idle,
    Pursuing,
    Retreating,
    Circling,
    Attacking,
    FormationFlying,
    Intercepting,
    Evading,
}

impl EnemyState {
    /// States in which the enemy shoots when its cooldown allows
    pub fn fires(&self) -> bool {
        matches!(self, EnemyState::Attacking | EnemyState::Circling)
    }
}

/// Per-kind tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiProfile {
    pub speed: f32,
    pub detection_range: f32,
    pub attack_range: f32,
    pub retreat_distance: f32,
}

/// Input to the state machine for one enemy
#[derive(Debug, Clone, Copy)]
pub struct AiContext {
    pub state: EnemyState,
    /// Seconds spent in `state`
    pub state_time: f32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub player_pos: Option<Vec2>,
    pub player_vel: Vec2,
    pub profile: AiProfile,
    /// Current health / max health
    pub health_pct: f32,
    pub recently_damaged: bool,
    pub formation_target: Option<Vec2>,
    /// +1 or -1: which way this enemy orbits and dodges
    pub orbit_dir: f32,
}

/// Output of the state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiUpdate {
    pub new_state: EnemyState,
    pub desired_velocity: Vec2,
    pub state_changed: bool,
    pub wants_to_fire: bool,
}

/// Evaluate the state machine for one enemy
pub fn evaluate(ctx: &AiContext) -> AiUpdate {
    let new_state = next_state(ctx);
    AiUpdate {
        new_state,
        desired_velocity: steer(new_state, ctx),
        state_changed: new_state != ctx.state,
        wants_to_fire: new_state.fires() && ctx.player_pos.is_some(),
    }
}

fn next_state(ctx: &AiContext) -> EnemyState {
    let Some(player) = ctx.player_pos else {
        return match ctx.state {
            EnemyState::FormationFlying if ctx.formation_target.is_some() => EnemyState::FormationFlying,
            _ => EnemyState::Idle,
        };
    };

    if ctx.recently_damaged && ctx.health_pct < EVADE_HEALTH_PCT && ctx.state != EnemyState::Evading {
        return EnemyState::Evading;
    }

    let dist = ctx.position.distance(player);
    let p = &ctx.profile;

    match ctx.state {
        EnemyState::Idle => {
            if dist <= p.detection_range {
                EnemyState::Pursuing
            } else {
                EnemyState::Idle
            }
        }
        EnemyState::FormationFlying => evaluate_formation(ctx, dist),
        EnemyState::Pursuing => evaluate_pursuing(ctx, dist),
        EnemyState::Intercepting => {
            if dist <= p.attack_range {
                EnemyState::Attacking
            } else if ctx.state_time > INTERCEPT_TIMEOUT {
                EnemyState::Pursuing
            } else {
                EnemyState::Intercepting
            }
        }
        EnemyState::Attacking => {
            if dist < p.retreat_distance {
                EnemyState::Retreating
            } else if dist > p.attack_range * ATTACK_EXIT_FACTOR {
                EnemyState::Pursuing
            } else if ctx.state_time > ATTACK_DURATION {
                EnemyState::Circling
            } else {
                EnemyState::Attacking
            }
        }
        EnemyState::Circling => {
            if dist < p.retreat_distance {
                EnemyState::Retreating
            } else if dist > p.attack_range * CIRCLE_EXIT_FACTOR {
                EnemyState::Pursuing
            } else if ctx.state_time > CIRCLE_DURATION {
                EnemyState::Attacking
            } else {
                EnemyState::Circling
            }
        }
        EnemyState::Retreating => {
            if dist >= p.attack_range || ctx.state_time > RETREAT_DURATION {
                EnemyState::Circling
            } else {
                EnemyState::Retreating
            }
        }
        EnemyState::Evading => {
            if ctx.state_time > EVADE_DURATION {
                EnemyState::Retreating
            } else {
                EnemyState::Evading
            }
        }
    }
}

fn evaluate_formation(ctx: &AiContext, dist: f32) -> EnemyState {
    if dist <= ctx.profile.attack_range {
        EnemyState::Attacking
    } else if ctx.formation_target.is_none() {
        EnemyState::Pursuing
    } else {
        EnemyState::FormationFlying
    }
}

fn evaluate_pursuing(ctx: &AiContext, dist: f32) -> EnemyState {
    let p = &ctx.profile;
    if dist < p.retreat_distance {
        EnemyState::Retreating
    } else if dist <= p.attack_range {
        EnemyState::Attacking
    } else if dist > p.detection_range * LOSE_TRACK_FACTOR {
        EnemyState::Idle
    } else if ctx.player_vel.length() > INTERCEPT_PLAYER_SPEED && ctx.state_time > INTERCEPT_DELAY {
        EnemyState::Intercepting
    } else {
        EnemyState::Pursuing
    }
}

/// Velocity the enemy wants while in `state`
fn steer(state: EnemyState, ctx: &AiContext) -> Vec2 {
    let speed = ctx.profile.speed;
    let Some(player) = ctx.player_pos else {
        return match state {
            EnemyState::FormationFlying => formation_velocity(ctx),
            _ => ctx.velocity.clamp_length_max(speed * IDLE_DRIFT),
        };
    };

    let to_player = player - ctx.position;
    let dist = to_player.length();
    let dir = to_player.normalize_or_zero();
    let tangent = dir.perp() * ctx.orbit_dir;
    let standoff = ctx.profile.attack_range * STANDOFF_FACTOR;

    match state {
        EnemyState::Idle => ctx.velocity.clamp_length_max(speed * IDLE_DRIFT),
        EnemyState::Pursuing => dir * speed,
        EnemyState::Intercepting => {
            let lead = (dist / speed.max(1.0)).min(MAX_LEAD_TIME);
            let predicted = player + ctx.player_vel * lead;
            (predicted - ctx.position).normalize_or_zero() * speed
        }
        EnemyState::Attacking => {
            // Creep toward the standoff distance while shooting
            let radial = if dist > standoff { 1.0 } else { -1.0 };
            dir * radial * speed * 0.3
        }
        EnemyState::Circling => {
            let correction = ((dist - standoff) / standoff.max(1.0)).clamp(-1.0, 1.0);
            (tangent + dir * correction * 0.5).normalize_or_zero() * speed
        }
        EnemyState::Retreating => -dir * speed,
        EnemyState::Evading => (tangent * 1.2 - dir * 0.3) * speed,
        EnemyState::FormationFlying => formation_velocity(ctx),
    }
}

fn formation_velocity(ctx: &AiContext) -> Vec2 {
    match ctx.formation_target {
        Some(target) => ((target - ctx.position) * 2.0).clamp_length_max(ctx.profile.speed),
        None => Vec2::ZERO,
    }
}
