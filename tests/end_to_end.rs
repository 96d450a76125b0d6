//! Whole-frame scenarios driven through the public API

use std::collections::HashSet;

use astro_blast::consts::*;
use astro_blast::renderer::{DrawCall, RecordingRenderer, Renderer};
use astro_blast::sim::{
    AsteroidSize, Bullet, BulletOwner, EntityId, GameEvent, GamePhase, GameState, TickInput, tick,
};
use astro_blast::{Game, Settings};
use glam::Vec2;

/// One medium rock in the top-left corner and a player bullet flying at it
fn bullet_vs_rock() -> (GameState, EntityId, EntityId) {
    let mut state = GameState::new(7, &Settings::default());
    state.wave = 1;
    let rock = state.spawn_asteroid(Vec2::new(100.0, 100.0), Vec2::ZERO, AsteroidSize::Medium);
    let shot = state.next_entity_id();
    state.bullets.push(Bullet::new(
        shot,
        Vec2::new(40.0, 100.0),
        Vec2::new(BULLET_SPEED, 0.0),
        BulletOwner::Player,
    ));
    (state, shot, rock)
}

#[test]
fn bullet_hits_asteroid_in_exactly_one_frame() {
    let (mut state, shot, rock) = bullet_vs_rock();
    let input = TickInput::default();

    let mut hit_frames = Vec::new();
    let mut events = Vec::new();
    for _ in 0..60 {
        tick(&mut state, &input, SIM_DT);
        if !state.last_collisions.bullet_asteroid.is_empty() {
            assert_eq!(state.last_collisions.bullet_asteroid, vec![(shot, rock)]);
            hit_frames.push(state.frame);
        }
        events.extend(state.drain_events());
    }

    assert_eq!(hit_frames.len(), 1, "pair reported in frames {hit_frames:?}");
    assert_eq!(state.score, SCORE_MEDIUM_ASTEROID);
    assert!(state.bullets.is_empty());
    assert!(state.asteroids.iter().all(|a| a.size == AsteroidSize::Small));
    assert_eq!(state.asteroids.len(), 2);

    let destroyed = events
        .iter()
        .filter(|e| matches!(e, GameEvent::AsteroidDestroyed { .. }))
        .count();
    assert_eq!(destroyed, 1);
}

#[test]
fn autopilot_run_keeps_ids_unique() {
    let mut game = Game::new(2024, Settings::default());
    game.input.idle_mode = true;

    let mut renderer = RecordingRenderer::new();
    assert!(renderer.initialize());

    let mut last_next = game.state.ids.peek();
    for _ in 0..1800 {
        game.frame(SIM_DT, &mut renderer);

        let state = &game.state;
        let mut seen = HashSet::new();
        let ids = std::iter::once(state.player.body.id)
            .chain(state.asteroids.iter().map(|a| a.body.id))
            .chain(state.bullets.iter().map(|b| b.body.id))
            .chain(state.enemies.iter().map(|e| e.body.id))
            .chain(state.powerups.iter().map(|p| p.body.id));
        for id in ids {
            assert!(seen.insert(id), "duplicate id {id:?}");
        }
        let next = state.ids.peek();
        assert!(seen.iter().all(|id| *id < next));
        assert!(next >= last_next);
        last_next = next;

        if game.phase() == GamePhase::GameOver {
            break;
        }
    }

    assert!(game.state.score > 0);
    assert_eq!(renderer.count(|c| matches!(c, DrawCall::Grid { .. })), 1);
}

#[test]
fn paused_game_renders_but_does_not_advance() {
    let mut game = Game::new(5, Settings::default());
    game.input.pause = true;
    game.update(SIM_DT);
    let frozen = game.state.frame;
    let asteroids: Vec<Vec2> = game.state.asteroids.iter().map(|a| a.body.pos).collect();

    let mut renderer = RecordingRenderer::new();
    for _ in 0..30 {
        game.frame(SIM_DT, &mut renderer);
    }

    assert_eq!(game.state.frame, frozen);
    let now: Vec<Vec2> = game.state.asteroids.iter().map(|a| a.body.pos).collect();
    assert_eq!(asteroids, now);
    assert_eq!(renderer.frames(), 30);
    assert!(renderer.count(|c| matches!(c, DrawCall::Asteroid { .. })) > 0);
}
