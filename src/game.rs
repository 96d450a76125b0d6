//! Frame orchestrator
//!
//! One frame runs input → simulation ticks (entity update, collision
//! detection, resolution) → effects update → render. The simulation reports
//! what happened as [`GameEvent`]s; this is the only place that turns them
//! into screen and particle effects.

use crate::color::Color;
use crate::consts::*;
use crate::effects::{ScreenEffects, VisualEffects};
use crate::renderer::Renderer;
use crate::screen_center;
use crate::settings::Settings;
use crate::sim::{Entity, GameEvent, GamePhase, GameState, TickInput, start_wave, tick};

/// Frame time ceiling (s); longer stalls are treated as this long
const MAX_FRAME_DT: f32 = 0.1;

pub struct Game {
    pub state: GameState,
    pub screen: ScreenEffects,
    pub vfx: VisualEffects,
    /// Input applied to the next frame's ticks; one-shot flags are cleared
    /// after the first tick that sees them
    pub input: TickInput,
    settings: Settings,
    accumulator: f32,
}

impl Game {
    /// Start a run at wave 1
    pub fn new(seed: u64, settings: Settings) -> Self {
        let mut state = GameState::new(seed, &settings);
        start_wave(&mut state, 1);

        let mut screen = ScreenEffects::with_seed(seed.wrapping_add(1));
        screen.apply_settings(&settings);
        let vfx = VisualEffects::with_seed(seed.wrapping_add(2), &settings);

        log::info!(
            "New game: seed {}, difficulty {}, quality {}",
            seed,
            settings.difficulty.as_str(),
            settings.quality.as_str()
        );

        let mut game = Self {
            state,
            screen,
            vfx,
            input: TickInput::default(),
            settings,
            accumulator: 0.0,
        };
        game.handle_events();
        game
    }

    /// New run with fresh state, IDs and effects
    pub fn restart(&mut self, seed: u64) {
        *self = Self::new(seed, self.settings.clone());
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Effect toggles apply immediately; difficulty and particle capacity
    /// apply from the next `restart`. Turning on reduced motion also drops
    /// screen effects already running.
    pub fn set_settings(&mut self, settings: Settings) {
        if settings.reduced_motion && !self.settings.reduced_motion {
            self.screen.clear();
        }
        self.screen.apply_settings(&settings);
        self.vfx.apply_settings(&settings);
        self.settings = settings;
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    /// Advance by one frame of wall-clock time using fixed simulation steps.
    /// The VFX time scale stretches simulated time (slow motion).
    pub fn update(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let dt = dt.min(MAX_FRAME_DT);
        self.accumulator += dt * self.vfx.time_scale();

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = self.input.clone();
            tick(&mut self.state, &input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.pause = false;
            self.input.skip_wave = false;

            self.handle_events();
        }
        if substeps == MAX_SUBSTEPS {
            // Drop the backlog instead of spiralling
            self.accumulator = self.accumulator.min(SIM_DT);
        }

        self.screen.update(dt);
        self.vfx.update(dt);
    }

    /// One display frame of exactly `SIM_DT` with `input`. Deterministic
    /// stepping for tests and replays; slow motion runs fewer ticks, as in
    /// `update`.
    pub fn step(&mut self, input: &TickInput) {
        self.input = input.clone();
        self.update(SIM_DT);
    }

    /// Update then render
    pub fn frame(&mut self, dt: f32, renderer: &mut dyn Renderer) {
        self.update(dt);
        self.render(renderer);
    }

    fn handle_events(&mut self) {
        for event in self.state.drain_events() {
            self.apply_event(&event);
        }
    }

    fn apply_event(&mut self, event: &GameEvent) {
        match *event {
            GameEvent::WaveStarted { .. } => {}
            GameEvent::WaveCleared { .. } => self.screen.level_transition(),
            GameEvent::AsteroidDestroyed { pos, size, .. } => {
                let scale = size.explosion_scale();
                self.vfx.explosion(pos, Color::ROCK, scale);
                self.screen.explosion(pos, screen_center(), scale);
            }
            GameEvent::BulletHit { pos } => self.vfx.bullet_impact(pos, Color::YELLOW),
            GameEvent::EnemyDestroyed { pos, kind, .. } => {
                self.vfx.explosion(pos, kind.color(), 1.2);
                self.screen.explosion(pos, screen_center(), 1.2);
            }
            GameEvent::PlayerHit { pos, .. } => {
                self.screen.hit();
                self.vfx.explosion(pos, Color::CYAN, 1.0);
                self.vfx.slow_motion(0.5, 0.4);
            }
            GameEvent::ShieldBlocked { pos } => self.vfx.bullet_impact(pos, Color::CYAN),
            GameEvent::ShieldActivated => self.screen.shield_activation(),
            GameEvent::PowerUpCollected { pos, .. } => self.vfx.point_flash(pos, Color::GREEN, 0.8, 0.25),
            GameEvent::PlayerFired { pos } => self.vfx.point_flash(pos, Color::YELLOW, 0.4, 0.05),
            GameEvent::PlayerThrust { pos, rotation } => self.vfx.thrust_trail(pos, rotation),
            GameEvent::ExtraLife { .. } => self.vfx.screen_flash(Color::GREEN, 0.3, 0.3),
            GameEvent::GameOver { .. } => {
                self.screen.game_over();
                self.vfx.slow_motion(0.3, 1.5);
            }
        }
    }

    /// Draw one frame: world under the combined camera, then particles and
    /// flashes, then the screen overlay
    pub fn render(&self, renderer: &mut dyn Renderer) {
        renderer.begin_frame();
        let camera = self.screen.camera_transform().translated(self.vfx.camera_offset());
        renderer.set_camera(camera);

        renderer.render_grid(self.settings.grid_visible, Color::GRID);
        for asteroid in &self.state.asteroids {
            asteroid.render(renderer);
        }
        for powerup in &self.state.powerups {
            powerup.render(renderer);
        }
        for bullet in &self.state.bullets {
            bullet.render(renderer);
        }
        for enemy in &self.state.enemies {
            enemy.render(renderer);
        }
        self.state.player.render(renderer);

        self.vfx.render(renderer);
        self.screen.render(renderer);
        renderer.end_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{DrawCall, RecordingRenderer};
    use crate::sim::AsteroidSize;
    use glam::Vec2;

    fn game() -> Game {
        Game::new(42, Settings::default())
    }

    #[test]
    fn test_new_game_draws_first_wave() {
        let game = game();
        let mut renderer = RecordingRenderer::new();
        assert!(renderer.initialize());
        game.render(&mut renderer);

        let calls = renderer.calls();
        assert!(matches!(calls.first(), Some(DrawCall::Grid { enabled: true, .. })));
        assert_eq!(
            renderer.count(|c| matches!(c, DrawCall::Asteroid { .. })),
            INITIAL_WAVE_ASTEROID_COUNT as usize
        );
        assert_eq!(renderer.count(|c| matches!(c, DrawCall::Player { .. })), 1);
        assert_eq!(renderer.frames(), 1);
    }

    #[test]
    fn test_player_drawn_after_world() {
        let game = game();
        let mut renderer = RecordingRenderer::new();
        game.render(&mut renderer);
        let calls = renderer.calls();
        let player = calls.iter().position(|c| matches!(c, DrawCall::Player { .. }));
        let last_rock = calls.iter().rposition(|c| matches!(c, DrawCall::Asteroid { .. }));
        assert!(player > last_rock);
    }

    #[test]
    fn test_asteroid_destroyed_triggers_effects() {
        let mut game = game();
        game.state.events.push(GameEvent::AsteroidDestroyed {
            pos: Vec2::new(100.0, 100.0),
            size: AsteroidSize::Large,
            score: 20,
        });
        game.handle_events();
        assert!(game.screen.active_count() >= 2);
        assert!(game.vfx.active_particles() > 0);
        assert!(game.vfx.shake_count() > 0);
    }

    #[test]
    fn test_reduced_motion_suppresses_screen_effects() {
        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        let mut game = Game::new(1, settings);
        game.state.events.push(GameEvent::PlayerHit {
            pos: Vec2::new(400.0, 300.0),
            lives_left: 2,
        });
        game.handle_events();
        assert_eq!(game.screen.active_count(), 0);
        assert_eq!(game.vfx.shake_count(), 0);
        // Debris particles are not motion effects
        assert!(game.vfx.active_particles() > 0);
    }

    #[test]
    fn test_game_over_slows_time() {
        let mut game = game();
        game.state.events.push(GameEvent::GameOver { score: 0, wave: 1 });
        game.handle_events();
        assert!(game.vfx.time_scale() < 1.0);
        assert!(game.screen.active_count() > 0);
    }

    #[test]
    fn test_long_frame_is_capped() {
        let mut game = game();
        game.update(5.0);
        assert!(game.state.frame <= MAX_SUBSTEPS as u64);
        game.update(f32::NAN);
        game.update(-1.0);
        assert!(game.state.frame <= MAX_SUBSTEPS as u64);
    }

    #[test]
    fn test_one_shot_pause_cleared() {
        let mut game = game();
        game.input.pause = true;
        game.update(SIM_DT * 3.0);
        assert_eq!(game.phase(), GamePhase::Paused);
        assert!(!game.input.pause);
    }

    #[test]
    fn test_camera_combines_screen_and_vfx_offsets() {
        let mut game = game();
        game.screen.shake(8.0, 1.0);
        game.vfx.add_shake(5.0, 1.0);
        game.update(SIM_DT);

        let mut renderer = RecordingRenderer::new();
        game.render(&mut renderer);
        let expected = game.screen.camera_transform().translated(game.vfx.camera_offset());
        assert_eq!(renderer.camera(), expected);
    }

    #[test]
    fn test_step_is_deterministic() {
        let run = || {
            let mut game = Game::new(9, Settings::default());
            let input = TickInput {
                idle_mode: true,
                ..TickInput::default()
            };
            for _ in 0..900 {
                game.step(&input);
            }
            (
                game.state.score,
                game.state.player.body.pos,
                game.vfx.active_particles(),
            )
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_step_matches_update_under_slow_motion() {
        let mut stepped = game();
        let mut updated = game();
        stepped.vfx.slow_motion(0.5, 10.0);
        updated.vfx.slow_motion(0.5, 10.0);
        for _ in 0..10 {
            stepped.step(&TickInput::default());
            updated.update(SIM_DT);
        }
        assert_eq!(stepped.state.frame, updated.state.frame);
        assert!((4..=6).contains(&stepped.state.frame));
        assert!((stepped.state.time - stepped.state.frame as f32 * SIM_DT).abs() < 1e-5);
    }

    #[test]
    fn test_restart_resets_ids_and_score() {
        let mut game = game();
        game.state.score = 1234;
        game.restart(42);
        assert_eq!(game.state.score, 0);
        assert_eq!(game.state.player.body.id.0, 1);
        assert_eq!(game.state.wave, 1);
    }

    #[test]
    fn test_enabling_reduced_motion_clears_screen_effects() {
        let mut game = game();
        game.screen.game_over();
        assert!(game.screen.active_count() > 0);
        game.set_settings(Settings {
            reduced_motion: true,
            ..Settings::default()
        });
        assert_eq!(game.screen.active_count(), 0);
        game.screen.hit();
        assert_eq!(game.screen.active_count(), 0);
    }

    #[test]
    fn test_grid_toggle() {
        let mut game = game();
        game.set_settings(Settings {
            grid_visible: false,
            ..Settings::default()
        });
        let mut renderer = RecordingRenderer::new();
        game.render(&mut renderer);
        assert!(matches!(renderer.calls().first(), Some(DrawCall::Grid { enabled: false, .. })));
    }
}
