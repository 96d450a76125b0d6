//! Astro Blast headless runner
//!
//! Plays an autopilot demo against the recording renderer and logs what
//! happened. Usage: `astro-blast [seed] [seconds] [difficulty]`

use astro_blast::renderer::{DrawCall, RecordingRenderer, Renderer};
use astro_blast::sim::{GamePhase, TickInput};
use astro_blast::{Difficulty, Game, Settings};

const DEFAULT_SEED: u64 = 0xA57E_801D;
const DEFAULT_SECONDS: u32 = 60;
/// Simulated display refresh rate
const FRAME_DT: f32 = 1.0 / 60.0;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SEED);
    let seconds: u32 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SECONDS);
    let difficulty = args
        .next()
        .and_then(|s| Difficulty::from_str(&s))
        .unwrap_or_default();

    log::info!("Astro Blast (headless) starting...");

    let mut renderer = RecordingRenderer::new();
    if !renderer.initialize() {
        log::error!("Renderer failed to initialize");
        std::process::exit(1);
    }

    let mut game = Game::new(seed, Settings::with_difficulty(difficulty));
    game.input = TickInput {
        idle_mode: true,
        ..TickInput::default()
    };

    let frames = seconds * 60;
    let mut peak_particles = 0;
    for frame in 0..frames {
        game.frame(FRAME_DT, &mut renderer);
        peak_particles = peak_particles.max(game.vfx.active_particles());

        if frame % 600 == 0 {
            let stats = renderer.render_stats();
            log::debug!(
                "frame {}: {} visible ({} culled), {} particles",
                frame,
                stats.rendered,
                stats.culled,
                game.vfx.active_particles()
            );
        }
        if game.phase() == GamePhase::GameOver && game.vfx.time_scale() >= 1.0 {
            break;
        }
    }

    let state = &game.state;
    let rocks = renderer.count(|c| matches!(c, DrawCall::Asteroid { .. }));
    log::info!(
        "Finished after {:.1}s simulated: wave {} ({} hostiles left), score {}, lives {}, {:?}",
        state.time,
        state.wave,
        state.hostile_count(),
        state.score,
        state.lives,
        state.phase
    );
    log::info!(
        "Effects: peak {} particles, {} dropped; last frame drew {} asteroids",
        peak_particles,
        game.vfx.dropped_particles(),
        rocks
    );

    renderer.cleanup();
}
