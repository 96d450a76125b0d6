//! Headless renderer that records draw calls
//!
//! Used by the native demo binary and by tests. Frustum queries are answered
//! against the playfield rectangle and counted into [`RenderStats`].

use std::cell::Cell;
use std::time::Instant;

use glam::Vec2;

use super::{CameraTransform, RenderMode, RenderStats, Renderer};
use crate::color::Color;
use crate::consts::{WORLD_HEIGHT, WORLD_WIDTH};
use crate::sim::{EnemyKind, PowerUpKind};

/// One recorded draw command
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Player {
        pos: Vec2,
        rotation: f32,
        color: Color,
        shield_active: bool,
        shield_alpha: f32,
    },
    Asteroid {
        pos: Vec2,
        radius: f32,
        color: Color,
        seed: u32,
        lod_level: u8,
    },
    Bullet {
        pos: Vec2,
        color: Color,
    },
    Explosion {
        pos: Vec2,
        intensity: f32,
        color: Color,
    },
    Enemy {
        pos: Vec2,
        rotation: f32,
        kind: EnemyKind,
        color: Color,
        size: f32,
        health_pct: f32,
    },
    PowerUp {
        pos: Vec2,
        kind: PowerUpKind,
        pulse_scale: f32,
        rotation: f32,
    },
    Grid {
        enabled: bool,
        color: Color,
    },
    Particle {
        pos: Vec2,
        color: Color,
        size: f32,
    },
    Overlay {
        color: Color,
    },
}

/// Renderer that keeps the current frame's draw list in memory
pub struct RecordingRenderer {
    initialized: bool,
    camera: CameraTransform,
    calls: Vec<DrawCall>,
    frames: u64,
    frame_start: Option<Instant>,
    stats: RenderStats,
    /// Frustum queries this frame (interior mutability: queries take `&self`)
    queries: Cell<u32>,
    culled: Cell<u32>,
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self {
            initialized: false,
            camera: CameraTransform::IDENTITY,
            calls: Vec::new(),
            frames: 0,
            frame_start: None,
            stats: RenderStats::default(),
            queries: Cell::new(0),
            culled: Cell::new(0),
        }
    }

    /// Draw calls recorded since the last `begin_frame`
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Camera set for the current frame
    pub fn camera(&self) -> CameraTransform {
        self.camera
    }

    /// Completed frames
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn count(&self, pred: impl Fn(&DrawCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    fn record(&mut self, call: DrawCall) {
        self.calls.push(call);
    }
}

impl Renderer for RecordingRenderer {
    fn initialize(&mut self) -> bool {
        self.initialized = true;
        log::info!("Recording renderer initialized ({}x{})", WORLD_WIDTH, WORLD_HEIGHT);
        true
    }

    fn begin_frame(&mut self) {
        self.calls.clear();
        self.camera = CameraTransform::IDENTITY;
        self.queries.set(0);
        self.culled.set(0);
        self.frame_start = Some(Instant::now());
    }

    fn end_frame(&mut self) {
        let frame_time_ms = self
            .frame_start
            .take()
            .map(|start| start.elapsed().as_secs_f32() * 1000.0)
            .unwrap_or(0.0);
        let culled = self.culled.get();
        let total = self.queries.get();
        self.stats = RenderStats {
            total,
            rendered: total - culled,
            culled,
            frame_time_ms,
            mode: RenderMode::TwoD,
        };
        self.frames += 1;
    }

    fn set_camera(&mut self, camera: CameraTransform) {
        self.camera = camera;
    }

    fn render_player(
        &mut self,
        pos: Vec2,
        rotation: f32,
        color: Color,
        shield_active: bool,
        shield_alpha: f32,
    ) {
        self.record(DrawCall::Player {
            pos,
            rotation,
            color,
            shield_active,
            shield_alpha,
        });
    }

    fn render_asteroid(&mut self, pos: Vec2, radius: f32, color: Color, seed: u32, lod_level: u8) {
        self.record(DrawCall::Asteroid {
            pos,
            radius,
            color,
            seed,
            lod_level,
        });
    }

    fn render_bullet(&mut self, pos: Vec2, color: Color) {
        self.record(DrawCall::Bullet { pos, color });
    }

    fn render_explosion(&mut self, pos: Vec2, intensity: f32, color: Color) {
        self.record(DrawCall::Explosion {
            pos,
            intensity,
            color,
        });
    }

    fn render_enemy(
        &mut self,
        pos: Vec2,
        rotation: f32,
        kind: EnemyKind,
        color: Color,
        size: f32,
        health_pct: f32,
    ) {
        self.record(DrawCall::Enemy {
            pos,
            rotation,
            kind,
            color,
            size,
            health_pct,
        });
    }

    fn render_power_up(&mut self, pos: Vec2, kind: PowerUpKind, pulse_scale: f32, rotation: f32) {
        self.record(DrawCall::PowerUp {
            pos,
            kind,
            pulse_scale,
            rotation,
        });
    }

    fn render_grid(&mut self, enabled: bool, color: Color) {
        self.record(DrawCall::Grid { enabled, color });
    }

    fn render_particle(&mut self, pos: Vec2, color: Color, size: f32) {
        self.record(DrawCall::Particle { pos, color, size });
    }

    fn render_overlay(&mut self, color: Color) {
        self.record(DrawCall::Overlay { color });
    }

    fn is_in_view_frustum(&self, pos: Vec2, radius: f32) -> bool {
        self.queries.set(self.queries.get() + 1);
        let visible = pos.x + radius >= 0.0
            && pos.x - radius <= WORLD_WIDTH
            && pos.y + radius >= 0.0
            && pos.y - radius <= WORLD_HEIGHT;
        if !visible {
            self.culled.set(self.culled.get() + 1);
        }
        visible
    }

    fn render_stats(&self) -> RenderStats {
        self.stats
    }

    fn cleanup(&mut self) {
        self.calls.clear();
        self.initialized = false;
        log::info!("Recording renderer cleaned up after {} frames", self.frames);
    }
}
