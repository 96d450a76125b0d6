//! Renderer contract
//!
//! The core never touches GPU state. Entities and effects describe themselves
//! to a [`Renderer`] using primitive values only (position, rotation, color,
//! size, type tag); concrete 2D/3D backends live outside this crate.

pub mod recording;

pub use recording::{DrawCall, RecordingRenderer};

use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::sim::{EnemyKind, PowerUpKind};

/// Which kind of backend is drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderMode {
    #[default]
    TwoD,
    ThreeD,
}

/// Per-frame statistics reported by a backend
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderStats {
    /// Objects submitted this frame
    pub total: u32,
    /// Objects actually drawn
    pub rendered: u32,
    /// Objects rejected by frustum culling
    pub culled: u32,
    pub frame_time_ms: f32,
    pub mode: RenderMode,
}

/// Camera transform for a frame: scale by `zoom`, then translate by `offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransform {
    pub zoom: f32,
    pub offset: Vec2,
}

impl Default for CameraTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl CameraTransform {
    pub const IDENTITY: CameraTransform = CameraTransform {
        zoom: 1.0,
        offset: Vec2::ZERO,
    };

    pub fn new(zoom: f32, offset: Vec2) -> Self {
        Self { zoom, offset }
    }

    /// Transform a world point into camera space
    #[inline]
    pub fn apply(&self, point: Vec2) -> Vec2 {
        point * self.zoom + self.offset
    }

    pub fn to_affine(&self) -> Affine2 {
        Affine2::from_translation(self.offset) * Affine2::from_scale(Vec2::splat(self.zoom))
    }

    /// Add an extra offset on top of this transform
    pub fn translated(self, extra: Vec2) -> Self {
        Self {
            offset: self.offset + extra,
            ..self
        }
    }
}

/// Backend contract. All methods take primitive data; implementations own
/// every bit of renderer-internal state.
pub trait Renderer {
    /// Prepare the backend. Returns false if it cannot draw.
    fn initialize(&mut self) -> bool;
    fn begin_frame(&mut self);
    fn end_frame(&mut self);

    /// Camera for everything drawn after this call in the current frame
    fn set_camera(&mut self, camera: CameraTransform);

    fn render_player(
        &mut self,
        pos: Vec2,
        rotation: f32,
        color: Color,
        shield_active: bool,
        shield_alpha: f32,
    );
    fn render_asteroid(&mut self, pos: Vec2, radius: f32, color: Color, seed: u32, lod_level: u8);
    fn render_bullet(&mut self, pos: Vec2, color: Color);
    fn render_explosion(&mut self, pos: Vec2, intensity: f32, color: Color);
    fn render_enemy(
        &mut self,
        pos: Vec2,
        rotation: f32,
        kind: EnemyKind,
        color: Color,
        size: f32,
        health_pct: f32,
    );
    fn render_power_up(&mut self, pos: Vec2, kind: PowerUpKind, pulse_scale: f32, rotation: f32);
    fn render_grid(&mut self, enabled: bool, color: Color);
    fn render_particle(&mut self, pos: Vec2, color: Color, size: f32);
    /// Full-screen rectangle in screen space (ignores the camera)
    fn render_overlay(&mut self, color: Color);

    fn is_in_view_frustum(&self, pos: Vec2, radius: f32) -> bool;
    fn render_stats(&self) -> RenderStats;
    fn cleanup(&mut self);
}
