//! Screen effects engine
//!
//! Folds every active [`TimedEffect`] into one camera transform and one
//! overlay color per frame. Effects remove themselves when they expire.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::easing::Easing;
use super::{frame_dt, jitter};
use super::timed::{EffectKind, TimedEffect};
use crate::color::Color;
use crate::consts::{WORLD_HEIGHT, WORLD_WIDTH};
use crate::renderer::{CameraTransform, Renderer};
use crate::settings::Settings;

pub struct ScreenEffects<R: Rng = Pcg32> {
    effects: Vec<TimedEffect>,
    rng: R,
    /// Seconds since creation, drives Pulse/Distortion oscillation
    time: f32,
    allow_motion: bool,
    allow_flashes: bool,

    // Per-frame accumulators
    shake_offset: Vec2,
    zoom: f32,
    overlay: Color,
    /// Unrounded overlay alpha (0-255)
    overlay_alpha: f32,
}

impl ScreenEffects<Pcg32> {
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(Pcg32::seed_from_u64(seed))
    }
}

impl<R: Rng> ScreenEffects<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            effects: Vec::new(),
            rng,
            time: 0.0,
            allow_motion: true,
            allow_flashes: true,
            shake_offset: Vec2::ZERO,
            zoom: 1.0,
            overlay: Color::TRANSPARENT,
            overlay_alpha: 0.0,
        }
    }

    /// Honour the shake/flash toggles. Disallowed kinds are dropped on `add`.
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.allow_motion = settings.effective_screen_shake();
        self.allow_flashes = settings.effective_flashes();
    }

    fn allows(&self, kind: EffectKind) -> bool {
        match kind {
            EffectKind::Flash | EffectKind::Fade => self.allow_flashes,
            EffectKind::Shake | EffectKind::Pulse | EffectKind::Zoom | EffectKind::Distortion => {
                self.allow_motion
            }
        }
    }

    /// Queue an effect. Expired or disallowed effects are dropped.
    pub fn add(&mut self, effect: TimedEffect) {
        if effect.is_active() && self.allows(effect.kind) {
            self.effects.push(effect);
        }
    }

    pub fn clear(&mut self) {
        self.effects.clear();
        self.reset_accumulators();
    }

    pub fn active_count(&self) -> usize {
        self.effects.len()
    }

    pub fn effects(&self) -> &[TimedEffect] {
        &self.effects
    }

    fn reset_accumulators(&mut self) {
        self.shake_offset = Vec2::ZERO;
        self.zoom = 1.0;
        self.overlay = Color::TRANSPARENT;
        self.overlay_alpha = 0.0;
    }

    /// Advance all effects by `dt` and rebuild the frame accumulators
    pub fn update(&mut self, dt: f32) {
        let dt = frame_dt(dt);
        self.time += dt;
        self.reset_accumulators();

        let Self {
            effects,
            rng,
            time,
            shake_offset,
            zoom,
            overlay,
            overlay_alpha,
            ..
        } = self;
        let time = *time;

        effects.retain_mut(|effect| {
            if !effect.tick(dt) {
                return false;
            }
            let intensity = effect.current_intensity();
            match effect.kind {
                EffectKind::Shake => {
                    *shake_offset += Vec2::new(jitter(rng, intensity), jitter(rng, intensity));
                }
                EffectKind::Flash | EffectKind::Fade => {
                    let alpha = 255.0 * intensity;
                    let candidate = effect.color.with_intensity(intensity);
                    // Equal strength: the brighter color wins, whatever the order
                    let tie_wins = alpha == *overlay_alpha
                        && alpha > 0.0
                        && (candidate.r, candidate.g, candidate.b) > (overlay.r, overlay.g, overlay.b);
                    if alpha > *overlay_alpha || tie_wins {
                        *overlay_alpha = alpha;
                        *overlay = candidate;
                    }
                }
                EffectKind::Pulse => {
                    *zoom *= 0.95 + 0.05 * intensity * (time * 8.0).sin();
                }
                EffectKind::Zoom => {
                    *zoom += intensity * 0.1;
                }
                EffectKind::Distortion => {
                    shake_offset.x += (time * 10.0).sin() * intensity * 2.0;
                }
            }
            true
        });
    }

    pub fn shake_offset(&self) -> Vec2 {
        self.shake_offset
    }

    pub fn zoom_level(&self) -> f32 {
        self.zoom
    }

    pub fn overlay_color(&self) -> Color {
        self.overlay
    }

    /// Overlay alpha before rounding to a byte
    pub fn overlay_alpha(&self) -> f32 {
        self.overlay_alpha
    }

    /// Scale by zoom, then translate by shake
    pub fn camera_transform(&self) -> CameraTransform {
        CameraTransform::new(self.zoom, self.shake_offset)
    }

    /// Full-screen overlay rectangle; nothing is drawn when fully transparent
    pub fn render(&self, renderer: &mut dyn Renderer) {
        if !self.overlay.is_transparent() {
            renderer.render_overlay(self.overlay);
        }
    }

    // === Named recipes ===

    pub fn shake(&mut self, intensity: f32, duration: f32) {
        self.add(TimedEffect::shake(intensity, duration, Easing::QuadOut));
    }

    pub fn flash(&mut self, color: Color, intensity: f32, duration: f32) {
        self.add(TimedEffect::flash(color, intensity, duration, Easing::Linear));
    }

    pub fn distortion(&mut self, intensity: f32, duration: f32) {
        self.add(TimedEffect::new(
            EffectKind::Distortion,
            intensity,
            duration,
            Color::TRANSPARENT,
            Easing::Linear,
        ));
    }

    /// Player took a hit
    pub fn hit(&mut self) {
        self.add(TimedEffect::shake(6.0, 0.25, Easing::QuadOut));
        self.add(TimedEffect::flash(Color::RED, 0.35, 0.12, Easing::Linear));
    }

    /// Explosion at `pos`, weaker the farther it is from `center`
    pub fn explosion(&mut self, pos: Vec2, center: Vec2, scale: f32) {
        let reach = Vec2::new(WORLD_WIDTH, WORLD_HEIGHT).length() * 0.75;
        let falloff = if reach > 0.0 {
            (1.0 - pos.distance(center) / reach).clamp(0.2, 1.0)
        } else {
            1.0
        };
        self.add(TimedEffect::shake(10.0 * scale * falloff, 0.4, Easing::QuadOut));
        self.add(TimedEffect::flash(Color::ORANGE, 0.25 * falloff, 0.15, Easing::Linear));
    }

    pub fn shield_activation(&mut self) {
        self.add(TimedEffect::new(
            EffectKind::Pulse,
            1.0,
            0.6,
            Color::TRANSPARENT,
            Easing::Linear,
        ));
        self.add(TimedEffect::flash(Color::CYAN, 0.2, 0.2, Easing::QuadOut));
    }

    pub fn level_transition(&mut self) {
        self.add(TimedEffect::new(
            EffectKind::Zoom,
            1.0,
            1.2,
            Color::TRANSPARENT,
            Easing::SmoothStep,
        ));
        self.add(TimedEffect::fade(Color::WHITE, 0.6, 1.0, Easing::SmoothStep));
    }

    pub fn game_over(&mut self) {
        self.add(TimedEffect::fade(Color::DARK_RED, 0.7, 2.5, Easing::Constant));
        self.add(TimedEffect::shake(12.0, 0.8, Easing::CubicOut));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{DrawCall, RecordingRenderer};
    use proptest::prelude::*;

    fn engine() -> ScreenEffects {
        ScreenEffects::with_seed(7)
    }

    #[test]
    fn test_update_resets_accumulators() {
        let mut fx = engine();
        fx.update(0.016);
        assert_eq!(fx.shake_offset(), Vec2::ZERO);
        assert_eq!(fx.zoom_level(), 1.0);
        assert!(fx.overlay_color().is_transparent());
    }

    #[test]
    fn test_shake_stays_within_intensity() {
        let mut fx = engine();
        fx.add(TimedEffect::shake(5.0, 1.0, Easing::Constant));
        for _ in 0..30 {
            fx.update(0.016);
            let offset = fx.shake_offset();
            assert!(offset.x.abs() <= 5.0 && offset.y.abs() <= 5.0);
        }
    }

    #[test]
    fn test_strongest_flash_wins() {
        let mut fx = engine();
        fx.add(TimedEffect::flash(Color::RED, 0.3, 1.0, Easing::Constant));
        fx.add(TimedEffect::flash(Color::WHITE, 0.7, 1.0, Easing::Constant));
        fx.update(0.01);
        assert!((fx.overlay_alpha() - 0.7 * 255.0).abs() < 1e-3);
        assert_eq!(fx.overlay_color().r, 255);
        assert_eq!(fx.overlay_color().g, 255);
    }

    #[test]
    fn test_equal_flashes_pick_same_color_in_any_order() {
        let mut a = engine();
        a.add(TimedEffect::flash(Color::RED, 0.5, 1.0, Easing::Constant));
        a.add(TimedEffect::flash(Color::CYAN, 0.5, 1.0, Easing::Constant));
        let mut b = engine();
        b.add(TimedEffect::flash(Color::CYAN, 0.5, 1.0, Easing::Constant));
        b.add(TimedEffect::flash(Color::RED, 0.5, 1.0, Easing::Constant));
        a.update(0.01);
        b.update(0.01);
        assert_eq!(a.overlay_color(), b.overlay_color());
        assert_eq!(a.overlay_color().r, Color::RED.r);
    }

    #[test]
    fn test_bad_step_does_not_stall_effects() {
        let mut fx = engine();
        fx.shake(5.0, 0.2);
        fx.update(f32::NAN);
        fx.update(-1.0);
        assert_eq!(fx.active_count(), 1);
        assert!(fx.shake_offset().is_finite());
        for _ in 0..20 {
            fx.update(1.0 / 60.0);
        }
        assert_eq!(fx.active_count(), 0);
    }

    #[test]
    fn test_zoom_and_distortion() {
        let mut fx = engine();
        fx.add(TimedEffect::new(
            EffectKind::Zoom,
            2.0,
            1.0,
            Color::TRANSPARENT,
            Easing::Constant,
        ));
        fx.update(0.1);
        assert!((fx.zoom_level() - 1.2).abs() < 1e-5);

        let mut fx = engine();
        fx.distortion(1.0, 1.0);
        fx.update(0.1);
        // Linear easing at progress 0.1 -> intensity 0.9; time = 0.1
        let expected = (0.1f32 * 10.0).sin() * 0.9 * 2.0;
        assert!((fx.shake_offset().x - expected).abs() < 1e-4);
        assert_eq!(fx.shake_offset().y, 0.0);
    }

    #[test]
    fn test_pulse_multiplies_zoom() {
        let mut fx = engine();
        fx.add(TimedEffect::new(
            EffectKind::Pulse,
            1.0,
            1.0,
            Color::TRANSPARENT,
            Easing::Constant,
        ));
        fx.update(0.2);
        let expected = 0.95 + 0.05 * (0.2f32 * 8.0).sin();
        assert!((fx.zoom_level() - expected).abs() < 1e-5);
    }

    #[test]
    fn test_effects_expire_and_are_removed() {
        let mut fx = engine();
        fx.hit();
        assert_eq!(fx.active_count(), 2);
        for _ in 0..30 {
            fx.update(1.0 / 60.0);
        }
        assert_eq!(fx.active_count(), 0);
        assert_eq!(fx.shake_offset(), Vec2::ZERO);
        assert!(fx.overlay_color().is_transparent());
    }

    #[test]
    fn test_zero_duration_effect_is_skipped() {
        let mut fx = engine();
        fx.shake(5.0, 0.0);
        assert_eq!(fx.active_count(), 0);
        fx.update(0.016);
        assert_eq!(fx.shake_offset(), Vec2::ZERO);
    }

    #[test]
    fn test_explosion_falloff_with_distance() {
        let center = Vec2::new(400.0, 300.0);
        let mut near = engine();
        near.explosion(center, center, 1.0);
        let mut far = engine();
        far.explosion(Vec2::new(-2000.0, -2000.0), center, 1.0);

        let near_shake = near.effects()[0].intensity;
        let far_shake = far.effects()[0].intensity;
        assert!((near_shake - 10.0).abs() < 1e-5);
        // Clamped to the minimum falloff
        assert!((far_shake - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_reduced_motion_drops_shake() {
        let mut fx = engine();
        fx.apply_settings(&Settings {
            reduced_motion: true,
            ..Settings::default()
        });
        fx.game_over();
        fx.level_transition();
        assert_eq!(fx.active_count(), 0);
    }

    #[test]
    fn test_render_overlay_only_when_visible() {
        let mut renderer = RecordingRenderer::new();
        let mut fx = engine();
        renderer.begin_frame();
        fx.update(0.016);
        fx.render(&mut renderer);
        assert!(renderer.calls().is_empty());

        fx.flash(Color::WHITE, 1.0, 0.5);
        fx.update(0.016);
        fx.render(&mut renderer);
        assert!(matches!(renderer.calls(), [DrawCall::Overlay { .. }]));
    }

    #[test]
    fn test_camera_transform_combines_zoom_and_shake() {
        let mut fx = engine();
        fx.add(TimedEffect::new(
            EffectKind::Zoom,
            1.0,
            1.0,
            Color::TRANSPARENT,
            Easing::Constant,
        ));
        fx.update(0.1);
        let camera = fx.camera_transform();
        assert!((camera.zoom - 1.1).abs() < 1e-5);
        assert_eq!(camera.offset, fx.shake_offset());
    }

    proptest! {
        #[test]
        fn prop_flash_order_independent(
            intensities in proptest::collection::vec(0.0f32..1.0, 1..8),
        ) {
            let mut forward = engine();
            let mut backward = engine();
            for &i in &intensities {
                forward.add(TimedEffect::flash(Color::WHITE, i, 1.0, Easing::Constant));
            }
            for &i in intensities.iter().rev() {
                backward.add(TimedEffect::flash(Color::WHITE, i, 1.0, Easing::Constant));
            }
            forward.update(0.1);
            backward.update(0.1);

            let max = intensities.iter().cloned().fold(0.0f32, f32::max);
            prop_assert!((forward.overlay_alpha() - max * 255.0).abs() < 1e-3);
            prop_assert_eq!(forward.overlay_alpha(), backward.overlay_alpha());
        }
    }
}
