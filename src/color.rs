//! RGBA8 color value passed to the renderer contract

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 40, 40);
    pub const DARK_RED: Color = Color::rgb(180, 0, 0);
    pub const ORANGE: Color = Color::rgb(255, 160, 40);
    pub const YELLOW: Color = Color::rgb(255, 230, 90);
    pub const CYAN: Color = Color::rgb(80, 200, 255);
    pub const GREEN: Color = Color::rgb(90, 255, 120);
    pub const ROCK: Color = Color::rgb(170, 160, 150);
    pub const GRID: Color = Color::rgba(40, 60, 90, 90);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with a new alpha
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Alpha from a 0-1 intensity (`255 * intensity`, clamped)
    pub fn with_intensity(self, intensity: f32) -> Self {
        self.with_alpha((255.0 * intensity.clamp(0.0, 1.0)).round() as u8)
    }

    /// Linear blend toward `other` (t = 0 → self, t = 1 → other)
    pub fn lerp(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_intensity() {
        assert_eq!(Color::RED.with_intensity(1.0).a, 255);
        assert_eq!(Color::RED.with_intensity(0.0).a, 0);
        assert_eq!(Color::RED.with_intensity(2.0).a, 255);
        assert_eq!(Color::RED.with_intensity(0.2).a, 51);
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = Color::rgb(0, 0, 0);
        let b = Color::rgb(200, 100, 50);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Color::rgb(100, 50, 25));
    }
}
