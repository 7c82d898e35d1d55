//! Color values
//!
//! Two representations are supported: [`Color`] stores linear float channels
//! in `0.0..=1.0` and [`Rgba8`] stores byte channels in `0..=255`. Interpolation
//! is per channel in the native range, with no gamma correction, and results
//! are clamped to the legal range afterwards.

use crate::math::lerp_f32;

/// RGBA color (linear space, channels in 0.0..=1.0)
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_hex(hex: u32) -> Self {
        Rgba8::from_hex(hex).into()
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha;
        self
    }

    /// Clamp every channel into 0.0..=1.0
    pub fn clamped(self) -> Self {
        Self::rgba(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
            self.a.clamp(0.0, 1.0),
        )
    }

    /// Per-channel interpolation, clamped to the legal range
    pub fn lerp(self, other: Color, t: f32) -> Self {
        Self::rgba(
            lerp_f32(self.r, other.r, t),
            lerp_f32(self.g, other.g, t),
            lerp_f32(self.b, other.b, t),
            lerp_f32(self.a, other.a, t),
        )
        .clamped()
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// RGBA color with 8-bit channels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// `0xRRGGBB`, fully opaque
    pub const fn from_hex(hex: u32) -> Self {
        Self::opaque(
            ((hex >> 16) & 0xFF) as u8,
            ((hex >> 8) & 0xFF) as u8,
            (hex & 0xFF) as u8,
        )
    }

    /// Per-channel interpolation in the byte range, rounded and clamped
    pub fn lerp(self, other: Rgba8, t: f32) -> Self {
        Self::new(
            lerp_byte(self.r, other.r, t),
            lerp_byte(self.g, other.g, t),
            lerp_byte(self.b, other.b, t),
            lerp_byte(self.a, other.a, t),
        )
    }
}

fn lerp_byte(a: u8, b: u8, t: f32) -> u8 {
    lerp_f32(a as f32, b as f32, t).round().clamp(0.0, 255.0) as u8
}

impl From<Rgba8> for Color {
    fn from(c: Rgba8) -> Self {
        Color::rgba(
            c.r as f32 / 255.0,
            c.g as f32 / 255.0,
            c.b as f32 / 255.0,
            c.a as f32 / 255.0,
        )
    }
}

impl From<Color> for Rgba8 {
    fn from(c: Color) -> Self {
        let c = c.clamped();
        Rgba8::new(
            (c.r * 255.0).round() as u8,
            (c.g * 255.0).round() as u8,
            (c.b * 255.0).round() as u8,
            (c.a * 255.0).round() as u8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_lerp_midpoint() {
        let mid = Color::BLACK.lerp(Color::WHITE, 0.5);
        assert!((mid.r - 0.5).abs() < 1e-6);
        assert!((mid.g - 0.5).abs() < 1e-6);
        assert!((mid.b - 0.5).abs() < 1e-6);
        assert_eq!(mid.a, 1.0);
    }

    #[test]
    fn test_color_overshoot_is_clamped() {
        let over = Color::rgb(0.2, 0.4, 0.6).lerp(Color::rgb(1.0, 0.0, 1.0), 1.4);
        assert_eq!(over.r, 1.0);
        assert_eq!(over.g, 0.0);
        assert_eq!(over.b, 1.0);

        let under = Color::rgb(0.2, 0.4, 0.6).lerp(Color::rgb(1.0, 0.0, 1.0), -0.5);
        assert_eq!(under.r, 0.0);
        assert!((under.g - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_rgba8_lerp_rounds_and_clamps() {
        let a = Rgba8::opaque(0, 100, 255);
        let b = Rgba8::opaque(255, 101, 0);

        assert_eq!(a.lerp(b, 0.5), Rgba8::opaque(128, 101, 128));
        assert_eq!(a.lerp(b, 2.0), Rgba8::opaque(255, 102, 0));
        assert_eq!(a.lerp(b, -1.0), Rgba8::opaque(0, 99, 255));
    }

    #[test]
    fn test_hex_conversion() {
        let c = Rgba8::from_hex(0x3366FF);
        assert_eq!(c, Rgba8::opaque(0x33, 0x66, 0xFF));
        assert_eq!(Rgba8::from(Color::from_hex(0x3366FF)), c);
    }
}
