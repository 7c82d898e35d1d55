//! Animatable value types
//!
//! Provides the [`Interpolate`] trait and its implementations for scalars,
//! 2D offsets, float and byte colors, and discrete (stepped) values.
//!
//! Every implementation satisfies, bit for bit:
//!
//! - `a.lerp(&b, 0.0) == a`
//! - `a.lerp(&b, 1.0) == b`
//! - `a.lerp(&a, t) == a`

use kinema_core::{lerp_f32, lerp_f64, Color, Offset, Rgba8};

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone {
    /// Interpolate between self and other by factor t
    ///
    /// `t` is usually in `[0, 1]` but overshooting curves may push it outside.
    fn lerp(&self, other: &Self, t: f32) -> Self;

    /// Check if two values are approximately equal (for settling detection)
    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool;
}

// ============================================================================
// Scalars
// ============================================================================

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        lerp_f32(*self, *other, t)
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self - other).abs() < epsilon
    }
}

impl Interpolate for f64 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        lerp_f64(*self, *other, t as f64)
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self - other).abs() < epsilon as f64
    }
}

// ============================================================================
// Offset
// ============================================================================

impl Interpolate for Offset {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Offset::lerp(*self, *other, t)
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }
}

// ============================================================================
// Colors
// ============================================================================

impl Interpolate for Color {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Color::lerp(*self, *other, t)
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.r - other.r).abs() < epsilon
            && (self.g - other.g).abs() < epsilon
            && (self.b - other.b).abs() < epsilon
            && (self.a - other.a).abs() < epsilon
    }
}

impl Interpolate for Rgba8 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Rgba8::lerp(*self, *other, t)
    }

    fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        let close = |a: u8, b: u8| (a as f32 - b as f32).abs() < epsilon.max(1.0);
        close(self.r, other.r) && close(self.g, other.g) && close(self.b, other.b) && close(self.a, other.a)
    }
}

// ============================================================================
// Discrete values
// ============================================================================

/// A value with no intermediate states
///
/// Holds `begin` until `t >= 1`, then switches to `end`. Used for toggle-like
/// properties (visibility, enum modes) that ride along with a timeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step<T>(pub T);

impl<T: Clone + PartialEq> Interpolate for Step<T> {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        if t >= 1.0 {
            other.clone()
        } else {
            self.clone()
        }
    }

    fn approx_eq(&self, other: &Self, _epsilon: f32) -> bool {
        self == other
    }
}

impl<T> From<T> for Step<T> {
    fn from(value: T) -> Self {
        Step(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [f32; 7] = [0.0, 0.1, 0.33, 0.5, 0.77, 0.999, 1.0];

    fn assert_lerp_identities<T: Interpolate + PartialEq + std::fmt::Debug>(a: T, b: T) {
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        for t in SAMPLES {
            assert_eq!(a.lerp(&a, t), a, "lerp(a, a, {t})");
        }
    }

    #[test]
    fn test_interpolation_identities() {
        assert_lerp_identities(0.1_f32, 0.7);
        assert_lerp_identities(-12.5_f64, 3.3);
        assert_lerp_identities(Offset::new(0.1, -4.0), Offset::new(99.9, 0.3));
        assert_lerp_identities(Color::rgba(0.1, 0.2, 0.3, 0.4), Color::rgba(0.9, 0.7, 0.0, 1.0));
        assert_lerp_identities(Rgba8::new(3, 200, 17, 255), Rgba8::new(250, 0, 90, 10));
        assert_lerp_identities(Step(false), Step(true));
    }

    #[test]
    fn test_float_interpolation() {
        assert!((0.0_f32.lerp(&1.0, 0.5) - 0.5).abs() < 1e-6);
        assert!((10.0_f32.lerp(&20.0, 0.25) - 12.5).abs() < 1e-6);
    }

    #[test]
    fn test_offset_interpolation() {
        let a = Offset::new(0.0, 0.0);
        let b = Offset::new(10.0, 20.0);
        let mid = Interpolate::lerp(&a, &b, 0.5);

        assert!(mid.approx_eq(&Offset::new(5.0, 10.0), 1e-6));
    }

    #[test]
    fn test_color_interpolation_clamps() {
        let c = Interpolate::lerp(&Color::BLACK, &Color::WHITE, 1.3);
        assert_eq!(c, Color::WHITE);

        let c = Interpolate::lerp(&Rgba8::opaque(0, 0, 0), &Rgba8::opaque(255, 255, 255), -0.2);
        assert_eq!(c, Rgba8::opaque(0, 0, 0));
    }

    #[test]
    fn test_step_has_no_intermediate_states() {
        let a = Step("hidden");
        let b = Step("visible");

        assert_eq!(a.lerp(&b, 0.5), a);
        assert_eq!(a.lerp(&b, 0.999), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        // overshooting curves past 1 still land on the end value
        assert_eq!(a.lerp(&b, 1.2), b);
    }
}
