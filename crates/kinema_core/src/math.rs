//! Scalar interpolation helpers
//!
//! The naive `a + (b - a) * t` is not exact at `t == 1.0` for every pair of
//! floats, and `a * (1 - t) + b * t` is not exact when `a == b`. These helpers
//! use the first form and special-case `t == 1.0`, so `lerp(a, b, 0) == a`,
//! `lerp(a, b, 1) == b` and `lerp(a, a, t) == a` all hold bit for bit.
//! Values of `t` outside `[0, 1]` extrapolate.

/// Exact linear interpolation for `f32`
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    if t == 1.0 {
        b
    } else {
        a + (b - a) * t
    }
}

/// Exact linear interpolation for `f64`
#[inline]
pub fn lerp_f64(a: f64, b: f64, t: f64) -> f64 {
    if t == 1.0 {
        b
    } else {
        a + (b - a) * t
    }
}
