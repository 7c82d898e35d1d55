//! 2D geometry values

use crate::math::lerp_f32;
use std::ops::{Add, Mul, Neg, Sub};

/// 2D offset (translation, position delta)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

impl Offset {
    pub const ZERO: Offset = Offset { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn scale(&self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Interpolate each axis independently
    pub fn lerp(self, other: Offset, t: f32) -> Self {
        Self::new(lerp_f32(self.x, other.x, t), lerp_f32(self.y, other.y, t))
    }
}

impl Add for Offset {
    type Output = Offset;

    fn add(self, rhs: Offset) -> Offset {
        Offset::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Offset {
    type Output = Offset;

    fn sub(self, rhs: Offset) -> Offset {
        Offset::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Offset {
    type Output = Offset;

    fn mul(self, rhs: f32) -> Offset {
        self.scale(rhs)
    }
}

impl Neg for Offset {
    type Output = Offset;

    fn neg(self) -> Offset {
        Offset::new(-self.x, -self.y)
    }
}

impl From<(f32, f32)> for Offset {
    fn from((x, y): (f32, f32)) -> Self {
        Offset::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_lerp_per_axis() {
        let a = Offset::new(0.0, 100.0);
        let b = Offset::new(10.0, 0.0);
        let mid = a.lerp(b, 0.25);

        assert!((mid.x - 2.5).abs() < 1e-6);
        assert!((mid.y - 75.0).abs() < 1e-6);
    }

    #[test]
    fn test_offset_arithmetic() {
        let a = Offset::new(3.0, 4.0);
        assert_eq!(a.distance(), 5.0);
        assert_eq!(a + Offset::new(1.0, 1.0), Offset::new(4.0, 5.0));
        assert_eq!(a - a, Offset::ZERO);
        assert_eq!(-a * 2.0, Offset::new(-6.0, -8.0));
    }
}
