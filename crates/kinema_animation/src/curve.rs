//! Curves (easing functions)
//!
//! A curve maps linear progress in `[0, 1]` to shaped progress. Every named
//! curve returns exactly `0.0` at `t <= 0` and exactly `1.0` at `t >= 1`;
//! elastic, back and bounce curves may leave `[0, 1]` in between.
//!
//! [`Curve::Interval`] is the primitive the composition engine uses for
//! staggering: it holds the wrapped curve's boundary value outside a window
//! and re-normalizes `t` inside it.

use std::f32::consts::PI;
use std::fmt;
use std::rc::Rc;

/// A user-supplied curve function
///
/// Boundary values are the caller's responsibility.
#[derive(Clone)]
pub struct CustomCurve(Rc<dyn Fn(f32) -> f32>);

impl CustomCurve {
    pub fn new<F: Fn(f32) -> f32 + 'static>(f: F) -> Self {
        Self(Rc::new(f))
    }

    fn call(&self, t: f32) -> f32 {
        (self.0)(t)
    }
}

impl fmt::Debug for CustomCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomCurve(..)")
    }
}

impl PartialEq for CustomCurve {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Curve (easing function) type
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Curve {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    /// Pulls back below 0 before snapping toward 1
    ElasticIn,
    /// Overshoots 1 and oscillates back
    ElasticOut,
    /// Overshoots 1 once
    BackOut,
    BounceIn,
    BounceOut,
    /// `n` discrete jumps
    Steps(u32),
    CubicBezier(f32, f32, f32, f32),
    /// Wrapped curve evaluated only inside `[start, end]`
    Interval {
        start: f32,
        end: f32,
        curve: Box<Curve>,
    },
    /// `1 - f(1 - t)`
    Flipped(Box<Curve>),
    Custom(CustomCurve),
}

impl Curve {
    /// Wrap a closure as a curve
    pub fn custom<F: Fn(f32) -> f32 + 'static>(f: F) -> Self {
        Curve::Custom(CustomCurve::new(f))
    }

    /// Restrict this curve to the window `[start, end]` of the parent progress
    ///
    /// The window is clamped to `[0, 1]` and ordered.
    pub fn interval(self, start: f32, end: f32) -> Self {
        let a = start.clamp(0.0, 1.0);
        let b = end.clamp(0.0, 1.0);
        Curve::Interval {
            start: a.min(b),
            end: a.max(b),
            curve: Box::new(self),
        }
    }

    /// Mirror the curve (an ease-in becomes an ease-out)
    pub fn flipped(self) -> Self {
        Curve::Flipped(Box::new(self))
    }

    /// Whether this curve can leave `[0, 1]` between its endpoints
    pub fn overshoots(&self) -> bool {
        match self {
            Curve::ElasticIn | Curve::ElasticOut | Curve::BackOut => true,
            Curve::CubicBezier(_, y1, _, y2) => !(0.0..=1.0).contains(y1) || !(0.0..=1.0).contains(y2),
            Curve::Interval { curve, .. } | Curve::Flipped(curve) => curve.overshoots(),
            Curve::Custom(_) => true,
            _ => false,
        }
    }

    /// Apply the curve to a progress value (0.0 to 1.0)
    pub fn transform(&self, t: f32) -> f32 {
        match self {
            Curve::Interval { start, end, curve } => {
                if t <= *start {
                    return curve.transform(0.0);
                }
                if t >= *end {
                    return curve.transform(1.0);
                }
                // start < t < end, so the window is not degenerate here
                curve.transform((t - start) / (end - start))
            }
            Curve::Flipped(curve) => 1.0 - curve.transform(1.0 - t),
            Curve::Custom(f) => f.call(t),
            named => {
                if t <= 0.0 {
                    return 0.0;
                }
                if t >= 1.0 {
                    return 1.0;
                }
                named.transform_interior(t)
            }
        }
    }

    /// Named curves, `0 < t < 1`
    fn transform_interior(&self, t: f32) -> f32 {
        match self {
            Curve::Linear => t,
            Curve::EaseIn => t * t * t,
            Curve::EaseOut => 1.0 - (1.0 - t).powi(3),
            Curve::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Curve::EaseInQuad => t * t,
            Curve::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Curve::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Curve::EaseInCubic => t * t * t,
            Curve::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Curve::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Curve::EaseInQuart => t * t * t * t,
            Curve::EaseOutQuart => 1.0 - (1.0 - t).powi(4),
            Curve::EaseInOutQuart => {
                if t < 0.5 {
                    8.0 * t * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            Curve::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            Curve::EaseOutSine => (t * PI / 2.0).sin(),
            Curve::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Curve::ElasticIn => {
                let c4 = (2.0 * PI) / 3.0;
                -(2.0f32.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * c4).sin()
            }
            Curve::ElasticOut => {
                let c4 = (2.0 * PI) / 3.0;
                2.0f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
            }
            Curve::BackOut => {
                const C1: f32 = 1.70158;
                const C3: f32 = C1 + 1.0;
                1.0 + C3 * (t - 1.0).powi(3) + C1 * (t - 1.0).powi(2)
            }
            Curve::BounceIn => 1.0 - bounce_out(1.0 - t),
            Curve::BounceOut => bounce_out(t),
            Curve::Steps(n) => {
                let n = (*n).max(1) as f32;
                (t * n).floor() / n
            }
            Curve::CubicBezier(x1, y1, x2, y2) => cubic_bezier_ease(t, *x1, *y1, *x2, *y2),
            // handled in `transform`
            Curve::Interval { .. } | Curve::Flipped(_) | Curve::Custom(_) => self.transform(t),
        }
    }

    /// Every named, parameterless curve
    pub fn named() -> [Curve; 21] {
        [
            Curve::Linear,
            Curve::EaseIn,
            Curve::EaseOut,
            Curve::EaseInOut,
            Curve::EaseInQuad,
            Curve::EaseOutQuad,
            Curve::EaseInOutQuad,
            Curve::EaseInCubic,
            Curve::EaseOutCubic,
            Curve::EaseInOutCubic,
            Curve::EaseInQuart,
            Curve::EaseOutQuart,
            Curve::EaseInOutQuart,
            Curve::EaseInSine,
            Curve::EaseOutSine,
            Curve::EaseInOutSine,
            Curve::ElasticIn,
            Curve::ElasticOut,
            Curve::BackOut,
            Curve::BounceIn,
            Curve::BounceOut,
        ]
    }
}

fn bounce_out(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

/// Cubic bezier easing calculation (matches CSS / browser implementations).
///
/// Uses Newton-Raphson with binary-search fallback for robustness.
/// Computes in f64 internally to avoid f32 precision jitter at 120fps.
fn cubic_bezier_ease(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let x = t as f64;
    let x1 = x1 as f64;
    let y1 = y1 as f64;
    let x2 = x2 as f64;
    let y2 = y2 as f64;

    let mut p = x;
    for _ in 0..8 {
        let err = bezier_sample(p, x1, x2) - x;
        if err.abs() < 1e-7 {
            return bezier_sample(p, y1, y2) as f32;
        }
        let slope = bezier_slope(p, x1, x2);
        if slope.abs() < 1e-7 {
            break;
        }
        p -= err / slope;
    }

    // Bisection always converges
    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    p = x;
    for _ in 0..20 {
        let val = bezier_sample(p, x1, x2);
        if (val - x).abs() < 1e-7 {
            break;
        }
        if val < x {
            lo = p;
        } else {
            hi = p;
        }
        p = (lo + hi) * 0.5;
    }

    bezier_sample(p, y1, y2) as f32
}

/// B(t) = 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³, in Horner form
#[inline]
fn bezier_sample(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    ((a * t + b) * t + c) * t
}

#[inline]
fn bezier_slope(t: f64, p1: f64, p2: f64) -> f64 {
    let a = 1.0 - 3.0 * p2 + 3.0 * p1;
    let b = 3.0 * p2 - 6.0 * p1;
    let c = 3.0 * p1;
    (3.0 * a * t + 2.0 * b) * t + c
}
