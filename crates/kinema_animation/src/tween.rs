//! Tweens and keyframe sequences
//!
//! A [`Tween`] pairs a begin and end value; [`Keyframes`] chains several stops,
//! each with the curve used when transitioning into it. Both are pure: they
//! map a progress value to a typed value and hold no time state. Drive them
//! with an [`AnimationController`](crate::controller::AnimationController) or
//! sample them directly.

use crate::curve::Curve;
use crate::values::Interpolate;

/// Begin/end pair for a typed value
#[derive(Clone, Debug, PartialEq)]
pub struct Tween<T: Interpolate> {
    pub begin: T,
    pub end: T,
}

impl<T: Interpolate> Tween<T> {
    pub fn new(begin: T, end: T) -> Self {
        Self { begin, end }
    }

    /// A tween that holds one value
    pub fn constant(value: T) -> Self {
        Self {
            begin: value.clone(),
            end: value,
        }
    }

    /// Value at linear progress `t`
    pub fn lerp(&self, t: f32) -> T {
        self.begin.lerp(&self.end, t)
    }

    /// Value at progress `t` shaped by `curve`
    pub fn transform(&self, curve: &Curve, t: f32) -> T {
        self.lerp(curve.transform(t))
    }

    /// Swap begin and end
    pub fn reversed(&self) -> Self {
        Self {
            begin: self.end.clone(),
            end: self.begin.clone(),
        }
    }
}

/// A keyframe holding a value of type T
#[derive(Clone, Debug, PartialEq)]
pub struct Keyframe<T: Interpolate> {
    /// Time position (0.0 to 1.0)
    pub time: f32,
    /// Value at this keyframe
    pub value: T,
    /// Curve used when transitioning TO this keyframe
    pub curve: Curve,
}

/// Ordered keyframes sampled by progress
///
/// # Example
///
/// ```rust
/// use kinema_animation::{Curve, Keyframes};
///
/// let pulse = Keyframes::new()
///     .at(0.0, 1.0_f32)
///     .keyframe(0.5, 1.2, Curve::EaseOut)
///     .keyframe(1.0, 1.0, Curve::EaseIn);
///
/// assert_eq!(pulse.sample(0.5), Some(1.2));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Keyframes<T: Interpolate> {
    frames: Vec<Keyframe<T>>,
}

impl<T: Interpolate> Keyframes<T> {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Add a keyframe (builder pattern)
    ///
    /// Times are clamped to `[0, 1]`. A keyframe at an existing time is placed
    /// after it, so a sequence can jump instantly.
    pub fn keyframe(mut self, time: f32, value: T, curve: Curve) -> Self {
        let time = time.clamp(0.0, 1.0);
        let index = self.frames.partition_point(|kf| kf.time <= time);
        self.frames.insert(index, Keyframe { time, value, curve });
        self
    }

    /// Add a keyframe with linear easing
    pub fn at(self, time: f32, value: T) -> Self {
        self.keyframe(time, value, Curve::Linear)
    }

    pub fn frames(&self) -> &[Keyframe<T>] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Sample at a specific progress (0.0 to 1.0)
    ///
    /// Before the first keyframe the first value holds, after the last the last
    /// value holds, and NaN progress holds the first value. Returns `None` when
    /// there are no keyframes.
    pub fn sample(&self, progress: f32) -> Option<T> {
        let first = self.frames.first()?;
        let last = self.frames.last()?;

        if progress.is_nan() || progress <= first.time {
            return Some(first.value.clone());
        }
        if progress >= last.time {
            return Some(last.value.clone());
        }

        // first.time < progress < last.time, so both neighbours exist
        let next_index = self.frames.partition_point(|kf| kf.time <= progress);
        let prev = &self.frames[next_index - 1];
        let next = &self.frames[next_index];

        let span = next.time - prev.time;
        if span <= f32::EPSILON {
            return Some(next.value.clone());
        }

        let local = (progress - prev.time) / span;
        Some(prev.value.lerp(&next.value, next.curve.transform(local)))
    }
}

impl<T: Interpolate> Default for Keyframes<T> {
    fn default() -> Self {
        Self::new()
    }
}
