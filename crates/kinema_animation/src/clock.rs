//! Frame clocks
//!
//! The engine never reads the wall clock on its own. Every tick is driven by an
//! elapsed-time delta, either passed directly to
//! [`AnimationScheduler::advance`](crate::scheduler::AnimationScheduler::advance)
//! or pulled from a [`FrameClock`] by
//! [`AnimationScheduler::tick`](crate::scheduler::AnimationScheduler::tick).

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A source of monotonically increasing frame time
pub trait FrameClock {
    /// Time elapsed since the previous call
    fn delta(&mut self) -> Duration;

    /// Re-anchor after an idle period so the next delta starts near zero
    ///
    /// The scheduler calls this when an animation registers while nothing was
    /// running.
    fn reset(&mut self) {}
}

/// Wall-clock frame source backed by [`Instant`]
///
/// Deltas are clamped to `max_delta` so a stalled frame (debugger pause,
/// minimized window) does not fast-forward every animation at once.
#[derive(Clone, Debug)]
pub struct SystemClock {
    last_frame: Instant,
    max_delta: Duration,
}

impl SystemClock {
    pub const DEFAULT_MAX_DELTA: Duration = Duration::from_millis(100);

    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            max_delta: Self::DEFAULT_MAX_DELTA,
        }
    }

    pub fn with_max_delta(mut self, max_delta: Duration) -> Self {
        self.max_delta = max_delta;
        self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for SystemClock {
    fn delta(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        dt.min(self.max_delta)
    }

    fn reset(&mut self) {
        self.last_frame = Instant::now();
    }
}

/// Deterministic clock for tests and offline sampling
///
/// Returns queued deltas first, then the fixed step.
#[derive(Clone, Debug)]
pub struct ManualClock {
    step: Duration,
    queued: VecDeque<Duration>,
    elapsed: Duration,
}

impl ManualClock {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            queued: VecDeque::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Fixed step of `1 / fps` seconds
    pub fn from_fps(fps: u32) -> Self {
        Self::new(Duration::from_secs_f64(1.0 / fps.max(1) as f64))
    }

    /// Queue a one-off delta for the next call
    pub fn push(&mut self, delta: Duration) {
        self.queued.push_back(delta);
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Total time handed out so far
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl FrameClock for ManualClock {
    fn delta(&mut self) -> Duration {
        let dt = self.queued.pop_front().unwrap_or(self.step);
        self.elapsed += dt;
        dt
    }
}
