//! Animation error types

use std::time::Duration;
use thiserror::Error;

/// Animation engine errors
///
/// `InvalidDuration`, `DisposedControllerUse` and `InvalidSimulation` are returned
/// synchronously from the operation that caused them. `SimulationDivergence`
/// and `InvalidCompositionWindow` are runtime conditions: the engine recovers
/// locally (snap to equilibrium, truncate the window) and reports them as a
/// [`Diagnostic`](crate::scheduler::Diagnostic) instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// Duration must be strictly positive
    #[error("Invalid duration: {0:?} (must be greater than zero)")]
    InvalidDuration(Duration),

    /// Operation on a controller after `dispose()`
    #[error("Controller used after dispose")]
    DisposedControllerUse,

    /// Spring failed to settle and was snapped to its equilibrium
    #[error("Simulation diverged after {steps} steps (displacement {displacement})")]
    SimulationDivergence { steps: u32, displacement: f32 },

    /// A timeline entry does not fit inside its parent span
    #[error(
        "Composition window for entry {entry} is [{start:?}, {end:?}] but the parent span is {span:?}"
    )]
    InvalidCompositionWindow {
        entry: usize,
        start: Duration,
        end: Duration,
        span: Duration,
    },

    /// Physically meaningless spring or friction parameters
    #[error("Invalid simulation parameters: {0}")]
    InvalidSimulation(String),
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;

/// Reject zero durations
pub(crate) fn check_duration(duration: Duration) -> Result<Duration> {
    if duration.is_zero() {
        Err(AnimationError::InvalidDuration(duration))
    } else {
        Ok(duration)
    }
}
