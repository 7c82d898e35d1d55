//! Friction decay
//!
//! Exponential velocity decay used for momentum after a release:
//!
//! - `v(t) = v0 · drag^t`
//! - `x(t) = x0 + v0 · (drag^t − 1) / ln(drag)`
//!
//! `drag` is the fraction of velocity left after one second. The simulation is
//! evaluated in closed form from its start, so frame pacing does not
//! accumulate error.

use crate::error::{AnimationError, Result};
use crate::spring::{SettleTolerance, Simulation, SimulationStep};

/// Momentum that bleeds off under constant drag
#[derive(Clone, Debug)]
pub struct FrictionSimulation {
    drag: f32,
    ln_drag: f32,
    start_position: f32,
    start_velocity: f32,
    elapsed: f32,
    position: f32,
    velocity: f32,
    tolerance: SettleTolerance,
    done: bool,
}

impl FrictionSimulation {
    /// Drag used by scrolling momentum
    pub const DEFAULT_DRAG: f32 = 0.135;

    pub fn new(drag: f32, position: f32, velocity: f32) -> Result<Self> {
        if !(drag.is_finite() && drag > 0.0 && drag < 1.0) {
            return Err(AnimationError::InvalidSimulation(format!(
                "drag must be in (0, 1), got {drag}"
            )));
        }

        let mut sim = Self {
            drag,
            ln_drag: drag.ln(),
            start_position: position,
            start_velocity: velocity,
            elapsed: 0.0,
            position,
            velocity,
            tolerance: SettleTolerance::default(),
            done: false,
        };
        sim.done = sim.velocity.abs() < sim.tolerance.velocity;
        Ok(sim)
    }

    /// Only the velocity part of the tolerance is used
    pub fn with_tolerance(mut self, tolerance: SettleTolerance) -> Self {
        self.tolerance = tolerance;
        self.done = self.velocity.abs() < tolerance.velocity;
        self
    }

    pub fn drag(&self) -> f32 {
        self.drag
    }

    /// Where the motion ends as time goes to infinity
    pub fn final_position(&self) -> f32 {
        self.start_position - self.start_velocity / self.ln_drag
    }

    /// Position at `t` seconds after the start
    pub fn position_at(&self, t: f32) -> f32 {
        self.start_position + self.start_velocity * (self.drag.powf(t) - 1.0) / self.ln_drag
    }

    /// Velocity at `t` seconds after the start
    pub fn velocity_at(&self, t: f32) -> f32 {
        self.start_velocity * self.drag.powf(t)
    }
}

impl Simulation for FrictionSimulation {
    fn step(&mut self, dt: f32) -> SimulationStep {
        if self.done {
            return SimulationStep::Settled;
        }

        self.elapsed += dt.max(0.0);
        self.position = self.position_at(self.elapsed);
        self.velocity = self.velocity_at(self.elapsed);

        if self.velocity.abs() < self.tolerance.velocity {
            self.done = true;
            tracing::trace!("Friction settled at {} after {}s", self.position, self.elapsed);
            return SimulationStep::Settled;
        }
        SimulationStep::Running
    }

    fn position(&self) -> f32 {
        self.position
    }

    fn velocity(&self) -> f32 {
        self.velocity
    }

    fn target(&self) -> f32 {
        self.final_position()
    }

    fn is_done(&self) -> bool {
        self.done
    }
}
