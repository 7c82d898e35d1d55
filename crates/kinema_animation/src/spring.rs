//! Spring physics animation
//!
//! Damped harmonic oscillator `m·x'' + c·x' + k·(x − x_eq) = 0`, integrated with
//! semi-implicit Euler (default) or RK4. Frames are split into sub-steps no
//! longer than the spring's own stability limit, so stiff or heavily damped
//! springs stay stable at any frame rate. One tick integrates at most
//! [`MAX_SUBSTEPS`] sub-steps; time beyond that is dropped.
//!
//! A simulation settles once it has stayed within [`SettleTolerance`] for N
//! consecutive ticks, and is force-completed at its equilibrium if it fails to
//! settle within a bounded number of ticks or its displacement explodes.

use crate::error::{AnimationError, Result};

/// Largest integration step, in seconds
const MAX_SUBSTEP: f32 = 1.0 / 120.0;

/// Upper bound on integration steps per tick
pub const MAX_SUBSTEPS: u32 = 4096;

/// Displacement beyond `DIVERGENCE_FACTOR × initial extent` counts as divergence
const DIVERGENCE_FACTOR: f32 = 1000.0;

/// Outcome of one simulation tick
#[derive(Clone, Debug, PartialEq)]
pub enum SimulationStep {
    /// Still moving
    Running,
    /// Came to rest at its target this tick
    Settled,
    /// Failed to settle and was snapped to its target this tick
    Diverged(AnimationError),
}

/// Unbounded-duration motion driven by a physical model
pub trait Simulation {
    /// Advance by `dt` seconds
    fn step(&mut self, dt: f32) -> SimulationStep;

    fn position(&self) -> f32;

    fn velocity(&self) -> f32;

    /// Where the simulation comes to rest
    fn target(&self) -> f32;

    fn is_done(&self) -> bool;
}

/// Configuration for a spring animation
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
}

impl SpringConfig {
    /// Create a new spring configuration
    pub fn new(stiffness: f32, damping: f32, mass: f32) -> Self {
        Self {
            stiffness,
            damping,
            mass,
        }
    }

    /// A gentle, slow spring (good for page transitions)
    pub fn gentle() -> Self {
        Self::new(120.0, 14.0, 1.0)
    }

    /// A wobbly spring with overshoot (good for playful UI)
    pub fn wobbly() -> Self {
        Self::new(180.0, 12.0, 1.0)
    }

    /// A stiff, snappy spring (good for buttons)
    pub fn stiff() -> Self {
        Self::new(400.0, 30.0, 1.0)
    }

    /// A very stiff spring with minimal oscillation (good for quick responses)
    pub fn snappy() -> Self {
        Self::new(600.0, 40.0, 1.0)
    }

    /// A slow spring with no overshoot (critically damped)
    pub fn molasses() -> Self {
        Self::new(100.0, 20.0, 1.0)
    }

    /// A spring with exactly critical damping for the given stiffness and mass
    pub fn critically_damped(stiffness: f32, mass: f32) -> Self {
        Self::new(stiffness, 2.0 * (stiffness * mass).sqrt(), mass)
    }

    /// Calculate critical damping for this spring's stiffness and mass
    pub fn critical_damping(&self) -> f32 {
        2.0 * (self.stiffness * self.mass).sqrt()
    }

    /// Check if the spring is underdamped (will oscillate)
    pub fn is_underdamped(&self) -> bool {
        self.damping < self.critical_damping()
    }

    /// Check if the spring is critically damped (no oscillation, fastest settling)
    pub fn is_critically_damped(&self) -> bool {
        (self.damping - self.critical_damping()).abs() < 0.01
    }

    /// Check if the spring is overdamped (slow settling, no oscillation)
    pub fn is_overdamped(&self) -> bool {
        self.damping > self.critical_damping()
    }

    /// Reject non-physical parameters
    pub fn validate(&self) -> Result<()> {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(AnimationError::InvalidSimulation(format!(
                "mass must be positive, got {}",
                self.mass
            )));
        }
        if !(self.stiffness.is_finite() && self.stiffness > 0.0) {
            return Err(AnimationError::InvalidSimulation(format!(
                "stiffness must be positive, got {}",
                self.stiffness
            )));
        }
        if !(self.damping.is_finite() && self.damping >= 0.0) {
            return Err(AnimationError::InvalidSimulation(format!(
                "damping must not be negative, got {}",
                self.damping
            )));
        }
        Ok(())
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::stiff()
    }
}

/// When a simulation counts as at rest
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SettleTolerance {
    /// Maximum distance from the target
    pub position: f32,
    /// Maximum speed
    pub velocity: f32,
    /// Consecutive ticks both conditions must hold
    pub ticks: u32,
}

impl SettleTolerance {
    pub fn new(position: f32, velocity: f32, ticks: u32) -> Self {
        Self {
            position,
            velocity,
            ticks: ticks.max(1),
        }
    }

    /// Tolerance for values measured in pixels
    ///
    /// Being within 0.5px and under 5px/s is imperceptible.
    pub fn pixels() -> Self {
        Self::new(0.5, 5.0, 1)
    }
}

impl Default for SettleTolerance {
    /// Tolerance for normalized progress values
    fn default() -> Self {
        Self::new(1e-3, 1e-3, 3)
    }
}

/// Numerical integration method
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Integrator {
    /// Velocity first, then position from the new velocity
    #[default]
    SemiImplicitEuler,
    /// Classic fourth-order Runge-Kutta
    Rk4,
}

/// A spring moving a value toward a target
///
/// Retargeting keeps the current velocity, so interrupted animations stay
/// continuous.
#[derive(Clone, Debug)]
pub struct SpringSimulation {
    config: SpringConfig,
    tolerance: SettleTolerance,
    integrator: Integrator,
    position: f32,
    velocity: f32,
    target: f32,
    settled_ticks: u32,
    ticks: u32,
    max_ticks: u32,
    divergence_bound: f32,
    done: bool,
}

impl SpringSimulation {
    pub const DEFAULT_MAX_TICKS: u32 = 6000;

    /// Start at `position` with `velocity`, moving toward `target`
    pub fn new(config: SpringConfig, position: f32, target: f32, velocity: f32) -> Result<Self> {
        config.validate()?;
        let mut sim = Self {
            config,
            tolerance: SettleTolerance::default(),
            integrator: Integrator::default(),
            position,
            velocity,
            target,
            settled_ticks: 0,
            ticks: 0,
            max_ticks: Self::DEFAULT_MAX_TICKS,
            divergence_bound: 0.0,
            done: false,
        };
        sim.rearm();
        Ok(sim)
    }

    /// A spring resting at `value`
    pub fn at_rest(config: SpringConfig, value: f32) -> Result<Self> {
        let mut sim = Self::new(config, value, value, 0.0)?;
        sim.done = true;
        Ok(sim)
    }

    pub fn with_tolerance(mut self, tolerance: SettleTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = integrator;
        self
    }

    /// Ticks allowed before the spring is force-completed
    pub fn with_max_ticks(mut self, max_ticks: u32) -> Self {
        self.max_ticks = max_ticks.max(1);
        self
    }

    pub fn config(&self) -> SpringConfig {
        self.config
    }

    pub fn tolerance(&self) -> SettleTolerance {
        self.tolerance
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Move the equilibrium, keeping position and velocity
    pub fn set_target(&mut self, target: f32) {
        if target == self.target && self.done {
            return;
        }
        self.target = target;
        self.done = false;
        self.rearm();
    }

    /// Jump to `value` with no motion
    pub fn snap_to(&mut self, value: f32) {
        self.position = value;
        self.target = value;
        self.velocity = 0.0;
        self.done = true;
    }

    /// Check if the spring is within tolerance of its target right now
    pub fn is_within_tolerance(&self) -> bool {
        (self.position - self.target).abs() < self.tolerance.position
            && self.velocity.abs() < self.tolerance.velocity
    }

    fn rearm(&mut self) {
        self.ticks = 0;
        self.settled_ticks = 0;
        let extent = (self.position - self.target).abs() + self.velocity.abs();
        self.divergence_bound = DIVERGENCE_FACTOR * extent.max(1.0);
    }

    /// Integration step that keeps both the damping and the oscillation
    /// terms well inside the explicit stability region
    fn stable_substep(&self) -> f32 {
        let SpringConfig {
            stiffness,
            damping,
            mass,
        } = self.config;
        let mut h = MAX_SUBSTEP;
        if damping > 0.0 {
            h = h.min(0.5 * mass / damping);
        }
        h.min(0.5 / (stiffness / mass).sqrt())
    }

    fn acceleration(&self, x: f32, v: f32) -> f32 {
        let spring_force = -self.config.stiffness * (x - self.target);
        let damping_force = -self.config.damping * v;
        (spring_force + damping_force) / self.config.mass
    }

    fn integrate(&mut self, h: f32) {
        match self.integrator {
            Integrator::SemiImplicitEuler => {
                let a = self.acceleration(self.position, self.velocity);
                self.velocity += a * h;
                self.position += self.velocity * h;
            }
            Integrator::Rk4 => {
                let k1_v = self.acceleration(self.position, self.velocity);
                let k1_x = self.velocity;

                let k2_v = self.acceleration(
                    self.position + k1_x * h * 0.5,
                    self.velocity + k1_v * h * 0.5,
                );
                let k2_x = self.velocity + k1_v * h * 0.5;

                let k3_v = self.acceleration(
                    self.position + k2_x * h * 0.5,
                    self.velocity + k2_v * h * 0.5,
                );
                let k3_x = self.velocity + k2_v * h * 0.5;

                let k4_v = self.acceleration(self.position + k3_x * h, self.velocity + k3_v * h);
                let k4_x = self.velocity + k3_v * h;

                self.velocity += (k1_v + 2.0 * k2_v + 2.0 * k3_v + k4_v) * h / 6.0;
                self.position += (k1_x + 2.0 * k2_x + 2.0 * k3_x + k4_x) * h / 6.0;
            }
        }
    }

    fn force_complete(&mut self) -> SimulationStep {
        let displacement = (self.position - self.target).abs();
        let steps = self.ticks;
        tracing::warn!(
            "Spring failed to settle after {} ticks (displacement {}), snapping to {}",
            steps,
            displacement,
            self.target
        );
        self.snap_to(self.target);
        SimulationStep::Diverged(AnimationError::SimulationDivergence {
            steps,
            displacement,
        })
    }
}

impl Simulation for SpringSimulation {
    fn step(&mut self, dt: f32) -> SimulationStep {
        if self.done {
            return SimulationStep::Settled;
        }

        let dt = dt.max(0.0);
        let limit = self.stable_substep();
        let needed = (dt / limit).ceil().max(1.0);
        let (substeps, h) = if needed > MAX_SUBSTEPS as f32 {
            tracing::trace!(
                "Spring tick of {}s needs {} sub-steps, integrating {}",
                dt,
                needed,
                MAX_SUBSTEPS
            );
            (MAX_SUBSTEPS, limit)
        } else {
            let substeps = needed as u32;
            (substeps, dt / substeps as f32)
        };
        for _ in 0..substeps {
            self.integrate(h);
        }
        self.ticks += 1;

        let displacement = (self.position - self.target).abs();
        if !displacement.is_finite() || !self.velocity.is_finite() || displacement > self.divergence_bound
        {
            return self.force_complete();
        }

        if self.is_within_tolerance() {
            self.settled_ticks += 1;
            if self.settled_ticks >= self.tolerance.ticks {
                self.snap_to(self.target);
                return SimulationStep::Settled;
            }
        } else {
            self.settled_ticks = 0;
        }

        if self.ticks >= self.max_ticks {
            return self.force_complete();
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
        self.target
    }

    fn is_done(&self) -> bool {
        self.done
    }
}
