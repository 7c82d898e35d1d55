//! Animation controller
//!
//! An [`AnimationController`] turns frame time into a progress value in
//! `[0, 1]` and runs it through a [`Curve`]. It can run forward or in reverse,
//! repeat, animate to an arbitrary target, or hand its progress over to a
//! physics [`Simulation`].
//!
//! The application owns the controller. The scheduler only holds a weak
//! reference to its shared core, so dropping the controller stops it.
//!
//! # Example
//!
//! ```rust
//! use kinema_animation::{AnimationController, AnimationScheduler, AnimationStatus, ControllerConfig};
//! use std::time::Duration;
//!
//! let scheduler = AnimationScheduler::new();
//! let controller = AnimationController::new(
//!     scheduler.handle(),
//!     ControllerConfig::new(Duration::from_millis(1000)),
//! )
//! .unwrap();
//!
//! controller.forward().unwrap();
//! for _ in 0..4 {
//!     scheduler.advance(Duration::from_millis(250));
//! }
//!
//! assert_eq!(controller.progress(), 1.0);
//! assert_eq!(controller.status(), AnimationStatus::Completed);
//! ```

use crate::curve::Curve;
use crate::error::{check_duration, AnimationError, Result};
use crate::listener::{ListenerId, Listeners};
use crate::scheduler::{SchedulerHandle, TickFlow, Tickable, TickerId};
use crate::spring::{Simulation, SimulationStep, SpringConfig, SpringSimulation};
use crate::timeline::{Timeline, TimelineEvent};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Direction of travel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Toward 1
    #[default]
    Forward,
    /// Toward 0
    Reverse,
}

impl Direction {
    pub fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }

    /// The progress bound this direction travels to
    pub fn bound(self) -> f32 {
        match self {
            Direction::Forward => 1.0,
            Direction::Reverse => 0.0,
        }
    }
}

/// What happens when a run reaches its bound
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RepeatPolicy {
    /// Stop at the bound
    #[default]
    Once,
    /// Jump back to the opposite bound and run again
    Loop,
    /// Turn around and run the other way
    ReverseRepeat,
}

/// Lifecycle of a controller
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AnimationStatus {
    /// Not running, never finished or stopped midway
    #[default]
    Idle,
    /// Running toward 1
    Forward,
    /// Running toward 0
    Reverse,
    /// Stopped at the end of a forward run
    Completed,
    /// Stopped at the end of a reverse run
    Dismissed,
}

impl AnimationStatus {
    pub fn is_running(self) -> bool {
        matches!(self, AnimationStatus::Forward | AnimationStatus::Reverse)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AnimationStatus::Completed | AnimationStatus::Dismissed)
    }

    fn running(direction: Direction) -> Self {
        match direction {
            Direction::Forward => AnimationStatus::Forward,
            Direction::Reverse => AnimationStatus::Reverse,
        }
    }

    fn finished(direction: Direction) -> Self {
        match direction {
            Direction::Forward => AnimationStatus::Completed,
            Direction::Reverse => AnimationStatus::Dismissed,
        }
    }
}

/// Where progress starts, and where `reset()` returns it
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InitialProgress {
    #[default]
    Start,
    /// Start at 1, for controllers that mostly play in reverse
    End,
}

impl InitialProgress {
    pub fn value(self) -> f32 {
        match self {
            InitialProgress::Start => 0.0,
            InitialProgress::End => 1.0,
        }
    }
}

/// Controller configuration
#[derive(Clone, Debug, PartialEq)]
pub struct ControllerConfig {
    /// Length of a full forward run
    pub duration: Duration,
    /// Length of a full reverse run; `duration` when unset
    pub reverse_duration: Option<Duration>,
    pub curve: Curve,
    pub repeat: RepeatPolicy,
    pub initial: InitialProgress,
    /// Extra runs allowed by `Loop` and `ReverseRepeat`; unlimited when unset
    pub max_repeats: Option<u32>,
    /// Spring used by [`AnimationController::fling`]
    pub spring: SpringConfig,
}

impl ControllerConfig {
    pub const DEFAULT_DURATION: Duration = Duration::from_millis(300);

    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            ..Default::default()
        }
    }

    pub fn with_reverse_duration(mut self, duration: Duration) -> Self {
        self.reverse_duration = Some(duration);
        self
    }

    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }

    pub fn with_repeat(mut self, repeat: RepeatPolicy) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_max_repeats(mut self, max_repeats: u32) -> Self {
        self.max_repeats = Some(max_repeats);
        self
    }

    /// Start (and reset) at progress 1
    pub fn reverse_initial(mut self) -> Self {
        self.initial = InitialProgress::End;
        self
    }

    pub fn with_spring(mut self, spring: SpringConfig) -> Self {
        self.spring = spring;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_duration(self.duration)?;
        if let Some(reverse) = self.reverse_duration {
            check_duration(reverse)?;
        }
        self.spring.validate()
    }

    fn span_for(&self, direction: Direction) -> Duration {
        match direction {
            Direction::Forward => self.duration,
            Direction::Reverse => self.reverse_duration.unwrap_or(self.duration),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            duration: Self::DEFAULT_DURATION,
            reverse_duration: None,
            curve: Curve::Linear,
            repeat: RepeatPolicy::Once,
            initial: InitialProgress::Start,
            max_repeats: None,
            spring: SpringConfig::default(),
        }
    }
}

/// A timed run from `origin` to `target`
struct Run {
    origin: f32,
    target: f32,
    span: Duration,
    elapsed: Duration,
    direction: Direction,
    /// Only runs started with `start()` follow the repeat policy
    repeats: bool,
}

enum Drive {
    Idle,
    Run(Run),
    Simulation {
        sim: Box<dyn Simulation>,
        direction: Direction,
    },
}

#[derive(Default)]
struct Changes {
    value: Option<f32>,
    status: Option<AnimationStatus>,
    events: Vec<TimelineEvent>,
    diagnostic: Option<AnimationError>,
}

struct StepOutcome {
    finished: bool,
    diagnostic: Option<AnimationError>,
}

impl StepOutcome {
    fn running() -> Self {
        Self {
            finished: false,
            diagnostic: None,
        }
    }

    fn finished(diagnostic: Option<AnimationError>) -> Self {
        Self {
            finished: true,
            diagnostic,
        }
    }
}

struct ControllerState {
    config: ControllerConfig,
    progress: f32,
    velocity: f32,
    status: AnimationStatus,
    direction: Direction,
    drive: Drive,
    iteration: u32,
    /// Set while a simulation owns progress; the curve is bypassed
    physics: bool,
    ticker: Option<TickerId>,
    timeline: Option<Timeline>,
}

impl ControllerState {
    fn value(&self) -> f32 {
        if self.physics {
            self.progress
        } else {
            self.config.curve.transform(self.progress)
        }
    }

    fn snapshot(&self) -> (f32, AnimationStatus) {
        (self.progress, self.status)
    }

    fn changes_since(&mut self, before: (f32, AnimationStatus)) -> Changes {
        let mut changes = Changes::default();
        if self.progress != before.0 {
            changes.value = Some(self.value());
            if let Some(timeline) = self.timeline.as_mut() {
                changes.events = timeline.seek(self.progress);
            }
        }
        if self.status != before.1 {
            changes.status = Some(self.status);
        }
        changes
    }

    fn halt(&mut self, status: AnimationStatus) {
        self.drive = Drive::Idle;
        self.velocity = 0.0;
        self.status = status;
    }

    fn begin_run(&mut self, direction: Direction) {
        let target = direction.bound();
        let mut origin = self.progress.clamp(0.0, 1.0);
        if origin == target {
            origin = direction.flipped().bound();
        }

        let mut span = scaled_span(self.config.span_for(direction), (target - origin).abs());
        if span.is_zero() {
            span = Duration::from_nanos(1);
        }

        self.progress = origin;
        self.velocity = 0.0;
        self.direction = direction;
        self.iteration = 0;
        self.physics = false;
        self.status = AnimationStatus::running(direction);
        self.drive = Drive::Run(Run {
            origin,
            target,
            span,
            elapsed: Duration::ZERO,
            direction,
            repeats: true,
        });
    }

    fn begin_simulation(&mut self, sim: Box<dyn Simulation>) {
        let position = sim.position();
        let direction = if sim.target() >= position {
            Direction::Forward
        } else {
            Direction::Reverse
        };

        self.progress = position;
        self.velocity = sim.velocity();
        self.direction = direction;
        self.physics = true;

        if sim.is_done() {
            let status = settled_status(position, self.status);
            self.halt(status);
        } else {
            self.status = AnimationStatus::running(direction);
            self.drive = Drive::Simulation { sim, direction };
        }
    }

    fn step(&mut self, dt: Duration) -> StepOutcome {
        match self.drive {
            Drive::Idle => StepOutcome::finished(None),
            Drive::Run(_) => self.step_run(dt),
            Drive::Simulation { .. } => self.step_simulation(dt),
        }
    }

    fn step_run(&mut self, dt: Duration) -> StepOutcome {
        let repeat = self.config.repeat;
        let max_repeats = self.config.max_repeats;
        let forward_span = self.config.span_for(Direction::Forward);
        let reverse_span = self.config.span_for(Direction::Reverse);

        let Drive::Run(run) = &mut self.drive else {
            return StepOutcome::finished(None);
        };
        run.elapsed += dt;

        let direction = loop {
            if run.elapsed < run.span {
                let span = run.span.as_secs_f32();
                let fraction = run.elapsed.as_secs_f32() / span;
                self.progress = run.origin + (run.target - run.origin) * fraction;
                self.velocity = (run.target - run.origin) / span;
                return StepOutcome::running();
            }

            let can_repeat = run.repeats
                && repeat != RepeatPolicy::Once
                && max_repeats.map_or(true, |max| self.iteration < max);
            if !can_repeat {
                self.progress = run.target;
                break run.direction;
            }

            // Carry the overshoot into the next run
            run.elapsed -= run.span;
            self.iteration += 1;
            match repeat {
                RepeatPolicy::Loop => {
                    run.origin = run.direction.flipped().bound();
                }
                RepeatPolicy::ReverseRepeat => {
                    run.direction = run.direction.flipped();
                    run.origin = run.target;
                    self.direction = run.direction;
                    self.status = AnimationStatus::running(run.direction);
                }
                RepeatPolicy::Once => {}
            }
            run.target = run.direction.bound();
            run.span = match run.direction {
                Direction::Forward => forward_span,
                Direction::Reverse => reverse_span,
            };
            tracing::trace!("Controller repeat {} ({:?})", self.iteration, run.direction);
        };

        self.halt(AnimationStatus::finished(direction));
        StepOutcome::finished(None)
    }

    fn step_simulation(&mut self, dt: Duration) -> StepOutcome {
        let Drive::Simulation { sim, direction } = &mut self.drive else {
            return StepOutcome::finished(None);
        };
        let direction = *direction;
        let step = sim.step(dt.as_secs_f32());
        self.progress = sim.position();
        self.velocity = sim.velocity();

        match step {
            SimulationStep::Running => StepOutcome::running(),
            SimulationStep::Settled => {
                self.halt(AnimationStatus::finished(direction));
                StepOutcome::finished(None)
            }
            SimulationStep::Diverged(error) => {
                self.halt(AnimationStatus::finished(direction));
                StepOutcome::finished(Some(error))
            }
        }
    }
}

/// Time to cover `distance` of a full run lasting `full`
fn scaled_span(full: Duration, distance: f32) -> Duration {
    if distance == 1.0 {
        full
    } else {
        full.mul_f32(distance)
    }
}

/// Status for a controller that comes to rest at `progress` without running
fn settled_status(progress: f32, current: AnimationStatus) -> AnimationStatus {
    if progress >= 1.0 {
        AnimationStatus::Completed
    } else if progress <= 0.0 {
        AnimationStatus::Dismissed
    } else if current.is_running() {
        AnimationStatus::Idle
    } else {
        current
    }
}

struct ControllerCore {
    state: RefCell<ControllerState>,
    handle: SchedulerHandle,
    disposed: Cell<bool>,
    value_listeners: Listeners<f32>,
    status_listeners: Listeners<AnimationStatus>,
    timeline_listeners: Listeners<TimelineEvent>,
}

impl ControllerCore {
    fn emit(&self, changes: Changes, ticker: Option<TickerId>) {
        if let Some(error) = changes.diagnostic {
            self.handle.report(ticker, error);
        }
        if let Some(value) = changes.value {
            self.value_listeners.notify(&value);
        }
        for event in &changes.events {
            self.timeline_listeners.notify(event);
        }
        if let Some(status) = changes.status {
            tracing::debug!("Controller status -> {:?}", status);
            self.status_listeners.notify(&status);
        }
    }
}

impl Tickable for ControllerCore {
    fn advance(&self, id: TickerId, dt: Duration) -> TickFlow {
        let (changes, finished) = {
            let Ok(mut state) = self.state.try_borrow_mut() else {
                return TickFlow::Continue;
            };
            if state.ticker != Some(id) {
                return TickFlow::Finished;
            }

            let before = state.snapshot();
            let outcome = state.step(dt);
            if outcome.finished {
                // Cleared before listeners run so they can start a new run
                state.ticker = None;
            }
            let mut changes = state.changes_since(before);
            changes.diagnostic = outcome.diagnostic;
            (changes, outcome.finished)
        };

        if finished {
            self.handle.unregister(id);
        }
        self.emit(changes, Some(id));

        if finished {
            TickFlow::Finished
        } else {
            TickFlow::Continue
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

/// Drives a progress value from scheduler ticks
pub struct AnimationController {
    core: Rc<ControllerCore>,
}

impl AnimationController {
    /// Create a controller ticked by the scheduler behind `handle`
    ///
    /// Fails with `InvalidDuration` if any configured duration is zero.
    pub fn new(handle: SchedulerHandle, config: ControllerConfig) -> Result<Self> {
        config.validate()?;
        let progress = config.initial.value();
        tracing::debug!("Created controller ({:?}, {:?})", config.duration, config.repeat);

        Ok(Self {
            core: Rc::new(ControllerCore {
                state: RefCell::new(ControllerState {
                    config,
                    progress,
                    velocity: 0.0,
                    status: AnimationStatus::Idle,
                    direction: Direction::Forward,
                    drive: Drive::Idle,
                    iteration: 0,
                    physics: false,
                    ticker: None,
                    timeline: None,
                }),
                handle,
                disposed: Cell::new(false),
                value_listeners: Listeners::new(),
                status_listeners: Listeners::new(),
                timeline_listeners: Listeners::new(),
            }),
        })
    }

    /// Apply `f`, keep the scheduler registration in sync, then notify
    ///
    /// `f` must validate before it mutates: an error leaves the state as it was.
    fn mutate<R>(&self, f: impl FnOnce(&mut ControllerState) -> Result<R>) -> Result<R> {
        if self.core.disposed.get() {
            return Err(AnimationError::DisposedControllerUse);
        }

        let (result, changes, ticker) = {
            let mut state = self.core.state.borrow_mut();
            let before = state.snapshot();
            let result = f(&mut *state)?;
            let changes = state.changes_since(before);
            let ticker = self.sync_registration(&mut *state);
            (result, changes, ticker)
        };

        self.core.emit(changes, ticker);
        Ok(result)
    }

    fn sync_registration(&self, state: &mut ControllerState) -> Option<TickerId> {
        let idle = matches!(state.drive, Drive::Idle);
        match (idle, state.ticker) {
            (false, None) => {
                state.ticker = self.core.handle.register(&self.core);
                if state.ticker.is_none() {
                    tracing::debug!("No scheduler available, controller will not tick");
                }
            }
            (true, Some(id)) => {
                state.ticker = None;
                self.core.handle.unregister(id);
            }
            _ => {}
        }
        state.ticker
    }

    /// Run toward the bound of `direction`
    ///
    /// From a controller resting at that bound the run restarts from the
    /// opposite one; otherwise it continues from the current progress.
    pub fn start(&self, direction: Direction) -> Result<()> {
        self.mutate(|state| {
            state.begin_run(direction);
            Ok(())
        })
    }

    pub fn forward(&self) -> Result<()> {
        self.start(Direction::Forward)
    }

    pub fn reverse(&self) -> Result<()> {
        self.start(Direction::Reverse)
    }

    /// Halt where it is; a running controller becomes `Idle`
    pub fn stop(&self) -> Result<()> {
        self.mutate(|state| {
            if state.status.is_running() {
                state.halt(AnimationStatus::Idle);
            }
            Ok(())
        })
    }

    /// Return to the initial progress with status `Dismissed`
    pub fn reset(&self) -> Result<()> {
        self.mutate(|state| {
            state.progress = state.config.initial.value();
            state.iteration = 0;
            state.physics = false;
            state.halt(AnimationStatus::Dismissed);
            Ok(())
        })
    }

    /// Run from the current progress to `target`
    ///
    /// `target` is clamped to `[0, 1]`. Without an explicit duration the
    /// configured one is scaled by the distance to travel. Arriving at the
    /// target reports `Completed` for forward travel and `Dismissed` for
    /// reverse travel.
    pub fn animate_to(&self, target: f32, duration: Option<Duration>) -> Result<()> {
        if let Some(duration) = duration {
            check_duration(duration)?;
        }

        self.mutate(|state| {
            let target = if target.is_nan() {
                state.progress
            } else {
                target.clamp(0.0, 1.0)
            };
            let distance = (target - state.progress).abs();
            let direction = if target >= state.progress {
                Direction::Forward
            } else {
                Direction::Reverse
            };
            let span = match duration {
                Some(duration) => duration,
                None => scaled_span(state.config.span_for(direction), distance),
            };

            state.physics = false;
            if distance == 0.0 || span.is_zero() {
                state.progress = target;
                let status = settled_status(target, state.status);
                state.halt(status);
                return Ok(());
            }

            state.direction = direction;
            state.status = AnimationStatus::running(direction);
            state.drive = Drive::Run(Run {
                origin: state.progress,
                target,
                span,
                elapsed: Duration::ZERO,
                direction,
                repeats: false,
            });
            Ok(())
        })
    }

    /// Let `simulation` drive progress until it settles
    ///
    /// Progress jumps to the simulation's position and may leave `[0, 1]`
    /// while it runs. The curve is not applied.
    pub fn animate_with<S>(&self, simulation: S) -> Result<()>
    where
        S: Simulation + 'static,
    {
        self.mutate(move |state| {
            state.begin_simulation(Box::new(simulation));
            Ok(())
        })
    }

    /// Release with `velocity` (progress units per second) into the
    /// configured spring, toward 1 or 0 by the sign of the velocity
    pub fn fling(&self, velocity: f32) -> Result<()> {
        self.mutate(|state| {
            let target = if velocity < 0.0 { 0.0 } else { 1.0 };
            let sim = SpringSimulation::new(state.config.spring, state.progress, target, velocity)?;
            state.begin_simulation(Box::new(sim));
            Ok(())
        })
    }

    /// Drive `timeline` from this controller's progress
    ///
    /// The timeline is seeked immediately and on every later change. Window
    /// problems it recorded are reported as scheduler diagnostics.
    pub fn attach(&self, mut timeline: Timeline) -> Result<()> {
        if self.core.disposed.get() {
            return Err(AnimationError::DisposedControllerUse);
        }

        let (events, ticker) = {
            let mut state = self.core.state.borrow_mut();
            let events = timeline.seek(state.progress);
            state.timeline = Some(timeline);
            (events, state.ticker)
        };

        let diagnostics = self
            .with_timeline(Timeline::all_diagnostics)
            .unwrap_or_default();
        for error in diagnostics {
            self.core.handle.report(ticker, error);
        }
        for event in &events {
            self.core.timeline_listeners.notify(event);
        }
        Ok(())
    }

    pub fn detach(&self) -> Option<Timeline> {
        self.core.state.borrow_mut().timeline.take()
    }

    /// Access the attached timeline
    pub fn with_timeline<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&Timeline) -> R,
    {
        self.core.state.borrow().timeline.as_ref().map(f)
    }

    pub fn progress(&self) -> f32 {
        self.core.state.borrow().progress
    }

    /// Progress with the curve applied
    pub fn value(&self) -> f32 {
        self.core.state.borrow().value()
    }

    pub fn status(&self) -> AnimationStatus {
        self.core.state.borrow().status
    }

    pub fn direction(&self) -> Direction {
        self.core.state.borrow().direction
    }

    /// Rate of change of progress, per second
    pub fn velocity(&self) -> f32 {
        self.core.state.borrow().velocity
    }

    pub fn is_animating(&self) -> bool {
        self.status().is_running()
    }

    /// Repeats completed in the current run
    pub fn iteration(&self) -> u32 {
        self.core.state.borrow().iteration
    }

    pub fn is_disposed(&self) -> bool {
        self.core.disposed.get()
    }

    /// Scheduler key while registered
    pub fn ticker(&self) -> Option<TickerId> {
        self.core.state.borrow().ticker
    }

    pub fn config(&self) -> ControllerConfig {
        self.core.state.borrow().config.clone()
    }

    /// Listen for value changes (curve applied)
    pub fn on_value_changed<F>(&self, mut callback: F) -> ListenerId
    where
        F: FnMut(f32) + 'static,
    {
        self.core.value_listeners.add(move |value: &f32| callback(*value))
    }

    pub fn on_status_changed<F>(&self, mut callback: F) -> ListenerId
    where
        F: FnMut(AnimationStatus) + 'static,
    {
        self.core
            .status_listeners
            .add(move |status: &AnimationStatus| callback(*status))
    }

    /// Listen for entry changes of the attached timeline
    pub fn on_timeline_event<F>(&self, callback: F) -> ListenerId
    where
        F: FnMut(&TimelineEvent) + 'static,
    {
        self.core.timeline_listeners.add(callback)
    }

    pub fn remove_value_listener(&self, id: ListenerId) -> bool {
        self.core.value_listeners.remove(id)
    }

    pub fn remove_status_listener(&self, id: ListenerId) -> bool {
        self.core.status_listeners.remove(id)
    }

    pub fn remove_timeline_listener(&self, id: ListenerId) -> bool {
        self.core.timeline_listeners.remove(id)
    }

    /// Stop ticking for good and drop all listeners
    ///
    /// Later mutating calls fail with `DisposedControllerUse`.
    pub fn dispose(&self) {
        if self.core.disposed.replace(true) {
            return;
        }

        let ticker = match self.core.state.try_borrow_mut() {
            Ok(mut state) => {
                state.drive = Drive::Idle;
                state.velocity = 0.0;
                state.ticker.take()
            }
            Err(_) => None,
        };
        if let Some(id) = ticker {
            self.core.handle.unregister(id);
        }

        self.core.value_listeners.clear();
        self.core.status_listeners.clear();
        self.core.timeline_listeners.clear();
        tracing::debug!("Disposed controller");
    }
}

impl Drop for AnimationController {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for AnimationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationController")
            .field("progress", &self.progress())
            .field("status", &self.status())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::AnimationScheduler;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn controller(scheduler: &AnimationScheduler, config: ControllerConfig) -> AnimationController {
        AnimationController::new(scheduler.handle(), config).unwrap()
    }

    fn record_statuses(controller: &AnimationController) -> Rc<RefCell<Vec<AnimationStatus>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        controller.on_status_changed(move |status| sink.borrow_mut().push(status));
        log
    }

    #[test]
    fn test_linear_run() {
        let scheduler = AnimationScheduler::new();
        let c = controller(&scheduler, ControllerConfig::new(ms(1000)));
        let statuses = record_statuses(&c);

        c.forward().unwrap();
        assert_eq!(scheduler.active_count(), 1);

        let mut seen = Vec::new();
        for _ in 0..4 {
            scheduler.advance(ms(250));
            seen.push(c.progress());
        }

        assert_eq!(seen, vec![0.25, 0.5, 0.75, 1.0]);
        assert_eq!(c.status(), AnimationStatus::Completed);
        assert_eq!(
            *statuses.borrow(),
            vec![AnimationStatus::Forward, AnimationStatus::Completed]
        );
        assert_eq!(scheduler.active_count(), 0);
        assert!(c.ticker().is_none());
    }

    #[test]
    fn test_completed_reported_once() {
        let scheduler = AnimationScheduler::new();
        let c = controller(&scheduler, ControllerConfig::new(ms(500)));
        let statuses = record_statuses(&c);

        c.forward().unwrap();
        for _ in 0..20 {
            scheduler.advance(ms(100));
        }

        let completed = statuses
            .borrow()
            .iter()
            .filter(|s| **s == AnimationStatus::Completed)
            .count();
        assert_eq!(completed, 1);
    }

    #[test]
    fn test_loop_wraps() {
        let scheduler = AnimationScheduler::new();
        let c = controller(
            &scheduler,
            ControllerConfig::new(ms(1000)).with_repeat(RepeatPolicy::Loop),
        );
        let values = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&values);
        c.on_value_changed(move |v| sink.borrow_mut().push(v));

        c.forward().unwrap();
        for _ in 0..30 {
            scheduler.advance(ms(100));
        }

        assert!(c.iteration() >= 2);
        assert!(c.is_animating());
        assert!(values.borrow().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_reverse_repeat_bounces() {
        let scheduler = AnimationScheduler::new();
        let c = controller(
            &scheduler,
            ControllerConfig::new(ms(1000))
                .with_repeat(RepeatPolicy::ReverseRepeat)
                .with_max_repeats(1),
        );
        let statuses = record_statuses(&c);

        c.forward().unwrap();
        scheduler.advance(ms(500));
        assert!((c.progress() - 0.5).abs() < 1e-6);

        scheduler.advance(ms(700));
        assert!((c.progress() - 0.8).abs() < 1e-5);
        assert_eq!(c.status(), AnimationStatus::Reverse);
        assert_eq!(c.direction(), Direction::Reverse);

        scheduler.advance(ms(1000));
        assert_eq!(c.progress(), 0.0);
        assert_eq!(c.status(), AnimationStatus::Dismissed);
        assert_eq!(
            *statuses.borrow(),
            vec![
                AnimationStatus::Forward,
                AnimationStatus::Reverse,
                AnimationStatus::Dismissed
            ]
        );
    }

    #[test]
    fn test_max_repeats_completes_loop() {
        let scheduler = AnimationScheduler::new();
        let c = controller(
            &scheduler,
            ControllerConfig::new(ms(100))
                .with_repeat(RepeatPolicy::Loop)
                .with_max_repeats(2),
        );

        c.forward().unwrap();
        scheduler.advance(ms(100));
        scheduler.advance(ms(100));
        assert_eq!(c.iteration(), 2);
        assert!(c.is_animating());

        scheduler.advance(ms(100));
        assert_eq!(c.progress(), 1.0);
        assert_eq!(c.status(), AnimationStatus::Completed);
    }

    #[test]
    fn test_stop_keeps_progress() {
        let scheduler = AnimationScheduler::new();
        let c = controller(&scheduler, ControllerConfig::new(ms(1000)));
        let statuses = record_statuses(&c);

        c.forward().unwrap();
        scheduler.advance(ms(300));
        c.stop().unwrap();

        let stopped_at = c.progress();
        assert!((stopped_at - 0.3).abs() < 1e-6);
        assert_eq!(c.status(), AnimationStatus::Idle);
        assert_eq!(scheduler.active_count(), 0);

        scheduler.advance(ms(300));
        assert_eq!(c.progress(), stopped_at);

        // Resumes from where it stopped, scaled to the remaining distance
        c.forward().unwrap();
        scheduler.advance(ms(700));
        assert_eq!(c.status(), AnimationStatus::Completed);
        assert_eq!(
            *statuses.borrow(),
            vec![
                AnimationStatus::Forward,
                AnimationStatus::Idle,
                AnimationStatus::Forward,
                AnimationStatus::Completed
            ]
        );
    }

    #[test]
    fn test_stop_when_not_running_is_noop() {
        let scheduler = AnimationScheduler::new();
        let c = controller(&scheduler, ControllerConfig::new(ms(100)));
        c.stop().unwrap();
        assert_eq!(c.status(), AnimationStatus::Idle);
    }

    #[test]
    fn test_restart_from_completed() {
        let scheduler = AnimationScheduler::new();
        let c = controller(&scheduler, ControllerConfig::new(ms(100)));

        c.forward().unwrap();
        scheduler.advance(ms(100));
        assert_eq!(c.status(), AnimationStatus::Completed);

        c.forward().unwrap();
        assert_eq!(c.progress(), 0.0);
        assert_eq!(c.status(), AnimationStatus::Forward);
    }

    #[test]
    fn test_reverse_uses_reverse_duration() {
        let scheduler = AnimationScheduler::new();
        let c = controller(
            &scheduler,
            ControllerConfig::new(ms(1000)).with_reverse_duration(ms(500)),
        );

        c.forward().unwrap();
        scheduler.advance(ms(1000));

        c.reverse().unwrap();
        scheduler.advance(ms(250));
        assert!((c.progress() - 0.5).abs() < 1e-6);

        scheduler.advance(ms(250));
        assert_eq!(c.progress(), 0.0);
        assert_eq!(c.status(), AnimationStatus::Dismissed);
    }

    #[test]
    fn test_reset() {
        let scheduler = AnimationScheduler::new();
        let c = controller(&scheduler, ControllerConfig::new(ms(1000)));
        c.forward().unwrap();
        scheduler.advance(ms(400));

        c.reset().unwrap();
        assert_eq!(c.progress(), 0.0);
        assert_eq!(c.status(), AnimationStatus::Dismissed);
        assert_eq!(scheduler.active_count(), 0);

        let c = controller(&scheduler, ControllerConfig::new(ms(1000)).reverse_initial());
        assert_eq!(c.progress(), 1.0);
        c.reset().unwrap();
        assert_eq!(c.progress(), 1.0);
    }

    #[test]
    fn test_animate_to() {
        let scheduler = AnimationScheduler::new();
        let c = controller(&scheduler, ControllerConfig::new(ms(1000)));

        // Half the distance takes half the configured duration
        c.animate_to(0.5, None).unwrap();
        scheduler.advance(ms(250));
        assert!((c.progress() - 0.25).abs() < 1e-6);
        scheduler.advance(ms(250));
        assert_eq!(c.progress(), 0.5);
        assert_eq!(c.status(), AnimationStatus::Completed);

        // Zero distance settles immediately
        c.animate_to(0.5, None).unwrap();
        assert_eq!(c.status(), AnimationStatus::Completed);
        assert!(c.ticker().is_none());

        c.animate_to(0.0, Some(ms(200))).unwrap();
        assert_eq!(c.status(), AnimationStatus::Reverse);
        scheduler.advance(ms(200));
        assert_eq!(c.progress(), 0.0);
        assert_eq!(c.status(), AnimationStatus::Dismissed);
    }

    #[test]
    fn test_animate_to_clamps_target() {
        let scheduler = AnimationScheduler::new();
        let c = controller(&scheduler, ControllerConfig::new(ms(100)));

        c.animate_to(3.0, None).unwrap();
        scheduler.advance(ms(100));
        assert_eq!(c.progress(), 1.0);
    }

    #[test]
    fn test_zero_durations_rejected() {
        let scheduler = AnimationScheduler::new();
        assert_eq!(
            AnimationController::new(scheduler.handle(), ControllerConfig::new(Duration::ZERO)).err(),
            Some(AnimationError::InvalidDuration(Duration::ZERO))
        );
        assert!(AnimationController::new(
            scheduler.handle(),
            ControllerConfig::new(ms(10)).with_reverse_duration(Duration::ZERO)
        )
        .is_err());

        let c = controller(&scheduler, ControllerConfig::new(ms(100)));
        assert_eq!(
            c.animate_to(1.0, Some(Duration::ZERO)),
            Err(AnimationError::InvalidDuration(Duration::ZERO))
        );
        assert_eq!(c.status(), AnimationStatus::Idle);
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_disposed_controller_rejects_use() {
        let scheduler = AnimationScheduler::new();
        let c = controller(&scheduler, ControllerConfig::new(ms(100)));

        c.dispose();
        c.dispose();
        assert!(c.is_disposed());

        assert_eq!(c.forward(), Err(AnimationError::DisposedControllerUse));
        assert_eq!(c.reset(), Err(AnimationError::DisposedControllerUse));
        assert_eq!(
            c.animate_to(1.0, None),
            Err(AnimationError::DisposedControllerUse)
        );
        assert_eq!(
            c.attach(Timeline::sequential()),
            Err(AnimationError::DisposedControllerUse)
        );
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_dispose_while_running_deregisters() {
        let scheduler = AnimationScheduler::new();
        let c = controller(&scheduler, ControllerConfig::new(ms(100)));
        c.forward().unwrap();
        assert_eq!(scheduler.active_count(), 1);

        drop(c);
        assert_eq!(scheduler.active_count(), 0);
        assert!(!scheduler.advance(ms(16)));
    }

    #[test]
    fn test_value_applies_curve() {
        let scheduler = AnimationScheduler::new();
        let c = controller(
            &scheduler,
            ControllerConfig::new(ms(1000)).with_curve(Curve::EaseInQuad),
        );

        c.forward().unwrap();
        scheduler.advance(ms(500));

        assert!((c.progress() - 0.5).abs() < 1e-6);
        assert!((c.value() - 0.25).abs() < 1e-6);
        assert!((c.velocity() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_fling_overshoots_and_completes() {
        let scheduler = AnimationScheduler::new();
        let c = controller(&scheduler, ControllerConfig::new(ms(300)));
        let max = Rc::new(Cell::new(0.0_f32));
        let sink = Rc::clone(&max);
        c.on_value_changed(move |v| sink.set(sink.get().max(v)));

        c.animate_to(0.3, Some(ms(10))).unwrap();
        scheduler.advance(ms(10));
        c.fling(5.0).unwrap();
        assert_eq!(c.status(), AnimationStatus::Forward);

        for _ in 0..300 {
            if !scheduler.advance(ms(16)) {
                break;
            }
        }

        assert_eq!(c.status(), AnimationStatus::Completed);
        assert_eq!(c.progress(), 1.0);
        assert!(max.get() > 1.0);
    }

    #[test]
    fn test_fling_negative_dismisses() {
        let scheduler = AnimationScheduler::new();
        let c = controller(&scheduler, ControllerConfig::new(ms(300)).reverse_initial());

        c.fling(-2.0).unwrap();
        assert_eq!(c.direction(), Direction::Reverse);
        for _ in 0..300 {
            scheduler.advance(ms(16));
        }

        assert_eq!(c.status(), AnimationStatus::Dismissed);
        assert_eq!(c.progress(), 0.0);
    }

    #[test]
    fn test_divergent_simulation_is_reported() {
        let scheduler = AnimationScheduler::new();
        let c = controller(&scheduler, ControllerConfig::default());
        let diagnostics = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&diagnostics);
        scheduler.on_diagnostic(move |d| sink.borrow_mut().push(d.clone()));

        let undamped = SpringSimulation::new(SpringConfig::new(100.0, 0.0, 1.0), 0.0, 1.0, 0.0)
            .unwrap()
            .with_max_ticks(10);
        c.animate_with(undamped).unwrap();
        let ticker = c.ticker();
        assert!(ticker.is_some());

        for _ in 0..10 {
            scheduler.advance(ms(16));
        }

        assert_eq!(c.status(), AnimationStatus::Completed);
        assert_eq!(c.progress(), 1.0);

        let diagnostics = diagnostics.borrow();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].ticker, ticker);
        assert!(matches!(
            diagnostics[0].error,
            AnimationError::SimulationDivergence { steps: 10, .. }
        ));
    }

    #[test]
    fn test_attached_timeline_follows_progress() {
        let scheduler = AnimationScheduler::new();
        let c = controller(&scheduler, ControllerConfig::new(ms(1000)));

        let mut timeline = Timeline::sequential();
        let first = timeline.add(ms(600));
        let second = timeline.add(ms(400));
        c.attach(timeline).unwrap();

        let events = Rc::new(Cell::new(0));
        let sink = Rc::clone(&events);
        c.on_timeline_event(move |_| sink.set(sink.get() + 1));

        c.forward().unwrap();
        scheduler.advance(ms(600));
        assert_eq!(c.with_timeline(|tl| tl.entry_progress(first)), Some(Some(1.0)));
        assert_eq!(c.with_timeline(|tl| tl.entry_progress(second)), Some(Some(0.0)));

        scheduler.advance(ms(400));
        assert_eq!(c.with_timeline(|tl| tl.entry_progress(second)), Some(Some(1.0)));
        assert_eq!(events.get(), 2);

        assert!(c.detach().is_some());
        assert!(c.with_timeline(|_| ()).is_none());
    }

    #[test]
    fn test_attach_reports_window_diagnostics() {
        let scheduler = AnimationScheduler::new();
        let c = controller(&scheduler, ControllerConfig::new(ms(1000)));
        let count = Rc::new(Cell::new(0));
        let sink = Rc::clone(&count);
        scheduler.on_diagnostic(move |_| sink.set(sink.get() + 1));

        let mut timeline = Timeline::parallel();
        timeline.add(ms(800));
        c.attach(timeline.with_duration(ms(500))).unwrap();

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_detached_handle_never_ticks() {
        let c = AnimationController::new(SchedulerHandle::detached(), ControllerConfig::default()).unwrap();
        c.forward().unwrap();
        assert!(c.ticker().is_none());
        assert_eq!(c.status(), AnimationStatus::Forward);
    }
}
