//! Typed animated values
//!
//! [`Animated<T>`] pairs an [`AnimationController`] with a [`Tween`] or
//! [`Keyframes`] so listeners receive typed values instead of raw progress.
//! [`AnimatedSpring`] is a retargetable spring value ticked by the scheduler
//! directly, with no controller in between.

use crate::controller::AnimationController;
use crate::error::Result;
use crate::listener::{ListenerId, Listeners};
use crate::scheduler::{SchedulerHandle, TickFlow, Tickable, TickerId};
use crate::spring::{SettleTolerance, Simulation, SimulationStep, SpringConfig, SpringSimulation};
use crate::tween::{Keyframes, Tween};
use crate::values::Interpolate;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

enum Source<T: Interpolate> {
    Tween(Tween<T>),
    Keyframes { frames: Keyframes<T>, fallback: T },
}

impl<T: Interpolate> Source<T> {
    fn at(&self, t: f32) -> T {
        match self {
            Source::Tween(tween) => tween.lerp(t),
            Source::Keyframes { frames, fallback } => {
                frames.sample(t).unwrap_or_else(|| fallback.clone())
            }
        }
    }
}

/// A typed value driven by a controller
///
/// The controller's value (curve applied) is mapped through the tween or
/// keyframes. Control playback through [`controller`](Self::controller).
///
/// # Example
///
/// ```rust
/// use kinema_animation::{Animated, AnimationController, AnimationScheduler, ControllerConfig, Tween};
/// use kinema_core::Offset;
/// use std::time::Duration;
///
/// let scheduler = AnimationScheduler::new();
/// let controller =
///     AnimationController::new(scheduler.handle(), ControllerConfig::new(Duration::from_millis(200)))
///         .unwrap();
/// let slide = Animated::new(controller, Tween::new(Offset::ZERO, Offset::new(100.0, 0.0)));
///
/// slide.controller().forward().unwrap();
/// scheduler.advance(Duration::from_millis(100));
///
/// assert_eq!(slide.current_value(), Offset::new(50.0, 0.0));
/// ```
pub struct Animated<T: Interpolate + 'static> {
    controller: AnimationController,
    source: Rc<Source<T>>,
}

impl<T: Interpolate + 'static> Animated<T> {
    pub fn new(controller: AnimationController, tween: Tween<T>) -> Self {
        Self {
            controller,
            source: Rc::new(Source::Tween(tween)),
        }
    }

    /// Drive a keyframe sequence; `None` if it has no keyframes
    pub fn with_keyframes(controller: AnimationController, frames: Keyframes<T>) -> Option<Self> {
        let fallback = frames.frames().first()?.value.clone();
        Some(Self {
            controller,
            source: Rc::new(Source::Keyframes { frames, fallback }),
        })
    }

    pub fn current_value(&self) -> T {
        self.source.at(self.controller.value())
    }

    /// Listen for typed value changes
    pub fn on_value_changed<F>(&self, mut callback: F) -> ListenerId
    where
        F: FnMut(&T) + 'static,
    {
        let source = Rc::clone(&self.source);
        self.controller.on_value_changed(move |value| {
            let typed = source.at(value);
            callback(&typed);
        })
    }

    pub fn remove_value_listener(&self, id: ListenerId) -> bool {
        self.controller.remove_value_listener(id)
    }

    pub fn controller(&self) -> &AnimationController {
        &self.controller
    }

    pub fn into_controller(self) -> AnimationController {
        self.controller
    }
}

impl<T: Interpolate + fmt::Debug + 'static> fmt::Debug for Animated<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animated")
            .field("value", &self.current_value())
            .field("controller", &self.controller)
            .finish()
    }
}

struct SpringCore {
    sim: RefCell<SpringSimulation>,
    handle: SchedulerHandle,
    ticker: Cell<Option<TickerId>>,
    disposed: Cell<bool>,
    value_listeners: Listeners<f32>,
    settled_listeners: Listeners<f32>,
}

impl Tickable for SpringCore {
    fn advance(&self, id: TickerId, dt: Duration) -> TickFlow {
        if self.ticker.get() != Some(id) {
            return TickFlow::Finished;
        }

        let (step, value) = {
            let Ok(mut sim) = self.sim.try_borrow_mut() else {
                return TickFlow::Continue;
            };
            let step = sim.step(dt.as_secs_f32());
            (step, sim.position())
        };

        self.value_listeners.notify(&value);
        match step {
            SimulationStep::Running => TickFlow::Continue,
            SimulationStep::Settled | SimulationStep::Diverged(_) => {
                self.ticker.set(None);
                self.handle.unregister(id);
                if let SimulationStep::Diverged(error) = step {
                    self.handle.report(Some(id), error);
                }
                self.settled_listeners.notify(&value);
                TickFlow::Finished
            }
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

/// A spring-animated value
///
/// Retargeting mid-flight keeps the current velocity. The spring registers
/// with the scheduler when it has somewhere to go and deregisters once it
/// settles.
pub struct AnimatedSpring {
    core: Rc<SpringCore>,
}

impl AnimatedSpring {
    /// A spring resting at `initial`
    pub fn new(handle: SchedulerHandle, initial: f32, config: SpringConfig) -> Result<Self> {
        let sim = SpringSimulation::at_rest(config, initial)?;
        Ok(Self {
            core: Rc::new(SpringCore {
                sim: RefCell::new(sim),
                handle,
                ticker: Cell::new(None),
                disposed: Cell::new(false),
                value_listeners: Listeners::new(),
                settled_listeners: Listeners::new(),
            }),
        })
    }

    pub fn with_tolerance(self, tolerance: SettleTolerance) -> Self {
        self.core.sim.replace_with(|sim| sim.clone().with_tolerance(tolerance));
        self
    }

    /// Move the spring's equilibrium
    pub fn set_target(&self, target: f32) {
        let moving = {
            let mut sim = self.core.sim.borrow_mut();
            sim.set_target(target);
            !sim.is_done()
        };
        if moving && self.core.ticker.get().is_none() {
            self.core.ticker.set(self.core.handle.register(&self.core));
        }
    }

    /// Jump to `value` and stop
    pub fn snap_to(&self, value: f32) {
        self.core.sim.borrow_mut().snap_to(value);
        if let Some(id) = self.core.ticker.take() {
            self.core.handle.unregister(id);
        }
        self.core.value_listeners.notify(&value);
    }

    pub fn value(&self) -> f32 {
        self.core.sim.borrow().position()
    }

    pub fn velocity(&self) -> f32 {
        self.core.sim.borrow().velocity()
    }

    pub fn target(&self) -> f32 {
        self.core.sim.borrow().target()
    }

    pub fn is_settled(&self) -> bool {
        self.core.sim.borrow().is_done()
    }

    pub fn on_value_changed<F>(&self, mut callback: F) -> ListenerId
    where
        F: FnMut(f32) + 'static,
    {
        self.core.value_listeners.add(move |value: &f32| callback(*value))
    }

    /// Called with the resting value each time the spring settles
    pub fn on_settled<F>(&self, mut callback: F) -> ListenerId
    where
        F: FnMut(f32) + 'static,
    {
        self.core.settled_listeners.add(move |value: &f32| callback(*value))
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.core.value_listeners.remove(id) || self.core.settled_listeners.remove(id)
    }
}

impl Drop for AnimatedSpring {
    fn drop(&mut self) {
        self.core.disposed.set(true);
        if let Some(id) = self.core.ticker.take() {
            self.core.handle.unregister(id);
        }
    }
}

impl fmt::Debug for AnimatedSpring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatedSpring")
            .field("value", &self.value())
            .field("target", &self.target())
            .field("settled", &self.is_settled())
            .finish()
    }
}
