//! Kinema Animation Engine
//!
//! Time-driven progress, curves, typed interpolation, timeline composition,
//! and physics simulations. The engine consumes a frame delta and produces
//! sampled values plus status events; it never renders.
//!
//! # Features
//!
//! - **Controllers**: forward/reverse runs, looping, animate-to, fling
//! - **Curves**: named easings, cubic bezier, intervals, custom functions
//! - **Tweens and Keyframes**: typed interpolation of scalars, offsets and colors
//! - **Timelines**: sequential, parallel and staggered composition, nestable
//! - **Physics**: interruptible springs and friction decay
//! - **Scheduler**: single-threaded ticking with weak ownership of animations
//!
//! # Example
//!
//! ```rust
//! use kinema_animation::{AnimationController, AnimationScheduler, ControllerConfig, Curve, Timeline};
//! use std::time::Duration;
//!
//! let scheduler = AnimationScheduler::new();
//! let controller = AnimationController::new(
//!     scheduler.handle(),
//!     ControllerConfig::new(Duration::from_millis(1000)).with_curve(Curve::EaseInOut),
//! )
//! .unwrap();
//!
//! let mut intro = Timeline::sequential();
//! let fade = intro.add(Duration::from_millis(600));
//! let slide = intro.add(Duration::from_millis(400));
//! controller.attach(intro).unwrap();
//!
//! controller.forward().unwrap();
//! scheduler.advance(Duration::from_millis(600));
//!
//! assert_eq!(controller.with_timeline(|tl| tl.entry_progress(fade)), Some(Some(1.0)));
//! assert_eq!(controller.with_timeline(|tl| tl.entry_progress(slide)), Some(Some(0.0)));
//! ```

pub mod animated;
pub mod clock;
pub mod controller;
pub mod curve;
pub mod decay;
pub mod error;
pub mod listener;
pub mod scheduler;
pub mod spring;
pub mod timeline;
pub mod tween;
pub mod values;

pub use animated::{Animated, AnimatedSpring};
pub use clock::{FrameClock, ManualClock, SystemClock};
pub use controller::{
    AnimationController, AnimationStatus, ControllerConfig, Direction, InitialProgress, RepeatPolicy,
};
pub use curve::{Curve, CustomCurve};
pub use decay::FrictionSimulation;
pub use error::{AnimationError, Result};
pub use listener::{ListenerId, Listeners};
pub use scheduler::{AnimationScheduler, Diagnostic, SchedulerHandle, TickFlow, Tickable, TickerId};
pub use spring::{Integrator, SettleTolerance, Simulation, SimulationStep, SpringConfig, SpringSimulation};
pub use timeline::{Composition, EntryStatus, Timeline, TimelineEntryId, TimelineEvent};
pub use tween::{Keyframe, Keyframes, Tween};
pub use values::{Interpolate, Step};
