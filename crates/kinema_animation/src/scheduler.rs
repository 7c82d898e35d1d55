//! Animation scheduler
//!
//! Ticks every registered animation once per frame. The scheduler never owns
//! what it ticks: it keeps `Weak` references keyed by [`TickerId`], and the
//! application keeps the only strong reference. Animations that were dropped
//! or disposed are skipped and swept after the pass.
//!
//! Components receive a [`SchedulerHandle`] (weak as well) to register
//! themselves, deregister, and report [`Diagnostic`]s. Every handle operation
//! is a safe no-op once the scheduler is gone.

use crate::clock::FrameClock;
use crate::error::AnimationError;
use crate::listener::{ListenerId, Listeners};
use rustc_hash::FxHashSet;
use slotmap::{new_key_type, SlotMap};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

new_key_type! {
    /// Handle to a registered animation
    pub struct TickerId;
}

impl TickerId {
    /// Convert to a raw u64 (for logging or external bookkeeping)
    pub fn to_raw(self) -> u64 {
        self.0.as_ffi()
    }
}

/// What a tickable wants after a tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickFlow {
    /// Keep ticking next frame
    Continue,
    /// Done; remove after this pass
    Finished,
}

/// Something the scheduler can advance
///
/// Takes `&self` because the scheduler only ever sees a shared reference;
/// implementors keep their mutable state behind `Cell`/`RefCell`.
pub trait Tickable {
    /// Advance by `dt`. `id` is the key this target is registered under.
    fn advance(&self, id: TickerId, dt: Duration) -> TickFlow;

    /// Disposed targets are skipped and removed
    fn is_disposed(&self) -> bool {
        false
    }
}

/// A recoverable runtime condition reported to diagnostic listeners
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    /// The animation that hit the condition, if it is a registered one
    pub ticker: Option<TickerId>,
    pub error: AnimationError,
}

struct Entry {
    target: Weak<dyn Tickable>,
    active: bool,
}

struct SchedulerInner {
    entries: RefCell<SlotMap<TickerId, Entry>>,
    diagnostics: Listeners<Diagnostic>,
    in_pass: Cell<bool>,
    /// Set when registration ends an idle period
    woke: Cell<bool>,
    frame: Cell<u64>,
}

impl SchedulerInner {
    fn active_count(&self) -> usize {
        self.entries.borrow().values().filter(|e| e.active).count()
    }

    fn register(&self, target: Weak<dyn Tickable>) -> TickerId {
        let mut entries = self.entries.borrow_mut();
        if !entries.values().any(|e| e.active) {
            self.woke.set(true);
        }
        let id = entries.insert(Entry {
            target,
            active: true,
        });
        tracing::debug!("Registered ticker {:?} ({} total)", id, entries.len());
        id
    }

    fn unregister(&self, id: TickerId) -> bool {
        let mut entries = self.entries.borrow_mut();
        if self.in_pass.get() {
            // Removal waits for the sweep so the running pass stays consistent
            match entries.get_mut(id) {
                Some(entry) if entry.active => {
                    entry.active = false;
                    tracing::debug!("Deactivated ticker {:?} mid-pass", id);
                    true
                }
                _ => false,
            }
        } else {
            let removed = entries.remove(id).is_some_and(|entry| entry.active);
            if removed {
                tracing::debug!("Unregistered ticker {:?}", id);
            }
            removed
        }
    }

    fn is_registered(&self, id: TickerId) -> bool {
        self.entries.borrow().get(id).is_some_and(|e| e.active)
    }

    fn report(&self, ticker: Option<TickerId>, error: AnimationError) {
        tracing::warn!("Animation diagnostic (ticker {:?}): {}", ticker, error);
        self.diagnostics.notify(&Diagnostic { ticker, error });
    }
}

/// The animation scheduler that ticks all active animations
///
/// Owned by the application (typically next to its frame loop). Call
/// [`advance`](Self::advance) or [`tick`](Self::tick) once per frame.
pub struct AnimationScheduler {
    inner: Rc<SchedulerInner>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                entries: RefCell::new(SlotMap::with_key()),
                diagnostics: Listeners::new(),
                in_pass: Cell::new(false),
                woke: Cell::new(false),
                frame: Cell::new(0),
            }),
        }
    }

    /// Get a weak handle for registering animations
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Advance every active animation by `dt`
    ///
    /// Returns whether any animation is still active afterwards. Animations
    /// registered during the pass are first ticked on the next call; ones
    /// deregistered during the pass are not ticked again.
    pub fn advance(&self, dt: Duration) -> bool {
        let inner = &self.inner;
        let frame = inner.frame.get() + 1;
        inner.frame.set(frame);

        let snapshot: Vec<(TickerId, Weak<dyn Tickable>)> = inner
            .entries
            .borrow()
            .iter()
            .filter(|(_, e)| e.active)
            .map(|(id, e)| (id, e.target.clone()))
            .collect();

        if snapshot.is_empty() {
            return false;
        }

        tracing::trace!("Frame {}: advancing {} tickers by {:?}", frame, snapshot.len(), dt);

        let mut finished = FxHashSet::default();
        inner.in_pass.set(true);

        for (id, weak) in snapshot {
            if !inner.is_registered(id) {
                continue;
            }
            let Some(target) = weak.upgrade() else {
                tracing::trace!("Ticker {:?} was dropped, removing", id);
                finished.insert(id);
                continue;
            };
            if target.is_disposed() {
                tracing::trace!("Ticker {:?} was disposed, removing", id);
                finished.insert(id);
                continue;
            }
            // No scheduler borrow is held here: the target may register,
            // deregister or report freely
            if target.advance(id, dt) == TickFlow::Finished {
                finished.insert(id);
            }
        }

        inner.in_pass.set(false);

        let mut entries = inner.entries.borrow_mut();
        entries.retain(|id, entry| entry.active && !finished.contains(&id));
        entries.values().any(|e| e.active)
    }

    /// Pull `dt` from `clock` and advance
    pub fn tick(&self, clock: &mut dyn FrameClock) -> bool {
        if self.inner.woke.replace(false) {
            clock.reset();
        }
        let dt = clock.delta();
        self.advance(dt)
    }

    /// Register a tickable directly
    pub fn register<T: Tickable + 'static>(&self, target: &Rc<T>) -> TickerId {
        let target: Rc<dyn Tickable> = target.clone();
        self.inner.register(Rc::downgrade(&target))
    }

    pub fn unregister(&self, id: TickerId) -> bool {
        self.inner.unregister(id)
    }

    /// Number of registered animations that are still active
    pub fn active_count(&self) -> usize {
        self.inner.active_count()
    }

    /// Check if any animations are still active
    pub fn has_active_animations(&self) -> bool {
        self.active_count() > 0
    }

    /// Number of passes run so far
    pub fn frame(&self) -> u64 {
        self.inner.frame.get()
    }

    /// Listen for recoverable runtime conditions
    pub fn on_diagnostic<F>(&self, callback: F) -> ListenerId
    where
        F: FnMut(&Diagnostic) + 'static,
    {
        self.inner.diagnostics.add(callback)
    }

    pub fn remove_diagnostic_listener(&self, id: ListenerId) -> bool {
        self.inner.diagnostics.remove(id)
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AnimationScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationScheduler")
            .field("active", &self.active_count())
            .field("frame", &self.frame())
            .finish()
    }
}

/// A weak handle to the animation scheduler
///
/// This is passed to components that need to register animations.
/// It won't prevent the scheduler from being dropped.
#[derive(Clone, Default)]
pub struct SchedulerHandle {
    inner: Weak<SchedulerInner>,
}

impl SchedulerHandle {
    /// A handle not connected to any scheduler
    ///
    /// Animations built on it can be configured and sampled but never tick.
    pub fn detached() -> Self {
        Self { inner: Weak::new() }
    }

    /// Register a tickable; `None` if the scheduler is gone
    pub fn register<T: Tickable + 'static>(&self, target: &Rc<T>) -> Option<TickerId> {
        let inner = self.inner.upgrade()?;
        let target: Rc<dyn Tickable> = target.clone();
        Some(inner.register(Rc::downgrade(&target)))
    }

    /// Deregister; during a pass the entry is deactivated and swept afterwards
    pub fn unregister(&self, id: TickerId) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.unregister(id))
    }

    pub fn is_registered(&self, id: TickerId) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.is_registered(id))
    }

    /// Send a diagnostic to the scheduler's listeners
    pub fn report(&self, ticker: Option<TickerId>, error: AnimationError) {
        match self.inner.upgrade() {
            Some(inner) => inner.report(ticker, error),
            None => tracing::warn!("Animation diagnostic with no scheduler: {}", error),
        }
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const FRAME: Duration = Duration::from_millis(16);

    #[derive(Default)]
    struct Counter {
        ticks: Cell<u32>,
        limit: Option<u32>,
        disposed: Cell<bool>,
    }

    impl Counter {
        fn with_limit(limit: u32) -> Self {
            Self {
                limit: Some(limit),
                ..Default::default()
            }
        }
    }

    impl Tickable for Counter {
        fn advance(&self, _id: TickerId, _dt: Duration) -> TickFlow {
            let ticks = self.ticks.get() + 1;
            self.ticks.set(ticks);
            match self.limit {
                Some(limit) if ticks >= limit => TickFlow::Finished,
                _ => TickFlow::Continue,
            }
        }

        fn is_disposed(&self) -> bool {
            self.disposed.get()
        }
    }

    #[test]
    fn test_advance_ticks_registered() {
        let scheduler = AnimationScheduler::new();
        let counter = Rc::new(Counter::default());
        let id = scheduler.register(&counter);

        assert!(scheduler.advance(FRAME));
        assert!(scheduler.advance(FRAME));

        assert_eq!(counter.ticks.get(), 2);
        assert_eq!(scheduler.frame(), 2);
        assert!(scheduler.handle().is_registered(id));
    }

    #[test]
    fn test_finished_entry_is_removed() {
        let scheduler = AnimationScheduler::new();
        let counter = Rc::new(Counter::with_limit(2));
        scheduler.register(&counter);

        assert!(scheduler.advance(FRAME));
        assert!(!scheduler.advance(FRAME));
        assert!(!scheduler.advance(FRAME));

        assert_eq!(counter.ticks.get(), 2);
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_dropped_target_is_skipped() {
        let scheduler = AnimationScheduler::new();
        let kept = Rc::new(Counter::default());
        let dropped = Rc::new(Counter::default());
        scheduler.register(&kept);
        scheduler.register(&dropped);
        drop(dropped);

        assert_eq!(scheduler.active_count(), 2);
        scheduler.advance(FRAME);

        assert_eq!(kept.ticks.get(), 1);
        assert_eq!(scheduler.active_count(), 1);
    }

    #[test]
    fn test_disposed_target_is_skipped() {
        let scheduler = AnimationScheduler::new();
        let counter = Rc::new(Counter::default());
        scheduler.register(&counter);
        counter.disposed.set(true);

        assert!(!scheduler.advance(FRAME));
        assert_eq!(counter.ticks.get(), 0);
    }

    struct Spawner {
        handle: SchedulerHandle,
        child: Rc<Counter>,
        spawned: Cell<bool>,
    }

    impl Tickable for Spawner {
        fn advance(&self, _id: TickerId, _dt: Duration) -> TickFlow {
            if !self.spawned.replace(true) {
                self.handle.register(&self.child);
            }
            TickFlow::Continue
        }
    }

    #[test]
    fn test_register_during_pass_ticks_next_pass() {
        let scheduler = AnimationScheduler::new();
        let spawner = Rc::new(Spawner {
            handle: scheduler.handle(),
            child: Rc::new(Counter::default()),
            spawned: Cell::new(false),
        });
        scheduler.register(&spawner);

        scheduler.advance(FRAME);
        assert_eq!(spawner.child.ticks.get(), 0);
        assert_eq!(scheduler.active_count(), 2);

        scheduler.advance(FRAME);
        assert_eq!(spawner.child.ticks.get(), 1);
    }

    struct Remover {
        handle: SchedulerHandle,
        victim: Cell<Option<TickerId>>,
    }

    impl Tickable for Remover {
        fn advance(&self, _id: TickerId, _dt: Duration) -> TickFlow {
            if let Some(victim) = self.victim.take() {
                assert!(self.handle.unregister(victim));
                // Deactivated immediately, swept after the pass
                assert!(!self.handle.is_registered(victim));
            }
            TickFlow::Continue
        }
    }

    #[test]
    fn test_unregister_during_pass_skips_target() {
        let scheduler = AnimationScheduler::new();
        let remover = Rc::new(Remover {
            handle: scheduler.handle(),
            victim: Cell::new(None),
        });
        let victim = Rc::new(Counter::default());

        scheduler.register(&remover);
        let victim_id = scheduler.register(&victim);
        remover.victim.set(Some(victim_id));

        scheduler.advance(FRAME);

        assert_eq!(victim.ticks.get(), 0);
        assert_eq!(scheduler.active_count(), 1);
        assert!(!scheduler.unregister(victim_id));
    }

    #[test]
    fn test_handle_weak_reference() {
        let handle = {
            let scheduler = AnimationScheduler::new();
            scheduler.handle()
        };

        // Scheduler is dropped, handle should not be alive
        assert!(!handle.is_alive());

        // Operations should safely no-op
        let counter = Rc::new(Counter::default());
        assert!(handle.register(&counter).is_none());
        assert!(!handle.unregister(TickerId::default()));
        handle.report(None, AnimationError::DisposedControllerUse);
    }

    #[test]
    fn test_diagnostic_listener() {
        let scheduler = AnimationScheduler::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        let listener = scheduler.on_diagnostic(move |d| sink.borrow_mut().push(d.clone()));

        let error = AnimationError::SimulationDivergence {
            steps: 10,
            displacement: 5.0,
        };
        scheduler.handle().report(None, error.clone());
        assert_eq!(
            *seen.borrow(),
            vec![Diagnostic {
                ticker: None,
                error
            }]
        );

        assert!(scheduler.remove_diagnostic_listener(listener));
        scheduler.handle().report(None, AnimationError::DisposedControllerUse);
        assert_eq!(seen.borrow().len(), 1);
    }

    struct CountingClock {
        inner: ManualClock,
        resets: u32,
    }

    impl FrameClock for CountingClock {
        fn delta(&mut self) -> Duration {
            self.inner.delta()
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    #[test]
    fn test_tick_resets_clock_after_idle() {
        let scheduler = AnimationScheduler::new();
        let mut clock = CountingClock {
            inner: ManualClock::new(FRAME),
            resets: 0,
        };

        let first = Rc::new(Counter::with_limit(1));
        scheduler.register(&first);
        let second = Rc::new(Counter::default());
        scheduler.register(&second);

        scheduler.tick(&mut clock);
        scheduler.tick(&mut clock);
        assert_eq!(clock.resets, 1);
        assert_eq!(second.ticks.get(), 2);

        drop(second);
        scheduler.tick(&mut clock);
        assert!(!scheduler.has_active_animations());

        let third = Rc::new(Counter::default());
        scheduler.register(&third);
        scheduler.tick(&mut clock);
        assert_eq!(clock.resets, 2);
    }
}
