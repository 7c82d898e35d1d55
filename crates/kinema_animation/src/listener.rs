//! Listener registries
//!
//! Each registry hands out an opaque [`ListenerId`] per callback; the id is the
//! only thing needed to remove it again. Callbacks receive event data by
//! reference and never hold the object they observe.

use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Handle to a registered listener
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn to_raw(self) -> u64 {
        self.0
    }
}

type Callback<E> = Rc<RefCell<dyn FnMut(&E)>>;

/// Ordered set of callbacks for events of type `E`
///
/// Notification follows registration order. Callbacks may add or remove
/// listeners (including themselves) while being notified: a listener removed
/// mid-pass is not called for the rest of that pass, one added mid-pass is
/// first called on the next notification.
pub struct Listeners<E> {
    entries: RefCell<SmallVec<[(ListenerId, Callback<E>); 2]>>,
    next_id: Cell<u64>,
}

impl<E> Listeners<E> {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(SmallVec::new()),
            next_id: Cell::new(1),
        }
    }

    /// Register a callback
    pub fn add<F>(&self, callback: F) -> ListenerId
    where
        F: FnMut(&E) + 'static,
    {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let callback: Callback<E> = Rc::new(RefCell::new(callback));
        self.entries.borrow_mut().push((id, callback));
        id
    }

    /// Remove a callback; returns false if it was not registered
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.entries.borrow().iter().any(|(entry_id, _)| *entry_id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Invoke every registered callback with `event`
    pub fn notify(&self, event: &E) {
        if self.is_empty() {
            return;
        }

        // Snapshot so callbacks can mutate the registry
        let snapshot: SmallVec<[(ListenerId, Callback<E>); 4]> = self
            .entries
            .borrow()
            .iter()
            .map(|(id, cb)| (*id, Rc::clone(cb)))
            .collect();

        for (id, callback) in snapshot {
            if !self.contains(id) {
                continue;
            }
            match callback.try_borrow_mut() {
                Ok(mut callback) => (&mut *callback)(event),
                Err(_) => {
                    tracing::trace!("Listener {:?} is already running, skipping re-entrant call", id);
                }
            }
        }
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("len", &self.len()).finish()
    }
}
