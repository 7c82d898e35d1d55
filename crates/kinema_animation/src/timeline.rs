//! Timeline composition
//!
//! A [`Timeline`] lays out child entries along one parent span and maps a
//! single parent progress value onto each child's local progress:
//!
//! ```text
//! local = clamp((t · total − start) / duration, 0, 1)
//! ```
//!
//! Entries are placed sequentially, in parallel, or staggered by a fixed
//! delay. An entry may be a nested timeline with its own layout. Timelines hold
//! no time of their own; drive them by attaching to an
//! [`AnimationController`](crate::controller::AnimationController) or by
//! calling [`Timeline::seek`].

use crate::curve::Curve;
use crate::error::AnimationError;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::time::Duration;

new_key_type! {
    pub struct TimelineEntryId;
}

/// Local progress this close to a bound snaps onto it
const WINDOW_EPSILON: f64 = 1e-6;

/// How entries are laid out along the parent span
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Composition {
    /// Each entry starts where the previous one ends
    Sequential,
    /// Every entry starts at zero
    Parallel,
    /// Entry `i` starts at `i × delay`; entries may overlap
    Staggered(Duration),
}

/// Where an entry is relative to its window
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    /// Window not reached
    #[default]
    Pending,
    /// Inside the window
    Active,
    /// Window passed; local progress is 1
    Done,
}

/// A change to one entry produced by [`Timeline::seek`]
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineEvent {
    pub entry: TimelineEntryId,
    /// Enclosing nested-timeline entries, outermost first
    pub parents: SmallVec<[TimelineEntryId; 2]>,
    /// Local progress in `[0, 1]`
    pub progress: f32,
    /// Local progress with the entry's curve applied
    pub value: f32,
    pub status: EntryStatus,
    pub previous: EntryStatus,
}

impl TimelineEvent {
    pub fn is_status_change(&self) -> bool {
        self.status != self.previous
    }

    /// Nesting depth, 0 for entries of the outermost timeline
    pub fn depth(&self) -> usize {
        self.parents.len()
    }
}

/// An entry in a timeline
#[derive(Clone, Debug)]
struct TimelineEntry {
    start: Duration,
    duration: Duration,
    curve: Curve,
    progress: f32,
    status: EntryStatus,
    nested: Option<Box<Timeline>>,
}

impl TimelineEntry {
    fn end(&self) -> Duration {
        self.start + self.duration
    }

    /// Local progress and status at `now` nanoseconds into the parent span
    fn local_at(&self, now: f64) -> (f32, EntryStatus) {
        let start = self.start.as_nanos() as f64;
        let length = self.duration.as_nanos() as f64;

        let local = if length <= 0.0 {
            if now >= start {
                1.0
            } else {
                0.0
            }
        } else {
            let raw = (now - start) / length;
            if raw <= WINDOW_EPSILON {
                0.0
            } else if raw >= 1.0 - WINDOW_EPSILON {
                1.0
            } else {
                raw
            }
        };

        let status = if local >= 1.0 {
            EntryStatus::Done
        } else if local > 0.0 {
            EntryStatus::Active
        } else {
            EntryStatus::Pending
        };
        (local as f32, status)
    }
}

/// A timeline that orchestrates multiple animations
///
/// # Example
///
/// ```rust
/// use kinema_animation::Timeline;
/// use std::time::Duration;
///
/// let mut timeline = Timeline::staggered(Duration::from_millis(50));
/// let ids: Vec<_> = (0..4).map(|_| timeline.add(Duration::from_millis(200))).collect();
///
/// assert_eq!(timeline.duration(), Duration::from_millis(350));
///
/// timeline.seek(1.0);
/// assert_eq!(timeline.entry_progress(ids[3]), Some(1.0));
/// ```
#[derive(Clone, Debug)]
pub struct Timeline {
    mode: Composition,
    entries: SlotMap<TimelineEntryId, TimelineEntry>,
    order: Vec<TimelineEntryId>,
    declared: Option<Duration>,
    progress: f32,
    diagnostics: Vec<AnimationError>,
}

impl Timeline {
    pub fn new(mode: Composition) -> Self {
        Self {
            mode,
            entries: SlotMap::with_key(),
            order: Vec::new(),
            declared: None,
            progress: 0.0,
            diagnostics: Vec::new(),
        }
    }

    pub fn sequential() -> Self {
        Self::new(Composition::Sequential)
    }

    pub fn parallel() -> Self {
        Self::new(Composition::Parallel)
    }

    pub fn staggered(delay: Duration) -> Self {
        Self::new(Composition::Staggered(delay))
    }

    /// Declare the parent span explicitly
    ///
    /// Entries are not moved or rescaled to fit. An entry that ends after
    /// `total` is truncated and recorded in [`diagnostics`](Self::diagnostics).
    pub fn with_duration(mut self, total: Duration) -> Self {
        self.declared = Some(total);
        self.diagnostics.clear();
        for index in 0..self.order.len() {
            self.check_window(index);
        }
        self
    }

    /// Add an entry in the next slot of the layout
    pub fn add(&mut self, duration: Duration) -> TimelineEntryId {
        self.insert(Duration::ZERO, duration, Curve::Linear, None)
    }

    /// Add an entry whose [`TimelineEvent::value`] is shaped by `curve`
    pub fn add_with_curve(&mut self, duration: Duration, curve: Curve) -> TimelineEntryId {
        self.insert(Duration::ZERO, duration, curve, None)
    }

    /// Add an entry delayed by `offset`
    ///
    /// In a parallel timeline this is an explicit window `[offset, offset +
    /// duration]`. In sequential and staggered timelines the offset is a delay
    /// on top of the entry's slot; later sequential entries start after it.
    pub fn add_at(&mut self, offset: Duration, duration: Duration) -> TimelineEntryId {
        self.insert(offset, duration, Curve::Linear, None)
    }

    /// Nest a timeline as one entry spanning its own duration
    pub fn add_timeline(&mut self, timeline: Timeline) -> TimelineEntryId {
        let duration = timeline.duration();
        self.insert(Duration::ZERO, duration, Curve::Linear, Some(Box::new(timeline)))
    }

    fn insert(
        &mut self,
        offset: Duration,
        duration: Duration,
        curve: Curve,
        nested: Option<Box<Timeline>>,
    ) -> TimelineEntryId {
        let start = self.slot_start() + offset;
        let id = self.entries.insert(TimelineEntry {
            start,
            duration,
            curve,
            progress: 0.0,
            status: EntryStatus::Pending,
            nested,
        });
        self.order.push(id);
        self.check_window(self.order.len() - 1);
        id
    }

    fn slot_start(&self) -> Duration {
        match self.mode {
            Composition::Sequential => self.natural_duration(),
            Composition::Parallel => Duration::ZERO,
            Composition::Staggered(delay) => delay.saturating_mul(self.order.len() as u32),
        }
    }

    fn check_window(&mut self, index: usize) {
        let Some(span) = self.declared else {
            return;
        };
        let Some(entry) = self.order.get(index).and_then(|id| self.entries.get(*id)) else {
            return;
        };
        if entry.end() <= span {
            return;
        }

        let error = AnimationError::InvalidCompositionWindow {
            entry: index,
            start: entry.start,
            end: entry.end(),
            span,
        };
        if entry.start >= span {
            tracing::warn!("Timeline entry {} never starts: {}", index, error);
        } else {
            tracing::warn!("Timeline entry {} is truncated: {}", index, error);
        }
        self.diagnostics.push(error);
    }

    pub fn mode(&self) -> Composition {
        self.mode
    }

    /// The parent span: the declared duration if any, else the natural one
    pub fn duration(&self) -> Duration {
        self.declared.unwrap_or_else(|| self.natural_duration())
    }

    /// Latest end over all entries
    pub fn natural_duration(&self) -> Duration {
        self.entries
            .values()
            .map(TimelineEntry::end)
            .max()
            .unwrap_or(Duration::ZERO)
    }

    pub fn declared_duration(&self) -> Option<Duration> {
        self.declared
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entry ids in declaration order
    pub fn entry_ids(&self) -> impl Iterator<Item = TimelineEntryId> + '_ {
        self.order.iter().copied()
    }

    /// Absolute start offset and duration of an entry
    pub fn entry_span(&self, id: TimelineEntryId) -> Option<(Duration, Duration)> {
        self.entries.get(id).map(|e| (e.start, e.duration))
    }

    /// Normalized `[start, end]` of an entry within the parent span
    ///
    /// `end` exceeds 1 for a truncated entry.
    pub fn window(&self, id: TimelineEntryId) -> Option<(f32, f32)> {
        let entry = self.entries.get(id)?;
        let total = self.duration().as_secs_f64();
        if total <= 0.0 {
            return Some((0.0, 0.0));
        }
        let start = entry.start.as_secs_f64() / total;
        let end = entry.end().as_secs_f64() / total;
        Some((start as f32, end as f32))
    }

    pub fn entry_progress(&self, id: TimelineEntryId) -> Option<f32> {
        self.entries.get(id).map(|e| e.progress)
    }

    /// Entry progress with the entry's curve applied
    pub fn entry_value(&self, id: TimelineEntryId) -> Option<f32> {
        self.entries.get(id).map(|e| e.curve.transform(e.progress))
    }

    pub fn entry_status(&self, id: TimelineEntryId) -> Option<EntryStatus> {
        self.entries.get(id).map(|e| e.status)
    }

    pub fn nested(&self, id: TimelineEntryId) -> Option<&Timeline> {
        self.entries.get(id).and_then(|e| e.nested.as_deref())
    }

    pub fn nested_mut(&mut self, id: TimelineEntryId) -> Option<&mut Timeline> {
        self.entries.get_mut(id).and_then(|e| e.nested.as_deref_mut())
    }

    /// Last progress passed to [`seek`](Self::seek)
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Window problems found while building this timeline
    pub fn diagnostics(&self) -> &[AnimationError] {
        &self.diagnostics
    }

    /// Diagnostics of this timeline followed by those of nested timelines
    pub fn all_diagnostics(&self) -> Vec<AnimationError> {
        let mut out = self.diagnostics.clone();
        for id in &self.order {
            if let Some(nested) = self.nested(*id) {
                out.extend(nested.all_diagnostics());
            }
        }
        out
    }

    /// Move every entry to parent progress `progress`
    ///
    /// Returns one event per entry whose progress or status changed, in
    /// declaration order, depth-first through nested timelines.
    pub fn seek(&mut self, progress: f32) -> Vec<TimelineEvent> {
        let mut events = Vec::new();
        let mut parents = SmallVec::new();
        self.seek_into(progress, &mut parents, &mut events);
        events
    }

    fn seek_into(
        &mut self,
        progress: f32,
        parents: &mut SmallVec<[TimelineEntryId; 2]>,
        events: &mut Vec<TimelineEvent>,
    ) {
        let t = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        self.progress = t;

        let total = self.duration().as_nanos() as f64;
        let now = if t >= 1.0 { total } else { total * t as f64 };

        for &id in &self.order {
            let Some(entry) = self.entries.get_mut(id) else {
                continue;
            };

            let (local, status) = entry.local_at(now);
            let previous = entry.status;
            if local != entry.progress || status != previous {
                entry.progress = local;
                entry.status = status;
                events.push(TimelineEvent {
                    entry: id,
                    parents: parents.clone(),
                    progress: local,
                    value: entry.curve.transform(local),
                    status,
                    previous,
                });
            }

            if let Some(nested) = entry.nested.as_mut() {
                parents.push(id);
                nested.seek_into(local, parents, events);
                parents.pop();
            }
        }
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::sequential()
    }
}
