//! Bookkeeping of scanned meshes from change notifications.
//!
//! Each id moves through a small state machine:
//!
//! ```text
//! Untracked --Added--> Tracked(0) --Updated--> Tracked(n + 1)
//!     ^                    |
//!     +------Removed-------+
//! ```
//!
//! Events that do not fit the current state are ignored. The tracker is
//! diagnostic only; extraction never reads it.

use std::collections::BTreeMap;
use std::sync::mpsc::Receiver;

use surface_planes::MeshId;
use tracing::debug;

use crate::provider::ObservationEvent;

/// A mesh known to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedMesh {
    /// Mesh id.
    pub id: MeshId,
    /// Updates seen since the mesh was added.
    pub update_count: u32,
}

/// Outcome of applying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The id started being tracked.
    Tracked(MeshId),
    /// The id's counter moved to the given value.
    Updated(MeshId, u32),
    /// The id stopped being tracked.
    Untracked(MeshId),
    /// The event did not apply to the id's current state.
    Ignored(ObservationEvent),
}

/// Registry of tracked mesh ids with per-id update counters.
///
/// # Example
///
/// ```
/// use surface_planes::MeshId;
/// use surface_scan::{ObservationEvent, ObservationTracker, Transition};
///
/// let mut tracker = ObservationTracker::new();
/// tracker.apply(ObservationEvent::Added(MeshId(7)));
/// tracker.apply(ObservationEvent::Updated(MeshId(7)));
///
/// assert_eq!(tracker.update_count(MeshId(7)), Some(1));
/// assert_eq!(
///     tracker.apply(ObservationEvent::Updated(MeshId(8))),
///     Transition::Ignored(ObservationEvent::Updated(MeshId(8)))
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct ObservationTracker {
    counts: BTreeMap<MeshId, u32>,
}

impl ObservationTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event.
    pub fn apply(&mut self, event: ObservationEvent) -> Transition {
        let transition = match event {
            ObservationEvent::Added(id) => {
                if self.counts.contains_key(&id) {
                    Transition::Ignored(event)
                } else {
                    self.counts.insert(id, 0);
                    Transition::Tracked(id)
                }
            }
            ObservationEvent::Updated(id) => match self.counts.get_mut(&id) {
                Some(count) => {
                    *count = count.saturating_add(1);
                    Transition::Updated(id, *count)
                }
                None => Transition::Ignored(event),
            },
            ObservationEvent::Removed(id) => {
                if self.counts.remove(&id).is_some() {
                    Transition::Untracked(id)
                } else {
                    Transition::Ignored(event)
                }
            }
        };

        debug!(?event, ?transition, tracked = self.counts.len(), "Observation");
        transition
    }

    /// Apply events in order.
    pub fn replay(&mut self, events: impl IntoIterator<Item = ObservationEvent>) {
        for event in events {
            self.apply(event);
        }
    }

    /// Apply every event already waiting on `events`, without blocking.
    ///
    /// Returns the number of events applied.
    pub fn drain(&mut self, events: &Receiver<ObservationEvent>) -> usize {
        let mut applied = 0;
        for event in events.try_iter() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Update counter of `id`, if tracked.
    #[must_use]
    pub fn update_count(&self, id: MeshId) -> Option<u32> {
        self.counts.get(&id).copied()
    }

    /// Check whether `id` is tracked.
    #[must_use]
    pub fn contains(&self, id: MeshId) -> bool {
        self.counts.contains_key(&id)
    }

    /// Number of tracked ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Tracked meshes in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = TrackedMesh> + '_ {
        self.counts.iter().map(|(&id, &update_count)| TrackedMesh { id, update_count })
    }

    /// Forget every id.
    pub fn clear(&mut self) {
        self.counts.clear();
    }
}
