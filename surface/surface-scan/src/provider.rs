//! The scanning platform as seen by the pipeline.
//!
//! [`ScanProvider`] covers exactly what surface passes need from a spatial
//! mesh observer: the current meshes, a stream of change notifications and
//! control over how the raw scan mesh is displayed.
//! [`MemoryScanProvider`] is an in-process implementation for hosts
//! without a device, and for tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use mesh_types::IndexedMesh;
use nalgebra::Isometry3;
use surface_planes::MeshId;
use tracing::debug;

use crate::sync::lock;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the scanner renders its raw mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DisplayMode {
    /// Drawn normally.
    #[default]
    Visible,
    /// Drawn only into depth, hiding what is behind it.
    Occlusion,
    /// Not drawn.
    None,
}

/// Change notification for one scanned mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ObservationEvent {
    /// A new mesh appeared.
    Added(MeshId),
    /// An existing mesh changed.
    Updated(MeshId),
    /// A mesh went away.
    Removed(MeshId),
}

impl ObservationEvent {
    /// The mesh the event is about.
    #[must_use]
    pub const fn id(&self) -> MeshId {
        match self {
            Self::Added(id) | Self::Updated(id) | Self::Removed(id) => *id,
        }
    }
}

/// One mesh as reported by the scanner.
///
/// `mesh` is `None` while the scanner has no geometry for the id yet.
#[derive(Debug, Clone)]
pub struct ScanMesh {
    /// Scanner-assigned id.
    pub id: MeshId,
    /// Shared geometry in local coordinates.
    pub mesh: Option<Arc<IndexedMesh>>,
    /// Local-to-world transform.
    pub transform: Isometry3<f64>,
}

impl ScanMesh {
    /// A mesh placed at the world origin.
    #[must_use]
    pub fn new(id: MeshId, mesh: IndexedMesh) -> Self {
        Self {
            id,
            mesh: Some(Arc::new(mesh)),
            transform: Isometry3::identity(),
        }
    }

    /// An entry with no geometry yet.
    #[must_use]
    pub fn pending(id: MeshId) -> Self {
        Self {
            id,
            mesh: None,
            transform: Isometry3::identity(),
        }
    }

    /// Set the local-to-world transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Isometry3<f64>) -> Self {
        self.transform = transform;
        self
    }
}

/// Source of scanned meshes.
pub trait ScanProvider {
    /// Snapshot of all current meshes, or `None` when no observer is
    /// available.
    fn meshes(&self) -> Option<Vec<ScanMesh>>;

    /// Subscribe to change notifications, or `None` when no observer is
    /// available.
    fn subscribe(&self) -> Option<Receiver<ObservationEvent>>;

    /// Change how the raw scan mesh is displayed.
    fn set_display_mode(&self, mode: DisplayMode);
}

impl<P: ScanProvider + ?Sized> ScanProvider for Arc<P> {
    fn meshes(&self) -> Option<Vec<ScanMesh>> {
        (**self).meshes()
    }

    fn subscribe(&self) -> Option<Receiver<ObservationEvent>> {
        (**self).subscribe()
    }

    fn set_display_mode(&self, mode: DisplayMode) {
        (**self).set_display_mode(mode);
    }
}

/// Source of the height planes are classified against.
pub trait ReferenceHeightProvider {
    /// World height, typically the viewer's head.
    fn reference_height(&self) -> f64;
}

/// A reference height that never changes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FixedReferenceHeight(pub f64);

impl ReferenceHeightProvider for FixedReferenceHeight {
    fn reference_height(&self) -> f64 {
        self.0
    }
}

impl<F: Fn() -> f64> ReferenceHeightProvider for F {
    fn reference_height(&self) -> f64 {
        self()
    }
}

/// In-memory scan provider.
///
/// Meshes are kept in id order. Inserting or removing a mesh notifies every
/// live subscriber; subscribers whose receiver was dropped are pruned.
///
/// # Example
///
/// ```
/// use mesh_types::IndexedMesh;
/// use surface_planes::MeshId;
/// use surface_scan::{MemoryScanProvider, ObservationEvent, ScanProvider};
///
/// let provider = MemoryScanProvider::new();
/// let events = provider.subscribe().unwrap();
///
/// provider.insert(MeshId(4), IndexedMesh::new());
/// provider.insert(MeshId(4), IndexedMesh::new());
/// provider.remove(MeshId(4));
///
/// let seen: Vec<_> = events.try_iter().collect();
/// assert_eq!(
///     seen,
///     vec![
///         ObservationEvent::Added(MeshId(4)),
///         ObservationEvent::Updated(MeshId(4)),
///         ObservationEvent::Removed(MeshId(4)),
///     ]
/// );
/// ```
#[derive(Debug)]
pub struct MemoryScanProvider {
    meshes: Mutex<BTreeMap<MeshId, ScanMesh>>,
    subscribers: Mutex<Vec<Sender<ObservationEvent>>>,
    display_mode: Mutex<DisplayMode>,
    available: AtomicBool,
}

impl Default for MemoryScanProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScanProvider {
    /// Create an empty, available provider.
    #[must_use]
    pub fn new() -> Self {
        Self {
            meshes: Mutex::new(BTreeMap::new()),
            subscribers: Mutex::new(Vec::new()),
            display_mode: Mutex::new(DisplayMode::Visible),
            available: AtomicBool::new(true),
        }
    }

    /// Add or replace a mesh placed at the world origin.
    pub fn insert(&self, id: MeshId, mesh: IndexedMesh) {
        self.insert_scan(ScanMesh::new(id, mesh));
    }

    /// Add or replace a mesh entry, emitting `Added` or `Updated`.
    pub fn insert_scan(&self, scan: ScanMesh) {
        let id = scan.id;
        let existed = lock(&self.meshes, "provider meshes")
            .insert(id, scan)
            .is_some();
        self.notify(if existed {
            ObservationEvent::Updated(id)
        } else {
            ObservationEvent::Added(id)
        });
    }

    /// Remove a mesh, emitting `Removed` if it was present.
    pub fn remove(&self, id: MeshId) -> bool {
        let removed = lock(&self.meshes, "provider meshes")
            .remove(&id)
            .is_some();
        if removed {
            self.notify(ObservationEvent::Removed(id));
        }
        removed
    }

    /// Emit an event without touching the stored meshes.
    pub fn notify(&self, event: ObservationEvent) {
        let mut subscribers = lock(&self.subscribers, "provider subscribers");
        subscribers.retain(|tx| tx.send(event).is_ok());
        debug!(?event, subscribers = subscribers.len(), "Provider event");
    }

    /// Make the observer appear present or absent.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Whether the observer is present.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Current display mode of the raw scan mesh.
    #[must_use]
    pub fn display_mode(&self) -> DisplayMode {
        *lock(&self.display_mode, "provider display mode")
    }

    /// Number of stored meshes.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.meshes, "provider meshes").len()
    }

    /// Check whether no meshes are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScanProvider for MemoryScanProvider {
    fn meshes(&self) -> Option<Vec<ScanMesh>> {
        if !self.is_available() {
            return None;
        }
        Some(
            lock(&self.meshes, "provider meshes")
                .values()
                .cloned()
                .collect(),
        )
    }

    fn subscribe(&self) -> Option<Receiver<ObservationEvent>> {
        if !self.is_available() {
            return None;
        }
        let (tx, rx) = mpsc::channel();
        lock(&self.subscribers, "provider subscribers").push(tx);
        Some(rx)
    }

    fn set_display_mode(&self, mode: DisplayMode) {
        *lock(&self.display_mode, "provider display mode") = mode;
    }
}
