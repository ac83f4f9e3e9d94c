//! Room scanning pipeline around plane extraction.
//!
//! This crate connects a spatial mesh scanner to
//! [`surface_planes`]: it snapshots scanned meshes, runs extraction and
//! classification one pass at a time, and keeps the latest labelled
//! surfaces ready for rendering.
//!
//! - **Provider** - What the pipeline needs from the scanning platform
//! - **Collector** - Copy usable meshes and recompute their normals
//! - **Tracker** - Follow add/update/remove notifications per mesh
//! - **Registry** - Current generation of classified surfaces
//! - **Scanner** - Session toggle, cancellable passes, render view
//!
//! # Quick Start
//!
//! ```
//! use mesh_types::{IndexedMesh, Vertex};
//! use surface_planes::MeshId;
//! use surface_scan::{
//!     FixedReferenceHeight, MemoryScanProvider, ScannerConfig, SurfaceScanner, ToggleOutcome,
//! };
//!
//! let provider = MemoryScanProvider::new();
//! let scanner =
//!     SurfaceScanner::new(provider, FixedReferenceHeight(0.0), ScannerConfig::default()).unwrap();
//!
//! // Meshes stream in while the user walks around
//! scanner.provider().insert(
//!     MeshId(1),
//!     IndexedMesh::from_parts(
//!         vec![
//!             Vertex::from_coords(0.0, -1.5, 0.0),
//!             Vertex::from_coords(0.0, -1.5, 3.0),
//!             Vertex::from_coords(4.0, -1.5, 3.0),
//!             Vertex::from_coords(4.0, -1.5, 0.0),
//!         ],
//!         vec![[0, 1, 2], [0, 2, 3]],
//!     ),
//! );
//! scanner.process_observations();
//!
//! if let ToggleOutcome::Started(report) = scanner.toggle_scanning().unwrap() {
//!     println!("{}", report);
//! }
//!
//! for slab in scanner.surface_instances() {
//!     println!("{} at {:?}", slab.label, slab.center);
//! }
//! ```
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`provider`] | Scan provider contract and in-memory provider |
//! | [`collector`] | Mesh snapshotting |
//! | [`tracker`] | Observation bookkeeping |
//! | [`session`] | Session state and cancellation |
//! | [`registry`] | Surface generations and render view |
//! | [`config`] | Scanner configuration |
//! | [`scanner`] | Pipeline control |

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)] // Accessors on the scanner are self-explanatory
#![allow(clippy::missing_const_for_fn)] // Not all functions benefit from const

pub mod collector;
pub mod config;
pub mod error;
pub mod provider;
pub mod registry;
pub mod scanner;
pub mod session;
mod sync;
pub mod tracker;

pub use collector::{CollectedFragments, collect_fragments};
pub use config::ScannerConfig;
pub use error::{ScanError, ScanResult};
pub use provider::{
    DisplayMode, FixedReferenceHeight, MemoryScanProvider, ObservationEvent,
    ReferenceHeightProvider, ScanMesh, ScanProvider,
};
pub use registry::{SurfaceGeneration, SurfaceInstance, SurfaceRegistry, SurfaceVisibility};
pub use scanner::{PassReport, PassStatus, SkipReason, SurfaceScanner, ToggleOutcome};
pub use session::{CancelToken, ScanSession, SessionState};
pub use tracker::{ObservationTracker, TrackedMesh, Transition};
