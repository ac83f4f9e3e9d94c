//! Planar surface extraction and classification for scanned meshes.
//!
//! This crate turns room-scale scan fragments into a compact set of
//! labelled rectangles:
//!
//! - **Extraction** - Group near-coplanar, connected triangles across all
//!   fragments, fit a plane to each group and bound it with the
//!   minimum-area rectangle
//! - **Classification** - Label planes floor, ceiling, wall or table
//!   relative to a reference height
//!
//! # Coordinates
//!
//! World space is Y-up and measured in metres. A floor has a normal close
//! to `+Y`, a ceiling close to `-Y`.
//!
//! # Quick Start
//!
//! ```
//! use mesh_types::{IndexedMesh, Vertex};
//! use surface_planes::{
//!     classify, find_planes, ClassificationParams, MeshFragment, MeshId, PlaneFindingParams,
//!     PlaneLabel,
//! };
//!
//! // A 4m x 3m floor, 1.5m below the viewer
//! let floor = IndexedMesh::from_parts(
//!     vec![
//!         Vertex::from_coords(0.0, -1.5, 0.0),
//!         Vertex::from_coords(0.0, -1.5, 3.0),
//!         Vertex::from_coords(4.0, -1.5, 3.0),
//!         Vertex::from_coords(4.0, -1.5, 0.0),
//!     ],
//!     vec![[0, 1, 2], [0, 2, 3]],
//! );
//!
//! let fragments = vec![MeshFragment::new(MeshId(1), floor)];
//! let found = find_planes(&fragments, &PlaneFindingParams::for_rooms()).unwrap();
//! let labelled = classify(found.planes, 0.0, &ClassificationParams::default());
//!
//! assert_eq!(labelled.planes[0].label, PlaneLabel::Floor);
//! println!("{}", labelled);
//! ```
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`fragment`] | Scanned mesh fragments with world transforms |
//! | [`params`] | Extraction parameters and presets |
//! | [`extract`] | Plane extraction entry point |
//! | [`plane`] | Infinite planes |
//! | [`bounds`] | Minimum-area bounding rectangles |
//! | [`bounded`] | Planes with their rectangle and area |
//! | [`classify`] | Floor / ceiling / wall / table labelling |

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_const_for_fn)] // Not all functions benefit from const
#![allow(clippy::cast_precision_loss)] // Expected when converting counts to f64

pub mod bounded;
pub mod bounds;
pub mod classify;
mod cluster;
pub mod error;
pub mod extract;
mod fit;
pub mod fragment;
pub mod params;
pub mod plane;

pub use bounded::BoundedPlane;
pub use bounds::PlaneBounds;
pub use classify::{
    Classification, ClassificationParams, ClassifiedPlane, HeightBand, LabelMask, PlaneLabel,
    classify,
};
pub use error::{PlaneError, PlaneResult};
pub use extract::{PlaneFindingResult, find_planes};
pub use fit::snap_to_gravity;
pub use fragment::{MeshFragment, MeshId};
pub use params::PlaneFindingParams;
pub use plane::Plane;

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_types::{IndexedMesh, Vertex};

    fn box_room() -> Vec<MeshFragment> {
        // Floor, ceiling and one wall of a 4m x 3m room, viewer at y = 0
        let floor = IndexedMesh::from_parts(
            vec![
                Vertex::from_coords(0.0, -1.5, 0.0),
                Vertex::from_coords(0.0, -1.5, 3.0),
                Vertex::from_coords(4.0, -1.5, 3.0),
                Vertex::from_coords(4.0, -1.5, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        let ceiling = IndexedMesh::from_parts(
            vec![
                Vertex::from_coords(0.0, 1.0, 0.0),
                Vertex::from_coords(0.0, 1.0, 3.0),
                Vertex::from_coords(4.0, 1.0, 3.0),
                Vertex::from_coords(4.0, 1.0, 0.0),
            ],
            vec![[0, 2, 1], [0, 3, 2]],
        );
        let wall = IndexedMesh::from_parts(
            vec![
                Vertex::from_coords(0.0, -1.5, 0.0),
                Vertex::from_coords(4.0, -1.5, 0.0),
                Vertex::from_coords(4.0, 1.0, 0.0),
                Vertex::from_coords(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        vec![
            MeshFragment::new(MeshId(1), floor),
            MeshFragment::new(MeshId(2), ceiling),
            MeshFragment::new(MeshId(3), wall),
        ]
    }

    #[test]
    fn test_room_workflow() {
        let found = find_planes(&box_room(), &PlaneFindingParams::default()).unwrap();
        assert_eq!(found.planes.len(), 3);

        let labelled = classify(found.planes, 0.0, &ClassificationParams::default());
        assert_eq!(labelled.count(PlaneLabel::Floor), 1);
        assert_eq!(labelled.count(PlaneLabel::Ceiling), 1);
        assert_eq!(labelled.count(PlaneLabel::Wall), 1);
        assert!(labelled.floor().is_some());
        assert!(labelled.ceiling().is_some());
    }

    #[test]
    fn test_presets_on_room() {
        let fine = find_planes(&box_room(), &PlaneFindingParams::fine()).unwrap();
        assert_eq!(fine.planes.len(), 3);

        // Two triangles per surface is below the coarse minimum
        let coarse = find_planes(&box_room(), &PlaneFindingParams::coarse()).unwrap();
        assert!(coarse.is_empty());
        assert_eq!(coarse.clusters_rejected, 3);
    }
}
