//! Core mesh types for scanned environment geometry.
//!
//! This crate provides the geometric building blocks shared by the surface
//! crates:
//!
//! - [`Vertex`] - A position with an optional unit normal
//! - [`Triangle`] - A concrete triangle with resolved vertex positions
//! - [`IndexedMesh`] - A triangle mesh with indexed vertices
//!
//! # Units
//!
//! All coordinates are `f64` metres, which is what environment scanners
//! report.
//!
//! # Coordinate System
//!
//! Uses a **right-handed, Y-up** coordinate system:
//! - X: right
//! - Y: up (gravity points along -Y)
//! - Z: toward the viewer
//!
//! Face winding is **counter-clockwise (CCW) when viewed from the front**,
//! so triangle normals point toward the observer of the scanned surface.
//!
//! # Example
//!
//! ```
//! use mesh_types::{IndexedMesh, Vertex};
//!
//! // A 1m x 1m floor patch, seen from above
//! let mut mesh = IndexedMesh::new();
//! mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 1.0));
//! mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 1.0));
//! mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
//! mesh.faces.push([0, 1, 2]);
//! mesh.faces.push([0, 2, 3]);
//!
//! mesh.recompute_normals();
//! let n = mesh.vertices[0].normal.unwrap();
//! assert!((n.y - 1.0).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod mesh;
mod triangle;
mod vertex;

pub use mesh::IndexedMesh;
pub use triangle::Triangle;
pub use vertex::Vertex;

// Re-export nalgebra types for convenience
pub use nalgebra::{Isometry3, Point3, Vector3};
