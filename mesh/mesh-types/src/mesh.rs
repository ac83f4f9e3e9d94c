//! Indexed triangle mesh.

use crate::{Triangle, Vertex};
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An indexed triangle mesh.
///
/// Vertices and faces are stored separately, with faces referencing
/// vertices by index. Scan fragments arrive in this layout.
///
/// # Winding Order
///
/// Faces use **counter-clockwise (CCW) winding** when viewed from the
/// front, so face normals point away from the scanned surface toward the
/// observer.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex};
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
///
/// assert_eq!(mesh.vertices.len(), 3);
/// assert_eq!(mesh.face_count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexedMesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Triangle faces as indices into the vertex array.
    pub faces: Vec<[u32; 3]>,
}

impl IndexedMesh {
    /// Create a new empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh from vertices and faces.
    #[inline]
    #[must_use]
    pub const fn from_parts(vertices: Vec<Vertex>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Number of faces.
    #[inline]
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// A mesh without vertices or without faces carries no usable geometry.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Resolve a face into a [`Triangle`].
    ///
    /// Returns `None` if the face index or any of its vertex indices is out
    /// of range.
    #[must_use]
    pub fn triangle(&self, face_index: usize) -> Option<Triangle> {
        let face = self.faces.get(face_index)?;
        self.resolve(*face)
    }

    /// Recompute per-vertex normals from the current topology.
    ///
    /// Each face contributes its area-weighted normal to its three vertices;
    /// the sums are then normalised. Vertices that touch no valid face get
    /// `None`. Any previously stored normals are discarded.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{IndexedMesh, Vertex, Vector3};
    ///
    /// let mut mesh = IndexedMesh::new();
    /// mesh.vertices.push(Vertex::with_normal(
    ///     mesh_types::Point3::new(0.0, 0.0, 0.0),
    ///     Vector3::x(), // stale
    /// ));
    /// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 1.0));
    /// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
    /// mesh.faces.push([0, 1, 2]);
    ///
    /// mesh.recompute_normals();
    /// assert_eq!(mesh.vertices[0].normal, Some(Vector3::y()));
    /// ```
    pub fn recompute_normals(&mut self) {
        let mut sums = vec![Vector3::zeros(); self.vertices.len()];

        for &face in &self.faces {
            let Some(tri) = self.resolve(face) else {
                continue;
            };
            // Cross product length is twice the area, so this is area-weighted
            let weighted = tri.normal_unnormalized();
            for &vi in &face {
                sums[vi as usize] += weighted;
            }
        }

        for (vertex, sum) in self.vertices.iter_mut().zip(sums) {
            let len = sum.norm();
            vertex.normal = if len > f64::EPSILON {
                Some(sum / len)
            } else {
                None
            };
        }
    }

    fn resolve(&self, [i0, i1, i2]: [u32; 3]) -> Option<Triangle> {
        Some(Triangle::new(
            self.vertices.get(i0 as usize)?.position,
            self.vertices.get(i1 as usize)?.position,
            self.vertices.get(i2 as usize)?.position,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    /// Two triangles forming a 2m x 1m floor quad at height `y`.
    fn floor_quad(y: f64) -> IndexedMesh {
        IndexedMesh::from_parts(
            vec![
                Vertex::from_coords(0.0, y, 0.0),
                Vertex::from_coords(0.0, y, 1.0),
                Vertex::from_coords(2.0, y, 1.0),
                Vertex::from_coords(2.0, y, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn empty_mesh() {
        let mesh = IndexedMesh::new();
        assert!(mesh.is_empty());
        assert!(mesh.triangle(0).is_none());

        let vertices_only = IndexedMesh::from_parts(vec![Vertex::from_coords(0.0, 0.0, 0.0)], vec![]);
        assert!(vertices_only.is_empty());
    }

    #[test]
    fn out_of_range_faces_are_skipped() {
        let mut mesh = floor_quad(0.0);
        mesh.faces.push([0, 1, 99]);
        assert_eq!(mesh.face_count(), 3);
        assert!(mesh.triangle(2).is_none());
        assert!(mesh.triangle(0).is_some());
    }

    #[test]
    fn recompute_normals_replaces_stale_values() {
        let mut mesh = floor_quad(-1.5);
        for v in &mut mesh.vertices {
            v.normal = Some(Vector3::new(0.0, 0.0, -1.0));
        }
        mesh.recompute_normals();
        for v in &mesh.vertices {
            let n = v.normal.unwrap_or_else(Vector3::zeros);
            assert_relative_eq!(n.y, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn recompute_normals_clears_isolated_vertices() {
        let mut mesh = floor_quad(0.0);
        mesh.vertices.push(Vertex::with_normal(Point3::new(5.0, 5.0, 5.0), Vector3::x()));
        mesh.recompute_normals();
        assert!(mesh.vertices[4].normal.is_none());
    }

    #[test]
    fn recompute_normals_averages_across_a_crease() {
        // Floor triangle and wall triangle sharing the edge 0-1
        let mut mesh = IndexedMesh::from_parts(
            vec![
                Vertex::from_coords(0.0, 0.0, 0.0),
                Vertex::from_coords(1.0, 0.0, 0.0),
                Vertex::from_coords(0.0, 0.0, 1.0),
                Vertex::from_coords(0.0, 1.0, 0.0),
            ],
            vec![[0, 2, 1], [0, 1, 3]],
        );
        mesh.recompute_normals();
        let shared = mesh.vertices[0].normal.unwrap_or_else(Vector3::zeros);
        assert_relative_eq!(shared.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(shared.y, shared.z, epsilon = 1e-12);
    }
}
