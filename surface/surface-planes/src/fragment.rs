//! Scanned mesh fragments, the input to plane extraction.

use std::fmt;

use mesh_types::{IndexedMesh, Triangle};
use nalgebra::Isometry3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable identifier of a scanned mesh fragment.
///
/// Scanners assign these; they are unique within the live set and are
/// reused by add/update/remove notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshId(pub i32);

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for MeshId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

/// One scanned mesh unit with its local-to-world placement.
///
/// Extraction reads fragments in world space, so a fragment's triangles are
/// `transform * position`.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex};
/// use surface_planes::{MeshFragment, MeshId};
///
/// let mesh = IndexedMesh::from_parts(
///     vec![
///         Vertex::from_coords(0.0, 0.0, 0.0),
///         Vertex::from_coords(0.0, 0.0, 1.0),
///         Vertex::from_coords(1.0, 0.0, 0.0),
///     ],
///     vec![[0, 1, 2]],
/// );
/// let fragment = MeshFragment::new(MeshId(3), mesh);
/// assert_eq!(fragment.world_faces().flatten().count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshFragment {
    /// Identifier assigned by the scanner.
    pub id: MeshId,
    /// Fragment geometry in local coordinates.
    pub mesh: IndexedMesh,
    /// Local-to-world transform.
    pub transform: Isometry3<f64>,
}

impl MeshFragment {
    /// Create a fragment whose local frame is the world frame.
    #[must_use]
    pub fn new(id: MeshId, mesh: IndexedMesh) -> Self {
        Self {
            id,
            mesh,
            transform: Isometry3::identity(),
        }
    }

    /// Set the local-to-world transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Isometry3<f64>) -> Self {
        self.transform = transform;
        self
    }

    /// Iterate over resolvable faces as world-space triangles, in face order.
    ///
    /// Faces with out-of-range indices yield `None` so callers can keep face
    /// numbering aligned.
    pub fn world_faces(&self) -> impl Iterator<Item = Option<Triangle>> + '_ {
        (0..self.mesh.face_count()).map(|i| {
            self.mesh
                .triangle(i)
                .map(|tri| tri.transformed(&self.transform))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::Vertex;

    #[test]
    fn world_faces_apply_transform() {
        let mesh = IndexedMesh::from_parts(
            vec![
                Vertex::from_coords(0.0, 0.0, 0.0),
                Vertex::from_coords(0.0, 0.0, 1.0),
                Vertex::from_coords(1.0, 0.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 1, 7]],
        );
        let fragment = MeshFragment::new(MeshId(1), mesh)
            .with_transform(Isometry3::translation(0.0, -1.5, 0.0));

        let faces: Vec<_> = fragment.world_faces().collect();
        assert_eq!(faces.len(), 2);
        assert!(faces[1].is_none());

        let tri = faces[0].unwrap();
        assert_relative_eq!(tri.centroid().y, -1.5, epsilon = 1e-12);
        let n = tri.normal().unwrap();
        assert_relative_eq!(n.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn mesh_id_orders_and_displays() {
        assert!(MeshId(2) < MeshId(7));
        assert_eq!(MeshId::from(7).to_string(), "7");
    }
}
