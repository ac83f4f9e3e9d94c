//! Vertex type.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A mesh vertex: a position plus an optional unit normal.
///
/// Scanned meshes often arrive with stale or missing normals, so the normal
/// is optional and is usually filled in by
/// [`IndexedMesh::recompute_normals`](crate::IndexedMesh::recompute_normals).
///
/// # Example
///
/// ```
/// use mesh_types::{Vertex, Point3};
///
/// let v1 = Vertex::new(Point3::new(1.0, 2.0, 3.0));
/// let v2 = Vertex::from_coords(1.0, 2.0, 3.0);
///
/// assert_eq!(v1.position, v2.position);
/// assert!(v1.normal.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    /// 3D position.
    pub position: Point3<f64>,

    /// Unit normal, if known.
    pub normal: Option<Vector3<f64>>,
}

impl Vertex {
    /// Create a vertex with only a position.
    #[inline]
    #[must_use]
    pub const fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            normal: None,
        }
    }

    /// Create a vertex from raw coordinates.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::Vertex;
    ///
    /// let v = Vertex::from_coords(1.0, 2.0, 3.0);
    /// assert_eq!(v.position.y, 2.0);
    /// ```
    #[inline]
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Point3::new is not const in nalgebra
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Create a vertex with a position and a normal.
    ///
    /// The normal is stored as given; callers are expected to pass a unit
    /// vector.
    #[inline]
    #[must_use]
    pub const fn with_normal(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            position,
            normal: Some(normal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_has_no_normal() {
        let v = Vertex::new(Point3::new(0.5, 1.5, -2.0));
        assert!(v.normal.is_none());
        assert!((v.position.z + 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn with_normal_keeps_normal() {
        let v = Vertex::with_normal(Point3::origin(), Vector3::y());
        assert_eq!(v.normal, Some(Vector3::y()));
    }
}
