//! Planes restricted to the rectangle supported by scanned geometry.

use nalgebra::{Point3, UnitQuaternion, Vector2, Vector3};

use crate::bounds::PlaneBounds;
use crate::plane::Plane;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A plane found in the scan, bounded by a rectangle.
///
/// Produced by [`find_planes`](crate::find_planes). The rectangle's frame
/// shares the plane's normal, and `area` is the product of the full
/// rectangle extents.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundedPlane {
    /// The infinite plane.
    pub plane: Plane,
    /// Bounding rectangle in the plane.
    pub bounds: PlaneBounds,
    /// Rectangle area.
    pub area: f64,
    /// Number of scan triangles that support this plane.
    pub triangle_count: usize,
}

impl BoundedPlane {
    /// Assemble a bounded plane; `area` is derived from `bounds`.
    #[must_use]
    pub fn new(plane: Plane, bounds: PlaneBounds, triangle_count: usize) -> Self {
        Self {
            plane,
            area: bounds.area(),
            bounds,
            triangle_count,
        }
    }

    /// World-space center of the bounded region.
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        self.bounds.center
    }

    /// Unit plane normal.
    #[must_use]
    pub fn normal(&self) -> Vector3<f64> {
        self.plane.normal
    }

    /// Full rectangle side lengths.
    #[must_use]
    pub fn extents(&self) -> Vector2<f64> {
        self.bounds.extents()
    }

    /// Orientation of the rectangle (local Z is the normal).
    #[must_use]
    pub fn rotation(&self) -> UnitQuaternion<f64> {
        self.bounds.rotation()
    }

    /// Height of the center above the world origin.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.bounds.center.y
    }
}
