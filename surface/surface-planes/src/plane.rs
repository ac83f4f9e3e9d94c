//! Infinite plane representation.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An infinite plane `normal · p = distance` with a unit normal.
///
/// The normal points to the side the scanned surface faces, so a floor has
/// a normal close to +Y and a ceiling close to -Y.
///
/// # Example
///
/// ```
/// use surface_planes::Plane;
/// use nalgebra::{Point3, Vector3};
///
/// let floor = Plane::from_point_normal(Point3::new(3.0, -1.5, 2.0), Vector3::new(0.0, 2.0, 0.0))
///     .unwrap();
///
/// assert!((floor.distance + 1.5).abs() < 1e-12);
/// assert!((floor.signed_distance(&Point3::new(0.0, 0.0, 0.0)) - 1.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Plane {
    /// Unit normal.
    pub normal: Vector3<f64>,
    /// Signed offset along the normal from the origin.
    pub distance: f64,
}

impl Plane {
    /// Create a plane through `point` with the given normal.
    ///
    /// The normal is normalised; returns `None` if it has zero length.
    #[must_use]
    pub fn from_point_normal(point: Point3<f64>, normal: Vector3<f64>) -> Option<Self> {
        let unit = normal.try_normalize(f64::EPSILON)?;
        Some(Self {
            normal: unit,
            distance: unit.dot(&point.coords),
        })
    }

    /// Create a plane through three non-collinear points (CCW front face).
    #[must_use]
    pub fn from_points(p0: Point3<f64>, p1: Point3<f64>, p2: Point3<f64>) -> Option<Self> {
        Self::from_point_normal(p0, (p1 - p0).cross(&(p2 - p0)))
    }

    /// Signed distance from `point`; positive on the side the normal faces.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) - self.distance
    }

    /// Orthogonal projection of `point` onto the plane.
    #[must_use]
    pub fn project(&self, point: &Point3<f64>) -> Point3<f64> {
        point - self.normal * self.signed_distance(point)
    }

    /// The point on the plane closest to the origin.
    #[must_use]
    pub fn origin_point(&self) -> Point3<f64> {
        Point3::from(self.normal * self.distance)
    }

    /// The same plane seen from the other side.
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            distance: -self.distance,
        }
    }
}
