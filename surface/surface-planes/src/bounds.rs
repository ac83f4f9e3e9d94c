//! Oriented bounding rectangles in a plane's local frame.
//!
//! The rectangle is the minimum-area one enclosing the projected geometry.
//! Hull and rectangle come from `geo`; this module handles the lift
//! between the plane and its 2D frame.

use geo::{Area, ConvexHull, MinimumRotatedRect, MultiPoint};
use nalgebra::{Matrix3, Point2, Point3, Rotation3, UnitQuaternion, Vector2, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An oriented rectangle lying in a plane.
///
/// The local frame is right-handed: `axis_u × axis_v = normal`, and the
/// rectangle is canonicalised so `half_extents.x >= half_extents.y`
/// (`axis_u` runs along the long side).
///
/// # Example
///
/// ```
/// use surface_planes::PlaneBounds;
/// use nalgebra::{Point3, Vector3};
///
/// // 4m x 3m floor centred 1.5m below the origin
/// let points = [
///     Point3::new(-2.0, -1.5, -1.5),
///     Point3::new(2.0, -1.5, -1.5),
///     Point3::new(2.0, -1.5, 1.5),
///     Point3::new(-2.0, -1.5, 1.5),
/// ];
/// let bounds = PlaneBounds::from_points(&points, &Vector3::y()).unwrap();
///
/// assert!((bounds.area() - 12.0).abs() < 1e-9);
/// assert!((bounds.center.y + 1.5).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaneBounds {
    /// World-space center of the rectangle.
    pub center: Point3<f64>,
    /// Half the side lengths along `axis_u` and `axis_v`.
    pub half_extents: Vector2<f64>,
    /// In-plane unit axis along the long side.
    pub axis_u: Vector3<f64>,
    /// In-plane unit axis along the short side.
    pub axis_v: Vector3<f64>,
}

impl PlaneBounds {
    /// Compute the minimum-area rectangle enclosing `points` projected onto
    /// the plane through their centroid with the given unit `normal`.
    ///
    /// Returns `None` when the projection is degenerate (fewer than three
    /// non-collinear points).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_points(points: &[Point3<f64>], normal: &Vector3<f64>) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }

        let centroid: Vector3<f64> =
            points.iter().map(|p| p.coords).sum::<Vector3<f64>>() / points.len() as f64;
        let (u, v) = in_plane_basis(normal);

        let local: Vec<Point2<f64>> = points
            .iter()
            .map(|p| {
                let d = p.coords - centroid;
                Point2::new(d.dot(&u), d.dot(&v))
            })
            .collect();

        let rect = min_area_rect(&local)?;

        // Lift back to 3D, on the plane through the centroid
        let center = Point3::from(centroid + u * rect.center.x + v * rect.center.y);
        let axis_u = (u * rect.axis.x + v * rect.axis.y).normalize();
        let axis_v = normal.cross(&axis_u).normalize();

        Some(Self::canonical(center, rect.half_extents, axis_u, axis_v))
    }

    /// Swap axes if needed so the long side runs along `axis_u`, keeping
    /// the frame right-handed.
    fn canonical(
        center: Point3<f64>,
        half_extents: Vector2<f64>,
        axis_u: Vector3<f64>,
        axis_v: Vector3<f64>,
    ) -> Self {
        if half_extents.x >= half_extents.y {
            Self {
                center,
                half_extents,
                axis_u,
                axis_v,
            }
        } else {
            Self {
                center,
                half_extents: Vector2::new(half_extents.y, half_extents.x),
                axis_u: axis_v,
                axis_v: -axis_u,
            }
        }
    }

    /// The plane normal implied by the local frame.
    #[must_use]
    pub fn normal(&self) -> Vector3<f64> {
        self.axis_u.cross(&self.axis_v)
    }

    /// Full side lengths.
    #[must_use]
    pub fn extents(&self) -> Vector2<f64> {
        self.half_extents * 2.0
    }

    /// Rectangle area (product of the full side lengths).
    #[must_use]
    pub fn area(&self) -> f64 {
        4.0 * self.half_extents.x * self.half_extents.y
    }

    /// Rotation taking local X, Y and Z onto `axis_u`, `axis_v` and the
    /// normal.
    #[must_use]
    pub fn rotation(&self) -> UnitQuaternion<f64> {
        let basis = Matrix3::from_columns(&[self.axis_u, self.axis_v, self.normal()]);
        UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(basis))
    }

    /// The four world-space corners, counter-clockwise around the normal.
    #[must_use]
    pub fn corners(&self) -> [Point3<f64>; 4] {
        let u = self.axis_u * self.half_extents.x;
        let v = self.axis_v * self.half_extents.y;
        [
            self.center - u - v,
            self.center + u - v,
            self.center + u + v,
            self.center - u + v,
        ]
    }

    /// Check whether `point`, projected onto the plane, falls inside the
    /// rectangle grown by `tolerance`.
    #[must_use]
    pub fn contains_projected(&self, point: &Point3<f64>, tolerance: f64) -> bool {
        let d = point - self.center;
        d.dot(&self.axis_u).abs() <= self.half_extents.x + tolerance
            && d.dot(&self.axis_v).abs() <= self.half_extents.y + tolerance
    }
}

/// A deterministic orthonormal basis `(u, v)` of the plane with the given
/// unit normal, with `u × v = normal`.
pub(crate) fn in_plane_basis(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    // Walls use up as reference; near-horizontal planes use +X
    let reference = if normal.y.abs() < 0.9 {
        Vector3::y()
    } else {
        Vector3::x()
    };
    let u = reference.cross(normal).normalize();
    let v = normal.cross(&u);
    (u, v)
}

/// A rectangle in 2D: center, half extents, and unit direction of its
/// first side.
#[derive(Debug, Clone, Copy)]
struct Rect2 {
    center: Point2<f64>,
    half_extents: Vector2<f64>,
    axis: Vector2<f64>,
}

/// Minimum-area enclosing rectangle of a 2D point set.
///
/// Returns `None` when the convex hull has no area.
fn min_area_rect(points: &[Point2<f64>]) -> Option<Rect2> {
    let cloud: MultiPoint<f64> = points.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>().into();
    let hull = cloud.convex_hull();

    let (lo, hi) = points.iter().fold(
        (Vector2::repeat(f64::INFINITY), Vector2::repeat(f64::NEG_INFINITY)),
        |(lo, hi), p| (lo.inf(&p.coords), hi.sup(&p.coords)),
    );
    // Scale-aware: a sliver hull counts as collinear
    let extent = (hi - lo).norm().max(1.0);
    if hull.unsigned_area() <= 1e-12 * extent * extent {
        return None;
    }

    let rect = hull.minimum_rotated_rect()?;
    let ring: Vec<Point2<f64>> = rect
        .exterior()
        .coords()
        .map(|c| Point2::new(c.x, c.y))
        .collect();
    if ring.len() < 4 {
        return None;
    }

    let side_a = ring[1] - ring[0];
    let side_b = ring[2] - ring[1];
    let axis = side_a.try_normalize(f64::EPSILON)?;
    Some(Rect2 {
        center: ring[0] + (ring[2] - ring[0]) * 0.5,
        half_extents: Vector2::new(side_a.norm(), side_b.norm()) * 0.5,
        axis,
    })
}
