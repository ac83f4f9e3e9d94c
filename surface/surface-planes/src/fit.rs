//! Fitting a bounded plane to a grown cluster.

use nalgebra::{Matrix3, Point3, SymmetricEigen, Vector3};

use crate::bounded::BoundedPlane;
use crate::bounds::PlaneBounds;
use crate::cluster::{Cluster, TriangleSoup};
use crate::params::PlaneFindingParams;
use crate::plane::Plane;

/// Why a cluster produced no plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rejection {
    /// Fewer triangles than `min_triangles`.
    TooFewTriangles,
    /// Points are collinear or otherwise give no usable frame.
    Degenerate,
    /// Bounding rectangle smaller than `min_area`.
    TooSmall,
}

/// Fit, snap and bound a cluster.
pub(crate) fn fit_cluster(
    soup: &TriangleSoup,
    cluster: &Cluster,
    params: &PlaneFindingParams,
) -> Result<BoundedPlane, Rejection> {
    if cluster.triangles.len() < params.min_triangles {
        return Err(Rejection::TooFewTriangles);
    }

    let mean_normal = cluster
        .estimate
        .normal_sum
        .try_normalize(f64::EPSILON)
        .ok_or(Rejection::Degenerate)?;

    let points = unique_vertices(soup, cluster);
    let (centroid, fitted) = principal_normal(&points).ok_or(Rejection::Degenerate)?;

    // PCA is sign-free; orient with the surface. A thin strip can make the
    // smallest axis ill-conditioned, in which case the mean normal wins.
    let mut normal = if fitted.dot(&mean_normal) < 0.0 {
        -fitted
    } else {
        fitted
    };
    if normal.dot(&mean_normal) < params.min_normal_dot() {
        normal = mean_normal;
    }
    let normal = snap_to_gravity(normal, params.snap_to_gravity_threshold);

    let plane = Plane::from_point_normal(centroid, normal).ok_or(Rejection::Degenerate)?;
    let bounds = PlaneBounds::from_points(&points, &plane.normal).ok_or(Rejection::Degenerate)?;
    let bounded = BoundedPlane::new(plane, bounds, cluster.triangles.len());

    if !bounded.area.is_finite() {
        return Err(Rejection::Degenerate);
    }
    if bounded.area < params.min_area {
        return Err(Rejection::TooSmall);
    }
    Ok(bounded)
}

/// One position per welded vertex of the cluster, ordered by welded id.
fn unique_vertices(soup: &TriangleSoup, cluster: &Cluster) -> Vec<Point3<f64>> {
    let mut tagged: Vec<(u32, Point3<f64>)> = cluster
        .triangles
        .iter()
        .flat_map(|&t| {
            let tri = &soup.triangles[t];
            (0..3).map(move |k| (tri.welded[k], tri.corners[k]))
        })
        .collect();
    tagged.sort_by_key(|&(id, _)| id);
    tagged.dedup_by_key(|&mut (id, _)| id);
    tagged.into_iter().map(|(_, p)| p).collect()
}

/// Centroid and least-variance axis of a point set.
///
/// Returns `None` for fewer than three points or a collinear set.
#[allow(clippy::cast_precision_loss)]
fn principal_normal(points: &[Point3<f64>]) -> Option<(Point3<f64>, Vector3<f64>)> {
    if points.len() < 3 {
        return None;
    }

    let count = points.len() as f64;
    let centroid = points.iter().map(|p| p.coords).sum::<Vector3<f64>>() / count;

    let mut covariance = Matrix3::zeros();
    for p in points {
        let d = p.coords - centroid;
        covariance += d * d.transpose();
    }
    covariance /= count;

    let eigen = SymmetricEigen::new(covariance);
    let values = eigen.eigenvalues;

    let mut indices = [0usize, 1, 2];
    indices.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let largest = values[indices[0]];
    if largest <= f64::EPSILON || values[indices[1]] / largest < 1e-9 {
        return None;
    }

    let normal = eigen
        .eigenvectors
        .column(indices[2])
        .into_owned()
        .try_normalize(f64::EPSILON)?;
    Some((Point3::from(centroid), normal))
}

/// Snap a unit normal onto gravity-aligned directions.
///
/// Normals within `threshold` of ±Y become exactly ±Y; normals within
/// `threshold` of the horizontal plane lose their vertical component.
/// A zero threshold leaves the normal untouched.
#[must_use]
pub fn snap_to_gravity(normal: Vector3<f64>, threshold: f64) -> Vector3<f64> {
    if threshold <= 0.0 {
        return normal;
    }

    let vertical = normal.y.abs().min(1.0);
    if vertical.acos() <= threshold {
        return Vector3::new(0.0, normal.y.signum(), 0.0);
    }
    if vertical.asin() <= threshold {
        if let Some(horizontal) = Vector3::new(normal.x, 0.0, normal.z).try_normalize(f64::EPSILON)
        {
            return horizontal;
        }
    }
    normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn snaps_near_vertical_normals() {
        let tilt = 3.0_f64.to_radians();
        let n = Vector3::new(tilt.sin(), tilt.cos(), 0.0);
        let snapped = snap_to_gravity(n, 5.0_f64.to_radians());
        assert_relative_eq!(snapped, Vector3::y(), epsilon = 1e-12);

        let down = snap_to_gravity(-n, 5.0_f64.to_radians());
        assert_relative_eq!(down, -Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn snaps_near_horizontal_normals() {
        let tilt = 2.0_f64.to_radians();
        let n = Vector3::new(0.0, tilt.sin(), tilt.cos());
        let snapped = snap_to_gravity(n, 5.0_f64.to_radians());
        assert_relative_eq!(snapped, Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn leaves_sloped_normals_alone() {
        let n = Vector3::new(1.0, 1.0, 0.0).normalize();
        assert_eq!(snap_to_gravity(n, 5.0_f64.to_radians()), n);

        let tilted = Vector3::new(0.05, 1.0, 0.0).normalize();
        assert_eq!(snap_to_gravity(tilted, 0.0), tilted);
    }

    #[test]
    fn principal_normal_of_floor_points() {
        let points = [
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(2.0, -1.0, 0.0),
            Point3::new(2.0, -1.0, 1.0),
            Point3::new(0.0, -1.0, 1.0),
        ];
        let (centroid, normal) = principal_normal(&points).unwrap();
        assert_relative_eq!(centroid.y, -1.0, epsilon = 1e-12);
        assert_relative_eq!(normal.y.abs(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn collinear_points_have_no_normal() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        assert!(principal_normal(&points).is_none());
    }
}
