//! Parameters for plane extraction.

use crate::error::{PlaneError, PlaneResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters controlling how triangles are grouped into planes.
///
/// Distances are in metres, angles in radians.
///
/// # Example
///
/// ```
/// use surface_planes::PlaneFindingParams;
///
/// let params = PlaneFindingParams::for_rooms()
///     .with_min_area(0.5)
///     .with_max_normal_angle_degrees(8.0);
///
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlaneFindingParams {
    /// Maximum angle between a triangle's normal and the region's mean
    /// normal for the triangle to join the region. Default: 10 degrees.
    pub max_normal_angle: f64,

    /// Maximum distance of any triangle vertex from the region's current
    /// plane estimate. Default: 0.05.
    pub max_plane_distance: f64,

    /// Vertices closer than this are treated as the same vertex, which is
    /// what connects triangles across fragment seams. Default: 0.01.
    pub weld_tolerance: f64,

    /// Regions with fewer triangles are discarded. Default: 2.
    pub min_triangles: usize,

    /// Planes whose bounding rectangle is smaller than this are discarded.
    /// Default: 0.025.
    pub min_area: f64,

    /// Normals within this angle of vertical or horizontal are snapped to
    /// it. Zero disables snapping. Default: 5 degrees.
    pub snap_to_gravity_threshold: f64,

    /// Triangles with area at or below this are excluded as degenerate.
    /// Default: 1e-10.
    pub degenerate_area: f64,
}

impl Default for PlaneFindingParams {
    fn default() -> Self {
        Self::for_rooms()
    }
}

impl PlaneFindingParams {
    /// Creates new parameters with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters tuned for room-scale scans (the default).
    #[must_use]
    pub fn for_rooms() -> Self {
        Self {
            max_normal_angle: 10.0_f64.to_radians(),
            max_plane_distance: 0.05,
            weld_tolerance: 0.01,
            min_triangles: 2,
            min_area: 0.025,
            snap_to_gravity_threshold: 5.0_f64.to_radians(),
            degenerate_area: 1e-10,
        }
    }

    /// Tighter tolerances for dense, low-noise meshes.
    ///
    /// Keeps small surfaces such as shelves and narrow desks.
    #[must_use]
    pub fn fine() -> Self {
        Self {
            max_normal_angle: 5.0_f64.to_radians(),
            max_plane_distance: 0.02,
            weld_tolerance: 0.005,
            min_triangles: 2,
            min_area: 0.01,
            snap_to_gravity_threshold: 3.0_f64.to_radians(),
            degenerate_area: 1e-12,
        }
    }

    /// Looser tolerances for noisy, coarse meshes.
    ///
    /// Only large surfaces survive.
    #[must_use]
    pub fn coarse() -> Self {
        Self {
            max_normal_angle: 15.0_f64.to_radians(),
            max_plane_distance: 0.1,
            weld_tolerance: 0.02,
            min_triangles: 4,
            min_area: 0.25,
            snap_to_gravity_threshold: 7.5_f64.to_radians(),
            degenerate_area: 1e-8,
        }
    }

    /// Sets the maximum normal deviation in radians.
    #[must_use]
    pub const fn with_max_normal_angle(mut self, radians: f64) -> Self {
        self.max_normal_angle = radians;
        self
    }

    /// Sets the maximum normal deviation in degrees.
    #[must_use]
    pub fn with_max_normal_angle_degrees(self, degrees: f64) -> Self {
        self.with_max_normal_angle(degrees.to_radians())
    }

    /// Sets the maximum vertex-to-plane distance.
    #[must_use]
    pub const fn with_max_plane_distance(mut self, distance: f64) -> Self {
        self.max_plane_distance = distance;
        self
    }

    /// Sets the vertex weld tolerance.
    #[must_use]
    pub const fn with_weld_tolerance(mut self, tolerance: f64) -> Self {
        self.weld_tolerance = tolerance;
        self
    }

    /// Sets the minimum number of triangles per plane.
    #[must_use]
    pub const fn with_min_triangles(mut self, count: usize) -> Self {
        self.min_triangles = count;
        self
    }

    /// Sets the minimum plane area.
    #[must_use]
    pub const fn with_min_area(mut self, area: f64) -> Self {
        self.min_area = area;
        self
    }

    /// Sets the gravity snap threshold in radians (zero disables snapping).
    #[must_use]
    pub const fn with_snap_to_gravity(mut self, radians: f64) -> Self {
        self.snap_to_gravity_threshold = radians;
        self
    }

    /// Cosine of [`max_normal_angle`](Self::max_normal_angle).
    #[must_use]
    pub fn min_normal_dot(&self) -> f64 {
        self.max_normal_angle.cos()
    }

    /// Check that every parameter is within range.
    ///
    /// # Errors
    ///
    /// Returns [`PlaneError::InvalidParameter`] naming the first bad field.
    pub fn validate(&self) -> PlaneResult<()> {
        if !(self.max_normal_angle > 0.0 && self.max_normal_angle < std::f64::consts::FRAC_PI_2) {
            return Err(PlaneError::invalid(format!(
                "max_normal_angle must be in (0, pi/2), got {}",
                self.max_normal_angle
            )));
        }
        if !(self.max_plane_distance > 0.0 && self.max_plane_distance.is_finite()) {
            return Err(PlaneError::invalid(format!(
                "max_plane_distance must be positive, got {}",
                self.max_plane_distance
            )));
        }
        if !(self.weld_tolerance > 0.0 && self.weld_tolerance.is_finite()) {
            return Err(PlaneError::invalid(format!(
                "weld_tolerance must be positive, got {}",
                self.weld_tolerance
            )));
        }
        if self.min_triangles == 0 {
            return Err(PlaneError::invalid("min_triangles must be at least 1"));
        }
        if !(self.min_area >= 0.0 && self.min_area.is_finite()) {
            return Err(PlaneError::invalid(format!(
                "min_area must be non-negative, got {}",
                self.min_area
            )));
        }
        if !(0.0..std::f64::consts::FRAC_PI_4).contains(&self.snap_to_gravity_threshold) {
            return Err(PlaneError::invalid(format!(
                "snap_to_gravity_threshold must be in [0, pi/4), got {}",
                self.snap_to_gravity_threshold
            )));
        }
        if !(self.degenerate_area >= 0.0 && self.degenerate_area.is_finite()) {
            return Err(PlaneError::invalid(format!(
                "degenerate_area must be non-negative, got {}",
                self.degenerate_area
            )));
        }
        Ok(())
    }
}
