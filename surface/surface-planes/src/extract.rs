//! Plane extraction entry point.

use std::fmt;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::bounded::BoundedPlane;
use crate::cluster::{TriangleSoup, grow_regions};
use crate::error::PlaneResult;
use crate::fit::{Rejection, fit_cluster};
use crate::fragment::MeshFragment;
use crate::params::PlaneFindingParams;

/// Result of a plane extraction.
#[derive(Debug, Clone, Default)]
pub struct PlaneFindingResult {
    /// Planes found, in cluster seed order (largest seed triangle first).
    pub planes: Vec<BoundedPlane>,
    /// Non-degenerate triangles that took part in clustering.
    pub triangles_considered: usize,
    /// Faces skipped for bad indices or (near) zero area.
    pub degenerate_triangles: usize,
    /// Clusters produced by region growing.
    pub clusters_found: usize,
    /// Clusters that did not become planes.
    pub clusters_rejected: usize,
}

impl PlaneFindingResult {
    /// Check whether any plane was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// Total area of all planes found.
    #[must_use]
    pub fn total_area(&self) -> f64 {
        self.planes.iter().map(|p| p.area).sum()
    }
}

impl fmt::Display for PlaneFindingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Found {} planes ({:.2} m²) from {} triangles: {} clusters, {} rejected, {} degenerate faces",
            self.planes.len(),
            self.total_area(),
            self.triangles_considered,
            self.clusters_found,
            self.clusters_rejected,
            self.degenerate_triangles
        )
    }
}

/// Find bounded planar surfaces in a set of scanned fragments.
///
/// Fragments are treated as one surface in world space: vertices closer
/// than the weld tolerance are joined, so a floor split across several
/// fragments comes back as a single plane. The output is deterministic for
/// a given fragment order.
///
/// # Errors
///
/// Returns [`PlaneError::InvalidParameter`](crate::PlaneError::InvalidParameter)
/// if `params` fails validation.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex};
/// use surface_planes::{find_planes, MeshFragment, MeshId, PlaneFindingParams};
///
/// let floor = IndexedMesh::from_parts(
///     vec![
///         Vertex::from_coords(0.0, -1.5, 0.0),
///         Vertex::from_coords(0.0, -1.5, 2.0),
///         Vertex::from_coords(3.0, -1.5, 2.0),
///         Vertex::from_coords(3.0, -1.5, 0.0),
///     ],
///     vec![[0, 1, 2], [0, 2, 3]],
/// );
///
/// let result = find_planes(&[MeshFragment::new(MeshId(1), floor)], &PlaneFindingParams::default())
///     .unwrap();
///
/// assert_eq!(result.planes.len(), 1);
/// assert!((result.planes[0].area - 6.0).abs() < 1e-9);
/// ```
pub fn find_planes(
    fragments: &[MeshFragment],
    params: &PlaneFindingParams,
) -> PlaneResult<PlaneFindingResult> {
    params.validate()?;

    let soup = TriangleSoup::build(fragments, params);
    if soup.is_empty() {
        debug!(
            fragments = fragments.len(),
            degenerate = soup.degenerate,
            "No usable triangles"
        );
        return Ok(PlaneFindingResult {
            degenerate_triangles: soup.degenerate,
            ..PlaneFindingResult::default()
        });
    }

    let clusters = grow_regions(&soup, params);

    // Singletons are the bulk of clusters on noisy scans; drop them before
    // handing the rest to the pool. Order is preserved either way.
    let candidates: Vec<_> = clusters
        .iter()
        .filter(|c| c.triangles.len() >= params.min_triangles)
        .collect();
    let too_few = clusters.len() - candidates.len();

    let fitted: Vec<Result<BoundedPlane, Rejection>> = candidates
        .par_iter()
        .map(|cluster| fit_cluster(&soup, cluster, params))
        .collect();

    let mut planes = Vec::with_capacity(fitted.len());
    let mut degenerate_clusters = 0usize;
    let mut too_small = 0usize;
    for outcome in fitted {
        match outcome {
            Ok(plane) => planes.push(plane),
            Err(Rejection::Degenerate) => degenerate_clusters += 1,
            Err(Rejection::TooSmall) => too_small += 1,
            Err(Rejection::TooFewTriangles) => {}
        }
    }

    let result = PlaneFindingResult {
        clusters_found: clusters.len(),
        clusters_rejected: clusters.len() - planes.len(),
        triangles_considered: soup.len(),
        degenerate_triangles: soup.degenerate,
        planes,
    };

    debug!(too_few, degenerate_clusters, too_small, "Rejected clusters");
    info!(
        fragments = fragments.len(),
        planes = result.planes.len(),
        triangles = result.triangles_considered,
        clusters = result.clusters_found,
        "Plane extraction complete"
    );

    Ok(result)
}
