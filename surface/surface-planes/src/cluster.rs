//! Region growing over the joint triangle soup of all fragments.
//!
//! Fragments are flattened into one world-space soup and vertices are
//! welded across fragment seams. Triangles whose bounding boxes come within
//! `max_plane_distance` of each other are neighbours, so overlapping scans
//! and small seam gaps still connect. Near-coplanar neighbours are grouped
//! by a breadth-first flood fill against an evolving plane estimate.

use std::collections::VecDeque;

use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::fragment::MeshFragment;
use crate::params::PlaneFindingParams;

/// One non-degenerate world-space triangle.
#[derive(Debug, Clone)]
pub(crate) struct SoupTriangle {
    pub corners: [Point3<f64>; 3],
    pub welded: [u32; 3],
    pub normal: Vector3<f64>,
    pub area: f64,
    pub centroid: Point3<f64>,
}

/// All usable triangles of a pass, in fragment order then face order.
#[derive(Debug, Default)]
pub(crate) struct TriangleSoup {
    pub triangles: Vec<SoupTriangle>,
    pub proximity: ProximityGrid,
    pub degenerate: usize,
}

impl TriangleSoup {
    /// Flatten fragments into a welded soup.
    ///
    /// Faces with out-of-range indices, zero-area faces and faces without a
    /// defined normal are counted as degenerate and left out.
    pub fn build(fragments: &[MeshFragment], params: &PlaneFindingParams) -> Self {
        let mut triangles = Vec::new();
        let mut corners = Vec::new();
        let mut degenerate = 0;

        for fragment in fragments {
            for face in fragment.world_faces() {
                let Some(tri) = face else {
                    degenerate += 1;
                    continue;
                };
                let area = tri.area();
                let normal = match tri.normal() {
                    Some(n) if !tri.is_degenerate(params.degenerate_area) => n,
                    _ => {
                        degenerate += 1;
                        continue;
                    }
                };
                corners.extend_from_slice(&tri.vertices());
                triangles.push(SoupTriangle {
                    corners: tri.vertices(),
                    welded: [0; 3],
                    normal,
                    area,
                    centroid: tri.centroid(),
                });
            }
        }

        let (remap, vertex_count) = weld_positions(&corners, params.weld_tolerance);
        for (ti, tri) in triangles.iter_mut().enumerate() {
            tri.welded = [remap[ti * 3], remap[ti * 3 + 1], remap[ti * 3 + 2]];
        }
        let proximity = ProximityGrid::build(&triangles, params.max_plane_distance);

        debug!(
            triangles = triangles.len(),
            degenerate,
            welded_vertices = vertex_count,
            cell_size = proximity.cell_size,
            "Built triangle soup"
        );

        Self {
            triangles,
            proximity,
            degenerate,
        }
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Weld positions closer than `epsilon` and return a compact id per input
/// position plus the number of distinct ids.
///
/// Ids are assigned in order of first appearance, so the result only
/// depends on input order.
#[allow(clippy::cast_possible_truncation)]
fn weld_positions(positions: &[Point3<f64>], epsilon: f64) -> (Vec<u32>, usize) {
    let cell_size = epsilon * 2.0;
    let mut spatial_hash: HashMap<CellKey, Vec<u32>> = HashMap::new();
    for (idx, p) in positions.iter().enumerate() {
        spatial_hash
            .entry(pos_to_cell(p, cell_size))
            .or_default()
            .push(idx as u32);
    }

    let mut canonical: Vec<u32> = (0..positions.len() as u32).collect();
    for (idx, p) in positions.iter().enumerate() {
        let idx = idx as u32;
        if canonical[idx as usize] != idx {
            continue;
        }
        let cell = pos_to_cell(p, cell_size);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(candidates) = spatial_hash.get(&(cell.0 + dx, cell.1 + dy, cell.2 + dz))
                    else {
                        continue;
                    };
                    for &other in candidates {
                        if other <= idx || canonical[other as usize] != other {
                            continue;
                        }
                        if (positions[other as usize] - p).norm() < epsilon {
                            canonical[other as usize] = idx;
                        }
                    }
                }
            }
        }
    }

    // Resolve chains, then compact
    let mut compact: Vec<u32> = vec![u32::MAX; positions.len()];
    let mut next = 0u32;
    let mut ids = Vec::with_capacity(positions.len());
    for i in 0..canonical.len() {
        let mut root = canonical[i];
        while canonical[root as usize] != root {
            root = canonical[root as usize];
        }
        if compact[root as usize] == u32::MAX {
            compact[root as usize] = next;
            next += 1;
        }
        ids.push(compact[root as usize]);
    }

    (ids, next as usize)
}

#[allow(clippy::cast_possible_truncation)]
fn pos_to_cell(p: &Point3<f64>, cell_size: f64) -> CellKey {
    (
        (p.x / cell_size).floor() as i64,
        (p.y / cell_size).floor() as i64,
        (p.z / cell_size).floor() as i64,
    )
}

type CellKey = (i64, i64, i64);

/// Spatial hash over triangle bounding boxes.
///
/// Each triangle is registered in every cell its box touches. Cells are
/// sized from the mean box extent, never smaller than the reach, and grown
/// so the largest triangle spans a bounded number of cells.
#[derive(Debug, Default)]
pub(crate) struct ProximityGrid {
    cell_size: f64,
    reach: f64,
    boxes: Vec<(Point3<f64>, Point3<f64>)>,
    cells: HashMap<CellKey, Vec<u32>>,
}

impl ProximityGrid {
    #[allow(clippy::cast_possible_truncation)]
    fn build(triangles: &[SoupTriangle], reach: f64) -> Self {
        let boxes: Vec<(Point3<f64>, Point3<f64>)> =
            triangles.iter().map(|t| corner_box(&t.corners)).collect();
        if boxes.is_empty() {
            return Self::default();
        }

        let spans: Vec<f64> = boxes.iter().map(|(lo, hi)| (hi - lo).max()).collect();
        let mean = spans.iter().sum::<f64>() / spans.len() as f64;
        let largest = spans.iter().copied().fold(0.0, f64::max);
        let cell_size = mean.max(largest / 32.0).max(reach).max(1e-6);

        let mut cells: HashMap<CellKey, Vec<u32>> = HashMap::new();
        for (ti, (lo, hi)) in boxes.iter().enumerate() {
            for_each_cell(lo, hi, cell_size, |key| {
                cells.entry(key).or_default().push(ti as u32);
            });
        }

        Self {
            cell_size,
            reach,
            boxes,
            cells,
        }
    }

    /// Fill `out` with the triangles whose boxes lie within the reach of
    /// triangle `index`'s box, ascending and excluding `index` itself.
    fn neighbors(&self, index: usize, out: &mut Vec<u32>) {
        out.clear();
        let (lo, hi) = self.boxes[index];
        let pad = Vector3::repeat(self.reach);
        for_each_cell(&(lo - pad), &(hi + pad), self.cell_size, |key| {
            if let Some(members) = self.cells.get(&key) {
                out.extend_from_slice(members);
            }
        });
        out.sort_unstable();
        out.dedup();
        out.retain(|&other| other as usize != index && self.within_reach(index, other as usize));
    }

    fn within_reach(&self, a: usize, b: usize) -> bool {
        let (lo_a, hi_a) = self.boxes[a];
        let (lo_b, hi_b) = self.boxes[b];
        (0..3).all(|k| lo_a[k] <= hi_b[k] + self.reach && lo_b[k] <= hi_a[k] + self.reach)
    }
}

fn corner_box(corners: &[Point3<f64>; 3]) -> (Point3<f64>, Point3<f64>) {
    let lo = corners[0].coords.inf(&corners[1].coords).inf(&corners[2].coords);
    let hi = corners[0].coords.sup(&corners[1].coords).sup(&corners[2].coords);
    (Point3::from(lo), Point3::from(hi))
}

fn for_each_cell(
    lo: &Point3<f64>,
    hi: &Point3<f64>,
    cell_size: f64,
    mut visit: impl FnMut(CellKey),
) {
    let from = pos_to_cell(lo, cell_size);
    let to = pos_to_cell(hi, cell_size);
    for x in from.0..=to.0 {
        for y in from.1..=to.1 {
            for z in from.2..=to.2 {
                visit((x, y, z));
            }
        }
    }
}

/// Running area-weighted plane estimate of a growing region.
#[derive(Debug, Clone)]
pub(crate) struct PlaneEstimate {
    pub normal_sum: Vector3<f64>,
    centroid_sum: Vector3<f64>,
    pub area: f64,
    seed_normal: Vector3<f64>,
}

impl PlaneEstimate {
    fn seeded(tri: &SoupTriangle) -> Self {
        Self {
            normal_sum: tri.normal * tri.area,
            centroid_sum: tri.centroid.coords * tri.area,
            area: tri.area,
            seed_normal: tri.normal,
        }
    }

    fn add(&mut self, tri: &SoupTriangle) {
        self.normal_sum += tri.normal * tri.area;
        self.centroid_sum += tri.centroid.coords * tri.area;
        self.area += tri.area;
    }

    pub fn normal(&self) -> Vector3<f64> {
        self.normal_sum
            .try_normalize(f64::EPSILON)
            .unwrap_or(self.seed_normal)
    }

    fn point(&self) -> Point3<f64> {
        Point3::from(self.centroid_sum / self.area)
    }

    fn accepts(&self, tri: &SoupTriangle, min_dot: f64, max_distance: f64) -> bool {
        let normal = self.normal();
        if tri.normal.dot(&normal) < min_dot {
            return false;
        }
        let origin = self.point();
        tri.corners
            .iter()
            .all(|c| normal.dot(&(c - origin)).abs() <= max_distance)
    }
}

/// A connected group of near-coplanar triangles.
#[derive(Debug, Clone)]
pub(crate) struct Cluster {
    /// Member triangle indices, in the order they joined.
    pub triangles: Vec<usize>,
    pub estimate: PlaneEstimate,
}

/// Partition the soup into clusters.
///
/// Candidates come from the proximity grid in ascending index order. Seeds are taken by triangle area, largest first; equal areas keep soup
/// order. Every triangle ends up in exactly one cluster, and clusters are
/// returned in seed order.
pub(crate) fn grow_regions(soup: &TriangleSoup, params: &PlaneFindingParams) -> Vec<Cluster> {
    let tris = &soup.triangles;
    let mut order: Vec<usize> = (0..tris.len()).collect();
    // Stable sort keeps ascending index for equal areas
    order.sort_by(|&a, &b| tris[b].area.total_cmp(&tris[a].area));

    let min_dot = params.min_normal_dot();
    let mut assigned = vec![false; tris.len()];
    let mut clusters = Vec::new();
    let mut queue: VecDeque<usize> = VecDeque::new();
    let mut nearby: Vec<u32> = Vec::new();

    for seed in order {
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;

        let mut estimate = PlaneEstimate::seeded(&tris[seed]);
        let mut members = vec![seed];
        queue.push_back(seed);

        while let Some(current) = queue.pop_front() {
            soup.proximity.neighbors(current, &mut nearby);
            for &neighbor in &nearby {
                let neighbor = neighbor as usize;
                if assigned[neighbor] {
                    continue;
                }
                let tri = &tris[neighbor];
                if !estimate.accepts(tri, min_dot, params.max_plane_distance) {
                    continue;
                }
                assigned[neighbor] = true;
                estimate.add(tri);
                members.push(neighbor);
                queue.push_back(neighbor);
            }
        }

        clusters.push(Cluster {
            triangles: members,
            estimate,
        });
    }

    debug!(
        clusters = clusters.len(),
        triangles = tris.len(),
        "Grew planar regions"
    );

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::MeshId;
    use mesh_types::{IndexedMesh, Vertex};
    use nalgebra::Isometry3;

    /// A grid of `n x n` unit quads on the floor at height `y`, offset by `x0`.
    fn floor_grid(n: u32, y: f64, x0: f64) -> IndexedMesh {
        let mut mesh = IndexedMesh::new();
        for i in 0..=n {
            for j in 0..=n {
                mesh.vertices
                    .push(Vertex::from_coords(x0 + f64::from(i), y, f64::from(j)));
            }
        }
        let row = n + 1;
        for i in 0..n {
            for j in 0..n {
                let a = i * row + j;
                let b = a + 1;
                let c = a + row + 1;
                let d = a + row;
                // CCW seen from above (+Y)
                mesh.faces.push([a, b, c]);
                mesh.faces.push([a, c, d]);
            }
        }
        mesh
    }

    fn fragment(id: i32, mesh: IndexedMesh) -> MeshFragment {
        MeshFragment::new(MeshId(id), mesh)
    }

    #[test]
    fn weld_merges_close_points() {
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.001, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.004),
            Point3::new(5.0, 5.0, 5.0),
        ];
        let (ids, count) = weld_positions(&positions, 0.01);
        assert_eq!(count, 3);
        assert_eq!(ids, vec![0, 1, 0, 1, 2]);
    }

    #[test]
    fn soup_skips_degenerate_and_invalid_faces() {
        let mut mesh = floor_grid(1, 0.0, 0.0);
        mesh.vertices.push(Vertex::from_coords(3.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(3.0, 0.0, 0.0));
        mesh.faces.push([4, 5, 4]); // zero area
        mesh.faces.push([0, 1, 42]); // bad index

        let soup = TriangleSoup::build(&[fragment(1, mesh)], &PlaneFindingParams::default());
        assert_eq!(soup.len(), 2);
        assert_eq!(soup.degenerate, 2);
    }

    #[test]
    fn seam_between_fragments_is_welded() {
        // Two 2x2 grids that touch along x = 2
        let left = fragment(1, floor_grid(2, 0.0, 0.0));
        let right = fragment(2, floor_grid(2, 0.0, 2.0));
        let params = PlaneFindingParams::default();

        let soup = TriangleSoup::build(&[left, right], &params);
        let clusters = grow_regions(&soup, &params);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].triangles.len(), 16);
    }

    #[test]
    fn overlapping_fragments_grow_together() {
        let a = fragment(1, floor_grid(3, 0.0, 0.0));
        let b = fragment(2, floor_grid(3, 0.0, 0.0))
            .with_transform(Isometry3::translation(1.25, 0.0, 0.25));
        let params = PlaneFindingParams::default();

        let soup = TriangleSoup::build(&[a, b], &params);
        let clusters = grow_regions(&soup, &params);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].triangles.len(), 36);
    }

    #[test]
    fn seam_gap_within_reach_is_bridged() {
        // 2cm gap, under the 5cm default reach
        let left = fragment(1, floor_grid(2, 0.0, 0.0));
        let right = fragment(2, floor_grid(2, 0.0, 2.02));
        let params = PlaneFindingParams::default();

        let soup = TriangleSoup::build(&[left, right], &params);
        assert_eq!(grow_regions(&soup, &params).len(), 1);
    }

    #[test]
    fn gap_beyond_reach_separates() {
        let left = fragment(1, floor_grid(2, 0.0, 0.0));
        let right = fragment(2, floor_grid(2, 0.0, 2.2));
        let params = PlaneFindingParams::default();

        let soup = TriangleSoup::build(&[left, right], &params);
        assert_eq!(grow_regions(&soup, &params).len(), 2);
    }

    #[test]
    fn neighbors_are_ascending_without_self() {
        let params = PlaneFindingParams::default();
        let soup = TriangleSoup::build(&[fragment(1, floor_grid(3, 0.0, 0.0))], &params);

        let mut nearby = Vec::new();
        soup.proximity.neighbors(0, &mut nearby);
        assert!(!nearby.contains(&0));
        assert!(nearby.windows(2).all(|w| w[0] < w[1]));
        // The quad partner and the quads sharing its edges
        assert!(nearby.contains(&1));
        assert!(nearby.contains(&2));
        // The far corner quad is out of reach
        assert!(!nearby.contains(&16) && !nearby.contains(&17));
    }

    #[test]
    fn separated_surfaces_stay_apart() {
        let floor = fragment(1, floor_grid(2, -1.5, 0.0));
        let table = fragment(2, floor_grid(1, -0.8, 0.5));
        let params = PlaneFindingParams::default();

        let soup = TriangleSoup::build(&[floor, table], &params);
        let clusters = grow_regions(&soup, &params);
        assert_eq!(clusters.len(), 2);

        let mut sizes: Vec<_> = clusters.iter().map(|c| c.triangles.len()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![2, 8]);
    }

    #[test]
    fn crease_splits_regions() {
        // Floor quad plus a wall quad sharing the edge z = 0
        let mut mesh = floor_grid(1, 0.0, 0.0);
        mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 0.0));
        // Wall facing +Z
        mesh.faces.push([0, 2, 5]);
        mesh.faces.push([0, 5, 4]);

        let params = PlaneFindingParams::default();
        let soup = TriangleSoup::build(&[fragment(1, mesh)], &params);
        let clusters = grow_regions(&soup, &params);
        assert_eq!(clusters.len(), 2);
        for cluster in &clusters {
            assert_eq!(cluster.triangles.len(), 2);
        }
    }

    #[test]
    fn seed_order_is_largest_first() {
        let small = fragment(1, floor_grid(1, 0.0, 10.0));
        let mut big = floor_grid(1, 0.0, 0.0);
        for v in &mut big.vertices {
            v.position.x *= 3.0;
        }
        let params = PlaneFindingParams::default();

        let soup = TriangleSoup::build(&[small, fragment(2, big)], &params);
        let clusters = grow_regions(&soup, &params);
        assert_eq!(clusters.len(), 2);
        // The bigger quad's triangles come later in the soup but seed first
        assert!(clusters[0].triangles.iter().all(|&t| t >= 2));
    }

    #[test]
    fn transformed_fragment_joins_neighbour() {
        // Same grid placed next to the first one via its transform
        let a = fragment(1, floor_grid(1, 0.0, 0.0));
        let b = fragment(2, floor_grid(1, 0.0, 0.0))
            .with_transform(Isometry3::translation(1.0, 0.0, 0.0));
        let params = PlaneFindingParams::default();

        let soup = TriangleSoup::build(&[a, b], &params);
        let clusters = grow_regions(&soup, &params);
        assert_eq!(clusters.len(), 1);
    }
}
