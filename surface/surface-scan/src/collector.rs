//! Snapshotting scanned meshes into extraction input.

use std::fmt;

use surface_planes::MeshFragment;
use tracing::debug;

use crate::provider::ScanMesh;

/// Fragments taken from one provider snapshot.
#[derive(Debug, Clone, Default)]
pub struct CollectedFragments {
    /// Usable fragments, sorted by id.
    pub fragments: Vec<MeshFragment>,
    /// Entries skipped for missing or empty geometry.
    pub skipped: usize,
}

impl CollectedFragments {
    /// Total face count over all fragments.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.fragments.iter().map(|f| f.mesh.face_count()).sum()
    }

    /// Check whether no fragment was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl fmt::Display for CollectedFragments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Collected {} fragments ({} faces), skipped {}",
            self.fragments.len(),
            self.face_count(),
            self.skipped
        )
    }
}

/// Copy usable scan meshes into fragments.
///
/// Entries without geometry, faces or vertices are skipped. Each kept mesh
/// is copied and its vertex normals recomputed from its faces, so the
/// provider's data is never touched and hosts inspecting the fragments see
/// normals that match the geometry. Extraction itself works from face
/// normals and never reads vertex normals. Output is sorted by id.
#[must_use]
pub fn collect_fragments(meshes: &[ScanMesh]) -> CollectedFragments {
    let mut fragments = Vec::with_capacity(meshes.len());
    let mut skipped = 0;

    for scan in meshes {
        let Some(source) = scan.mesh.as_deref() else {
            skipped += 1;
            continue;
        };
        if source.is_empty() {
            skipped += 1;
            continue;
        }

        let mut mesh = source.clone();
        mesh.recompute_normals();
        fragments.push(MeshFragment::new(scan.id, mesh).with_transform(scan.transform));
    }

    fragments.sort_by_key(|f| f.id);

    let collected = CollectedFragments { fragments, skipped };
    debug!(
        fragments = collected.fragments.len(),
        faces = collected.face_count(),
        skipped,
        "Collected scan meshes"
    );
    collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_types::{IndexedMesh, Vertex};
    use nalgebra::{Isometry3, Vector3};
    use std::sync::Arc;
    use surface_planes::MeshId;

    fn triangle_with_stale_normals() -> IndexedMesh {
        IndexedMesh::from_parts(
            vec![
                Vertex::with_normal(nalgebra::Point3::new(0.0, 0.0, 0.0), Vector3::x()),
                Vertex::with_normal(nalgebra::Point3::new(0.0, 0.0, 1.0), Vector3::x()),
                Vertex::with_normal(nalgebra::Point3::new(1.0, 0.0, 0.0), Vector3::x()),
            ],
            vec![[0, 1, 2]],
        )
    }

    #[test]
    fn skips_missing_and_empty_meshes() {
        let meshes = vec![
            ScanMesh::pending(MeshId(1)),
            ScanMesh::new(MeshId(2), IndexedMesh::new()),
            ScanMesh::new(
                MeshId(3),
                IndexedMesh::from_parts(vec![Vertex::from_coords(0.0, 0.0, 0.0)], vec![]),
            ),
            ScanMesh::new(MeshId(4), triangle_with_stale_normals()),
        ];
        let collected = collect_fragments(&meshes);
        assert_eq!(collected.fragments.len(), 1);
        assert_eq!(collected.skipped, 3);
        assert_eq!(collected.fragments[0].id, MeshId(4));
    }

    #[test]
    fn recomputes_normals_on_a_copy() {
        let source = Arc::new(triangle_with_stale_normals());
        let scan = ScanMesh {
            id: MeshId(1),
            mesh: Some(Arc::clone(&source)),
            transform: Isometry3::translation(0.0, -1.5, 0.0),
        };

        let collected = collect_fragments(&[scan]);
        let fragment = &collected.fragments[0];
        for v in &fragment.mesh.vertices {
            assert_relative_eq!(v.normal.unwrap(), Vector3::y(), epsilon = 1e-12);
        }
        assert_relative_eq!(fragment.transform.translation.vector.y, -1.5);

        // Provider data untouched
        assert_eq!(source.vertices[0].normal, Some(Vector3::x()));
    }

    #[test]
    fn output_is_sorted_by_id() {
        let meshes = vec![
            ScanMesh::new(MeshId(8), triangle_with_stale_normals()),
            ScanMesh::new(MeshId(-1), triangle_with_stale_normals()),
            ScanMesh::new(MeshId(3), triangle_with_stale_normals()),
        ];
        let ids: Vec<_> = collect_fragments(&meshes)
            .fragments
            .iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec![MeshId(-1), MeshId(3), MeshId(8)]);
    }

    #[test]
    fn display_summarises() {
        let collected = collect_fragments(&[ScanMesh::new(MeshId(1), triangle_with_stale_normals())]);
        assert_eq!(collected.to_string(), "Collected 1 fragments (1 faces), skipped 0");
    }
}
