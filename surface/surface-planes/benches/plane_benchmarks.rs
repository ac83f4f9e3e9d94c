//! Benchmarks for plane extraction and classification.
//!
//! Run with: cargo bench -p surface-planes
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p surface-planes -- --save-baseline main
//! 2. After changes: cargo bench -p surface-planes -- --baseline main

#![allow(missing_docs, clippy::cast_possible_truncation, clippy::cast_precision_loss)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use mesh_types::{IndexedMesh, Vertex};
use nalgebra::Point3;
use surface_planes::{
    ClassificationParams, MeshFragment, MeshId, PlaneFindingParams, classify, find_planes,
};

// =============================================================================
// Test Scene Generation
// =============================================================================

/// Grid of `n x n` cells, built by mapping `(s, t)` in the unit square
/// through `place`. `flip` reverses the winding.
fn grid(n: u32, place: impl Fn(f64, f64) -> Point3<f64>, flip: bool) -> IndexedMesh {
    let mut mesh = IndexedMesh::new();
    for i in 0..=n {
        for j in 0..=n {
            let p = place(f64::from(i) / f64::from(n), f64::from(j) / f64::from(n));
            mesh.vertices.push(Vertex::new(p));
        }
    }
    let row = n + 1;
    for i in 0..n {
        for j in 0..n {
            let a = i * row + j;
            let (b, c, d) = (a + 1, a + row + 1, a + row);
            if flip {
                mesh.faces.push([a, c, b]);
                mesh.faces.push([a, d, c]);
            } else {
                mesh.faces.push([a, b, c]);
                mesh.faces.push([a, c, d]);
            }
        }
    }
    mesh
}

/// A 6m x 5m room with a table, each surface tessellated `n x n` and the
/// floor split into four fragments.
fn create_room(n: u32) -> Vec<MeshFragment> {
    let (w, d, floor, ceiling) = (6.0, 5.0, -1.5, 1.1);
    let mut fragments = Vec::new();
    let mut id = 0;
    let mut push = |mesh: IndexedMesh| {
        id += 1;
        fragments.push(MeshFragment::new(MeshId(id), mesh));
    };

    for (x0, z0) in [(0.0, 0.0), (0.5, 0.0), (0.0, 0.5), (0.5, 0.5)] {
        push(grid(
            n / 2,
            move |s, t| Point3::new((x0 + s * 0.5) * w, floor, (z0 + t * 0.5) * d),
            false,
        ));
    }
    push(grid(n, |s, t| Point3::new(s * w, ceiling, t * d), true));
    push(grid(n, |s, t| Point3::new(s * w, floor + t * (ceiling - floor), 0.0), true));
    push(grid(n, |s, t| Point3::new(s * w, floor + t * (ceiling - floor), d), false));
    push(grid(n, |s, t| Point3::new(0.0, floor + s * (ceiling - floor), t * d), true));
    push(grid(n, |s, t| Point3::new(w, floor + s * (ceiling - floor), t * d), false));
    push(grid(n / 4 + 1, |s, t| Point3::new(2.0 + s * 1.2, -0.75, 2.0 + t * 0.8), false));

    fragments
}

fn triangle_count(fragments: &[MeshFragment]) -> u64 {
    fragments.iter().map(|f| f.mesh.faces.len() as u64).sum()
}

// =============================================================================
// Extraction Benchmarks
// =============================================================================

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("Extraction");

    let test_cases = [
        ("room_8", create_room(8)),
        ("room_32", create_room(32)),
        ("room_96", create_room(96)),
    ];

    for (name, fragments) in &test_cases {
        group.throughput(Throughput::Elements(triangle_count(fragments)));

        group.bench_with_input(BenchmarkId::new("find_planes", name), fragments, |b, fragments| {
            let params = PlaneFindingParams::for_rooms();
            b.iter(|| find_planes(black_box(fragments), black_box(&params)))
        });
    }

    group.finish();
}

// =============================================================================
// Classification Benchmarks
// =============================================================================

fn bench_classification(c: &mut Criterion) {
    let mut group = c.benchmark_group("Classification");

    let fragments = create_room(32);
    let planes = find_planes(&fragments, &PlaneFindingParams::for_rooms())
        .map(|r| r.planes)
        .unwrap_or_default();
    let params = ClassificationParams::default();

    group.bench_function("classify_room", |b| {
        b.iter(|| classify(black_box(planes.clone()), 0.0, black_box(&params)))
    });

    group.finish();
}

// =============================================================================
// Criterion Setup
// =============================================================================

criterion_group!(benches, bench_extraction, bench_classification);
criterion_main!(benches);
