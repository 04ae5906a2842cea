//! Insertion, query and neighbour throughput at a few capacities.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mesh_memory::{MeshConfig, MeshMemory};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DIM: usize = 32;

fn latents(rng: &mut StdRng, n: usize) -> Vec<Vec<f32>> {
    (0..n)
        .map(|_| (0..DIM).map(|_| rng.gen_range(-0.15..0.15)).collect())
        .collect()
}

fn full_mesh(capacity: usize, rng: &mut StdRng) -> MeshMemory {
    let config = MeshConfig::new(capacity, DIM).with_neighbor_r(0.35);
    let mut mesh = MeshMemory::euclidean(config).unwrap();
    mesh.add_latents(latents(rng, capacity)).unwrap();
    mesh
}

fn bench_add_with_eviction(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_evict");
    for capacity in [256, 1024] {
        let mut rng = StdRng::seed_from_u64(100);
        let mut mesh = full_mesh(capacity, &mut rng);
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, _| {
            b.iter(|| {
                let batch = latents(&mut rng, 5);
                black_box(mesh.add_latents(batch).unwrap());
            })
        });
    }
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    for capacity in [256, 1024] {
        let mut rng = StdRng::seed_from_u64(7);
        let mesh = full_mesh(capacity, &mut rng);
        let probe = latents(&mut rng, 1).remove(0);
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, _| {
            b.iter(|| black_box(mesh.query(&probe, Some(0.35), None).unwrap()))
        });
    }
    group.finish();
}

fn bench_neighbors(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let mesh = full_mesh(1024, &mut rng);
    c.bench_function("neighbors_1024", |b| {
        b.iter(|| black_box(mesh.neighbors(black_box(17)).unwrap()))
    });
}

criterion_group!(benches, bench_add_with_eviction, bench_query, bench_neighbors);
criterion_main!(benches);
