use std::time::Duration;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tablegraph::{GraphStore, MemoryStore};

const EDGE_SEED: u64 = 0xA17C;
const SAMPLE_SIZE: usize = 20;
const WARM_UP: Duration = Duration::from_millis(300);
const MEASURE: Duration = Duration::from_millis(500);

fn bench_scales() -> &'static [usize] {
    &[1_000, 10_000]
}

fn vertex_id(i: usize) -> Vec<u8> {
    format!("v{i:08}").into_bytes()
}

fn random_edges(vertices: usize, edges: usize, seed: u64) -> Vec<(usize, usize)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..edges)
        .map(|_| (rng.gen_range(0..vertices), rng.gen_range(0..vertices)))
        .collect()
}

fn populated(vertices: usize) -> GraphStore<MemoryStore> {
    let graph = GraphStore::with_prefix(MemoryStore::new(), "bench").expect("graph");
    for i in 0..vertices {
        graph.add_vertex(Some(&vertex_id(i))).expect("vertex");
    }
    for (n, (out, inn)) in random_edges(vertices, vertices * 5, EDGE_SEED).into_iter().enumerate() {
        let id = format!("e{n:08}").into_bytes();
        graph
            .add_edge(Some(&id), &vertex_id(out), &vertex_id(inn))
            .expect("edge");
    }
    graph
}

fn bench_add_edge(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_edge");
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(WARM_UP);
    group.measurement_time(MEASURE);
    for &vertices in bench_scales() {
        let edges = random_edges(vertices, vertices, EDGE_SEED + vertices as u64);
        group.bench_with_input(BenchmarkId::from_parameter(vertices), &edges, |b, edges| {
            b.iter_batched(
                || GraphStore::with_prefix(MemoryStore::new(), "bench").expect("graph"),
                |graph| {
                    for &(out, inn) in edges {
                        graph
                            .add_edge(None, &vertex_id(out), &vertex_id(inn))
                            .expect("edge");
                    }
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_edges_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("edges_out");
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(WARM_UP);
    group.measurement_time(MEASURE);
    for &vertices in bench_scales() {
        let graph = populated(vertices);
        group.bench_with_input(BenchmarkId::from_parameter(vertices), &graph, |b, graph| {
            let mut next = 0;
            b.iter(|| {
                let id = vertex_id(next % vertices);
                next += 1;
                graph.edges_out(&id).expect("scan").count()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_add_edge, bench_edges_out);
criterion_main!(benches);
