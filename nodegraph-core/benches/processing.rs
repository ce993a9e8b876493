//! Processing Benchmarks
//!
//! Propagation through pass-through chains, direct versus batched, and codec
//! round trips.
//!
//! Run with: `cargo bench -p nodegraph-core`

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nodegraph_core::codec::{export, import, NodeRegistry};
use nodegraph_core::node::{Node, TriggerPolicy};
use nodegraph_core::nodes::{Add, PassThrough};
use nodegraph_core::{batch, GraphContainer};

/// A chain of `len` pass-through nodes; returns every node, head first.
fn chain(len: usize) -> Vec<Node> {
    let nodes: Vec<Node> = (0..len).map(|_| PassThrough::node().expect("node")).collect();
    for pair in nodes.windows(2) {
        pair[0].connect("", &pair[1], "").expect("connect");
    }
    nodes
}

fn bench_chain_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_propagation");

    for len in [10, 100, 1000] {
        let nodes = chain(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &nodes, |b, nodes| {
            let mut x = 0.0_f64;
            b.iter(|| {
                x += 1.0;
                black_box(nodes[0].set_input("", x).expect("set"))
            });
        });
    }

    group.finish();
}

fn bench_batched_inputs(c: &mut Criterion) {
    let mut group = c.benchmark_group("batched_inputs");

    let add = Add::node(TriggerPolicy::Any).expect("node");
    group.bench_function("unbatched", |b| {
        b.iter(|| {
            add.set_input("a", 1.0).expect("set");
            add.set_input("b", 2.0).expect("set");
        });
    });
    group.bench_function("batched", |b| {
        b.iter(|| {
            batch(|| {
                add.set_input("a", 1.0).expect("set");
                add.set_input("b", 2.0).expect("set");
            })
        });
    });

    group.finish();
}

fn bench_codec_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_round_trip");
    let registry = NodeRegistry::with_builtins();

    for len in [10, 100] {
        let container = GraphContainer::with_nodes(chain(len)).expect("container");
        group.bench_with_input(BenchmarkId::from_parameter(len), &container, |b, container| {
            b.iter(|| {
                let graph = export(container).expect("export");
                black_box(import(&graph, &registry).expect("import"))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_chain_propagation,
    bench_batched_inputs,
    bench_codec_round_trip
);
criterion_main!(benches);
