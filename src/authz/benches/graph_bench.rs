//! Permission graph benchmarks
//!
//! Layered synthetic graphs: every permission in layer `n` depends on a few
//! permissions in layer `n - 1`, so guard checks and closures walk real depth.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use permgraph_authz::graph::{
    check_all_cycles, compute_closure, would_create_cycle, ClosureQuery, Direction,
    PermissionGraph,
};
use permgraph_authz::{
    AuthorizationResolver, DependencyEdge, PermissionId, PermissionNode, RoleNode, SubjectType,
    UserSubject,
};

const LAYER_WIDTH: u64 = 50;

fn layered_graph(layers: u64) -> PermissionGraph {
    let nodes = (0..layers * LAYER_WIDTH)
        .map(|i| PermissionNode::from_name(i, format!("module{}.perm{}", i / LAYER_WIDTH, i)));

    let edges = (LAYER_WIDTH..layers * LAYER_WIDTH).flat_map(|i| {
        let below = (i / LAYER_WIDTH - 1) * LAYER_WIDTH;
        (0..3).map(move |k| DependencyEdge::new(i, below + (i + k) % LAYER_WIDTH))
    });

    PermissionGraph::from_snapshot(nodes, edges).unwrap()
}

fn bench_cycle_guard(c: &mut Criterion) {
    let mut group = c.benchmark_group("cycle_guard");

    for layers in [4u64, 16, 64].iter() {
        let graph = layered_graph(*layers);
        // Bottom depends on top: worst case, the guard walks every layer
        let bottom = PermissionId(0);
        let top = PermissionId(layers * LAYER_WIDTH - 1);

        group.bench_with_input(BenchmarkId::new("layers", layers), &graph, |b, graph| {
            b.iter(|| black_box(would_create_cycle(graph, bottom, top).unwrap()));
        });
    }

    group.finish();
}

fn bench_closure(c: &mut Criterion) {
    let mut group = c.benchmark_group("closure");
    let graph = layered_graph(32);
    let root = PermissionId(16 * LAYER_WIDTH);

    for depth in [1usize, 3, 10].iter() {
        let query = ClosureQuery::new(root)
            .direction(Direction::Both)
            .max_depth(*depth);

        group.bench_with_input(BenchmarkId::new("depth", depth), &query, |b, query| {
            b.iter(|| black_box(compute_closure(&graph, query).unwrap()));
        });
    }

    group.finish();
}

fn bench_full_cycle_sweep(c: &mut Criterion) {
    let graph = layered_graph(64);

    c.bench_function("check_all_cycles_3200", |b| {
        b.iter(|| black_box(check_all_cycles(&graph)));
    });
}

fn bench_resolve(c: &mut Criterion) {
    let permissions: Vec<_> = (0..1000)
        .map(|i| PermissionNode::from_name(i, format!("module{}.perm{}", i / 10, i)))
        .collect();

    // A 20-deep role chain; the permission sits on the root only
    let roles = (1..=20u64).map(|r| {
        let role = RoleNode::new(r, format!("role{}", r));
        if r == 1 {
            role.with_permission(999)
        } else {
            role.with_parent(r - 1)
        }
    });
    let users = vec![UserSubject::new(1).with_role(20)];
    let resolver = AuthorizationResolver::new(&permissions, roles, users).unwrap();

    c.bench_function("resolve_inherited_depth_20", |b| {
        b.iter(|| {
            black_box(
                resolver
                    .resolve(SubjectType::User, 1, black_box("module99.perm999"))
                    .unwrap(),
            )
        });
    });
}

criterion_group!(
    benches,
    bench_cycle_guard,
    bench_closure,
    bench_full_cycle_sweep,
    bench_resolve
);
criterion_main!(benches);
