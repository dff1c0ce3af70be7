//! Property-based tests for the graph invariants and resolver guarantees

use permgraph_authz::graph::{
    auto_resolve, check_all_cycles, compute_closure, topological_order, ClosureQuery, Direction,
    PermissionGraph,
};
use permgraph_authz::{
    AuthorizationResolver, GraphError, PathStep, PermissionId, PermissionNode, RoleId, RoleNode,
    SubjectType, UserSubject,
};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet};

const TYPES: [&str; 5] = ["view", "edit", "delete", "manage", "export"];
const MODULES: [&str; 3] = ["users", "posts", "reports"];

fn permissions(count: usize) -> Vec<PermissionNode> {
    (0..count as u64)
        .map(|i| PermissionNode::from_name(i, format!("perm{}.view", i)))
        .collect()
}

fn empty_graph(count: usize) -> PermissionGraph {
    PermissionGraph::from_snapshot(permissions(count), vec![]).unwrap()
}

/// Brute-force reachability over an explicit edge set
fn reaches(edges: &HashSet<(u64, u64)>, start: u64, goal: u64) -> bool {
    let mut stack = vec![start];
    let mut seen = HashSet::new();
    while let Some(node) = stack.pop() {
        if node == goal {
            return true;
        }
        if seen.insert(node) {
            stack.extend(edges.iter().filter(|(f, _)| *f == node).map(|&(_, t)| t));
        }
    }
    false
}

/// Build a DAG by attempting every edge and keeping the accepted ones
fn random_dag(count: usize, attempts: &[(usize, usize)]) -> PermissionGraph {
    let mut graph = empty_graph(count);
    for &(from, to) in attempts {
        let _ = graph.add_edge(PermissionId(from as u64), PermissionId(to as u64));
    }
    graph
}

fn edge_attempts(max_nodes: usize) -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (2..max_nodes).prop_flat_map(|n| (Just(n), prop::collection::vec((0..n, 0..n), 0..60)))
}

fn any_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::Dependencies),
        Just(Direction::Dependents),
        Just(Direction::Both),
    ]
}

proptest! {
    #[test]
    fn test_self_dependency_always_rejected(n in 1usize..20, pick in 0usize..20) {
        let mut graph = empty_graph(n);
        let id = PermissionId((pick % n) as u64);
        prop_assert_eq!(graph.add_edge(id, id), Err(GraphError::SelfDependency(id)));
        prop_assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_guard_rejects_exactly_cycle_forming_edges((n, attempts) in edge_attempts(12)) {
        let mut graph = empty_graph(n);
        let mut accepted: HashSet<(u64, u64)> = HashSet::new();

        for (from, to) in attempts {
            let (from, to) = (from as u64, to as u64);
            let result = graph.add_edge(PermissionId(from), PermissionId(to));

            if from == to {
                prop_assert!(matches!(result, Err(GraphError::SelfDependency(_))));
            } else if reaches(&accepted, to, from) {
                match result {
                    Err(GraphError::CircularDependency { cycle_path, .. }) => {
                        // The reported path is a real path to -> ... -> from
                        prop_assert_eq!(cycle_path.first().copied(), Some(PermissionId(to)));
                        prop_assert_eq!(cycle_path.last().copied(), Some(PermissionId(from)));
                        for step in cycle_path.windows(2) {
                            prop_assert!(accepted.contains(&(step[0].0, step[1].0)));
                        }
                    }
                    other => prop_assert!(false, "expected cycle rejection, got {:?}", other),
                }
            } else {
                prop_assert!(result.is_ok());
                accepted.insert((from, to));
            }
        }

        prop_assert_eq!(graph.edge_count(), accepted.len());
        prop_assert!(check_all_cycles(&graph).is_empty());
        prop_assert!(topological_order(&graph).is_ok());
    }

    #[test]
    fn test_closure_depth_bound(
        (n, attempts) in edge_attempts(12),
        root in 0usize..12,
        max_depth in 0usize..5,
        direction in any_direction(),
    ) {
        let graph = random_dag(n, &attempts);
        let root = PermissionId((root % n) as u64);
        let query = ClosureQuery::new(root).direction(direction);

        // No shortest walk in an n-node graph is longer than n - 1 steps
        let full = compute_closure(&graph, &query.clone().max_depth(n)).unwrap();
        let bounded = compute_closure(&graph, &query.max_depth(max_depth)).unwrap();

        prop_assert!(bounded.nodes.iter().all(|node| node.depth <= max_depth));
        prop_assert!(!full.truncated);

        // Bounded view is exactly the unbounded view cut at max_depth
        let expected: BTreeSet<_> = full
            .nodes
            .iter()
            .filter(|node| node.depth <= max_depth)
            .map(|node| (node.id, node.depth))
            .collect();
        let actual: BTreeSet<_> = bounded.nodes.iter().map(|node| (node.id, node.depth)).collect();
        prop_assert_eq!(actual, expected);

        let cut = full.nodes.iter().any(|node| node.depth > max_depth);
        prop_assert_eq!(bounded.truncated, cut);
    }

    #[test]
    fn test_auto_resolve_idempotent(
        kinds in prop::collection::vec((0usize..3, 0usize..5), 1..15),
        attempts in prop::collection::vec((0usize..15, 0usize..15), 0..30),
        target in 0usize..15,
    ) {
        let mut names = HashSet::new();
        let nodes: Vec<_> = kinds
            .iter()
            .enumerate()
            .filter(|(_, (m, t))| names.insert((*m, *t)))
            .map(|(i, (m, t))| PermissionNode::from_name(i as u64, format!("{}.{}", MODULES[*m], TYPES[*t])))
            .collect();
        let ids: Vec<_> = nodes.iter().map(|n| n.id).collect();

        let mut graph = PermissionGraph::from_snapshot(nodes, vec![]).unwrap();
        for (from, to) in attempts {
            let _ = graph.add_edge(ids[from % ids.len()], ids[to % ids.len()]);
        }

        let target = ids[target % ids.len()];
        let first = auto_resolve(&mut graph, target).unwrap();
        let second = auto_resolve(&mut graph, target).unwrap();

        prop_assert!(second.added.is_empty());
        prop_assert_eq!(
            second.already_exists.len(),
            first.added.len() + first.already_exists.len()
        );
        prop_assert_eq!(second.skipped_due_to_cycle, first.skipped_due_to_cycle);
        prop_assert!(check_all_cycles(&graph).is_empty());
    }

    #[test]
    fn test_super_admin_universal(name in "[a-z]{1,8}\\.[a-z]{1,8}", roles in prop::collection::btree_set(1u64..5, 0..4)) {
        let mut admin = UserSubject::new(1).super_admin();
        admin.role_ids = roles.iter().map(|&r| RoleId(r)).collect();
        let role_nodes: Vec<_> = (1u64..5).map(|r| RoleNode::new(r, format!("role{}", r))).collect();

        let resolver = AuthorizationResolver::new(&permissions(3), role_nodes, vec![admin]).unwrap();
        let resolution = resolver.resolve(SubjectType::User, 1, &name).unwrap();

        prop_assert!(resolution.granted);
        prop_assert_eq!(resolution.path, vec![PathStep::SuperAdmin]);
    }

    #[test]
    fn test_direct_grant(role in 1u64..10, permission in 0u64..5, extra_parent in any::<bool>()) {
        let perms = permissions(5);
        let mut holder = RoleNode::new(role, "holder").with_permission(permission);
        let mut roles = vec![RoleNode::new(100, "root").with_permission(permission)];
        if extra_parent {
            holder = holder.with_parent(100);
        }
        roles.push(holder);

        let user = UserSubject::new(1).with_role(role);
        let resolver = AuthorizationResolver::new(&perms, roles, vec![user]).unwrap();
        let name = format!("perm{}.view", permission);
        let resolution = resolver.resolve(SubjectType::User, 1, &name).unwrap();

        prop_assert!(resolution.granted);
        prop_assert_eq!(resolution.path, vec![PathStep::Direct { role_id: RoleId(role) }]);
    }
}
