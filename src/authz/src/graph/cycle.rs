//! Cycle guard for the permission dependency graph
//!
//! - **Edge gate**: BFS reachability from the new edge's target back to its
//!   source; if the source is reachable, the edge would close a cycle.
//! - **Health sweep**: iterative three-colour DFS over the whole graph,
//!   reporting every back edge as a closed cycle path.
//! - **Ordering**: Kahn's algorithm, dependencies before dependents.

use std::collections::{BTreeSet, VecDeque};

use super::store::PermissionGraph;
use crate::error::{CyclePath, GraphError, Result};
use crate::types::PermissionId;

/// Check whether adding `from -> to` would create a cycle
///
/// Returns the reachability path `to -> ... -> from` when it would, `None`
/// otherwise. `from == to` trivially yields `Some([from])`.
pub fn would_create_cycle(
    graph: &PermissionGraph,
    from: PermissionId,
    to: PermissionId,
) -> Result<Option<CyclePath>> {
    let f = graph.index_of(from)?;
    let t = graph.index_of(to)?;

    Ok(reachability_path(graph, t, f)
        .map(|path| path.into_iter().map(|idx| graph.node_at(idx).id).collect()))
}

/// Shortest path over dependency edges from `start` to `goal`, as arena indices
pub(crate) fn reachability_path(
    graph: &PermissionGraph,
    start: usize,
    goal: usize,
) -> Option<Vec<usize>> {
    let mut parent: Vec<Option<usize>> = vec![None; graph.len()];
    let mut seen = vec![false; graph.len()];
    let mut queue = VecDeque::new();

    seen[start] = true;
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        if current == goal {
            let mut path = vec![goal];
            let mut cursor = goal;
            while let Some(prev) = parent[cursor] {
                path.push(prev);
                cursor = prev;
            }
            path.reverse();
            return Some(path);
        }

        for &next in graph.dependency_indices(current) {
            if !seen[next] {
                seen[next] = true;
                parent[next] = Some(current);
                queue.push_back(next);
            }
        }
    }

    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Sweep the whole graph for cycles
///
/// Each returned path is closed (first id == last id). An empty result means
/// the graph is healthy. Graphs only ever mutated through `add_edge` are
/// always healthy; this catches anomalies in loaded data.
pub fn check_all_cycles(graph: &PermissionGraph) -> Vec<CyclePath> {
    let mut marks = vec![Mark::Unvisited; graph.len()];
    let mut cycles = Vec::new();

    for start in 0..graph.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }

        let mut path = vec![start];
        let mut stack = vec![(start, graph.dependency_indices(start).iter())];
        marks[start] = Mark::InProgress;

        while let Some((node, children)) = stack.last_mut() {
            match children.next() {
                Some(&child) => match marks[child] {
                    Mark::Unvisited => {
                        marks[child] = Mark::InProgress;
                        path.push(child);
                        stack.push((child, graph.dependency_indices(child).iter()));
                    }
                    Mark::InProgress => {
                        if let Some(pos) = path.iter().position(|&n| n == child) {
                            cycles.push(
                                path[pos..]
                                    .iter()
                                    .chain(std::iter::once(&child))
                                    .map(|&idx| graph.node_at(idx).id)
                                    .collect(),
                            );
                        }
                    }
                    Mark::Done => {}
                },
                None => {
                    let finished = *node;
                    marks[finished] = Mark::Done;
                    path.pop();
                    stack.pop();
                }
            }
        }
    }

    cycles
}

/// Order permissions so that every permission comes after its dependencies
///
/// Ties are broken by ascending id.
///
/// # Errors
///
/// Returns `CircularDependency` describing the first cycle found when the
/// graph is not acyclic.
pub fn topological_order(graph: &PermissionGraph) -> Result<Vec<PermissionId>> {
    let mut remaining: Vec<usize> = (0..graph.len())
        .map(|idx| graph.dependency_indices(idx).len())
        .collect();

    let mut ready: BTreeSet<usize> = remaining
        .iter()
        .enumerate()
        .filter(|(_, &count)| count == 0)
        .map(|(idx, _)| idx)
        .collect();

    let mut order = Vec::with_capacity(graph.len());

    while let Some(current) = ready.pop_first() {
        order.push(graph.node_at(current).id);

        for &dependent in graph.dependent_indices(current) {
            remaining[dependent] -= 1;
            if remaining[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() != graph.len() {
        return Err(match check_all_cycles(graph).into_iter().next() {
            Some(cycle) => cycle_error(cycle),
            None => GraphError::InvalidInput("graph contains an unresolved cycle".to_string()),
        });
    }

    Ok(order)
}

/// Express a closed cycle `c0 -> c1 -> ... -> c0` as the edge `c(n-1) -> c0` closing it
fn cycle_error(mut cycle: CyclePath) -> GraphError {
    cycle.pop();
    let to = cycle[0];
    let from = cycle[cycle.len() - 1];
    GraphError::CircularDependency {
        from,
        to,
        cycle_path: cycle,
    }
}
