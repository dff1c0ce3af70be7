//! Bounded, filtered traversal of the permission graph
//!
//! Closure trees are built with an explicit BFS worklist and a visited set,
//! so stack depth never grows with the graph and malformed (cyclic) data
//! cannot cause non-termination.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::cycle::reachability_path;
use super::store::PermissionGraph;
use crate::error::Result;
use crate::types::{DependencyEdge, PermissionId, PermissionNode};

/// Default depth bound for closure queries
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Which edges a closure follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// What the root depends on
    #[default]
    Dependencies,
    /// What depends on the root
    Dependents,
    /// Both directions
    Both,
}

impl std::str::FromStr for Direction {
    type Err = crate::error::GraphError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dependencies" | "deps" => Ok(Direction::Dependencies),
            "dependents" => Ok(Direction::Dependents),
            "both" => Ok(Direction::Both),
            other => Err(crate::error::GraphError::InvalidInput(format!(
                "unknown direction '{}'",
                other
            ))),
        }
    }
}

/// Parameters of a closure computation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureQuery {
    /// Permission at the centre of the view
    pub root: PermissionId,

    #[serde(default)]
    pub direction: Direction,

    /// Nodes at this depth are shown but not expanded
    pub max_depth: usize,

    /// Display only nodes of this module
    #[serde(default)]
    pub module_filter: Option<String>,

    /// Display only nodes of this type
    #[serde(default)]
    pub type_filter: Option<String>,
}

impl ClosureQuery {
    pub fn new(root: PermissionId) -> Self {
        Self {
            root,
            direction: Direction::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            module_filter: None,
            type_filter: None,
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn module_filter(mut self, module: impl Into<String>) -> Self {
        self.module_filter = Some(module.into());
        self
    }

    pub fn type_filter(mut self, permission_type: impl Into<String>) -> Self {
        self.type_filter = Some(permission_type.into());
        self
    }

    fn displays(&self, node: &PermissionNode) -> bool {
        self.module_filter
            .as_deref()
            .map_or(true, |module| node.module == module)
            && self
                .type_filter
                .as_deref()
                .map_or(true, |t| node.permission_type == t)
    }
}

/// Node as rendered by a visualization layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureNode {
    pub id: PermissionId,
    pub name: String,
    pub module: String,
    #[serde(rename = "type")]
    pub permission_type: String,
    /// True only for the query root
    pub is_center: bool,
    /// BFS distance from the root
    pub depth: usize,
}

/// Result of a closure computation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureTree {
    pub root: PermissionId,

    /// Displayed nodes in BFS order, root first
    pub nodes: Vec<ClosureNode>,

    /// Edges between displayed nodes, oriented dependent -> dependency
    pub edges: Vec<DependencyEdge>,

    /// Some branch was cut off by the depth bound
    pub truncated: bool,
}

impl ClosureTree {
    pub fn contains(&self, id: PermissionId) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Deepest displayed node
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }
}

/// Compute the depth-bounded closure around `query.root`
///
/// Filters only affect what is displayed: a node failing them is omitted from
/// the result but the traversal still passes through it. The root is always
/// displayed.
pub fn compute_closure(graph: &PermissionGraph, query: &ClosureQuery) -> Result<ClosureTree> {
    let root = graph.index_of(query.root)?;

    let mut depth_of: Vec<Option<usize>> = vec![None; graph.len()];
    let mut displayed = vec![false; graph.len()];
    let mut traversed: BTreeSet<(usize, usize)> = BTreeSet::new();
    let mut nodes = Vec::new();
    let mut truncated = false;

    let mut queue = VecDeque::new();
    depth_of[root] = Some(0);
    queue.push_back((root, 0));

    while let Some((current, depth)) = queue.pop_front() {
        let node = graph.node_at(current);
        if current == root || query.displays(node) {
            displayed[current] = true;
            nodes.push(ClosureNode {
                id: node.id,
                name: node.name.clone(),
                module: node.module.clone(),
                permission_type: node.permission_type.clone(),
                is_center: current == root,
                depth,
            });
        }

        for (next, edge) in neighbours(graph, current, query.direction) {
            if depth_of[next].is_some() {
                traversed.insert(edge);
            } else if depth == query.max_depth {
                truncated = true;
            } else {
                traversed.insert(edge);
                depth_of[next] = Some(depth + 1);
                queue.push_back((next, depth + 1));
            }
        }
    }

    let edges = traversed
        .into_iter()
        .filter(|&(from, to)| displayed[from] && displayed[to])
        .map(|(from, to)| DependencyEdge {
            from: graph.node_at(from).id,
            to: graph.node_at(to).id,
        })
        .collect();

    Ok(ClosureTree {
        root: query.root,
        nodes,
        edges,
        truncated,
    })
}

/// Neighbours of `idx` in `direction`, each paired with the edge (dependent, dependency)
fn neighbours(
    graph: &PermissionGraph,
    idx: usize,
    direction: Direction,
) -> Vec<(usize, (usize, usize))> {
    let mut out = Vec::new();
    if matches!(direction, Direction::Dependencies | Direction::Both) {
        out.extend(graph.dependency_indices(idx).iter().map(|&n| (n, (idx, n))));
    }
    if matches!(direction, Direction::Dependents | Direction::Both) {
        out.extend(graph.dependent_indices(idx).iter().map(|&n| (n, (n, idx))));
    }
    out
}

/// Shortest dependency chain from `root` to `target`
///
/// Returns the permissions along the path, `root` first and `target` last, or
/// an empty list when `target` is not reachable.
pub fn compute_dependency_path(
    graph: &PermissionGraph,
    root: PermissionId,
    target: PermissionId,
) -> Result<Vec<PermissionNode>> {
    let start = graph.index_of(root)?;
    let goal = graph.index_of(target)?;

    Ok(reachability_path(graph, start, goal)
        .map(|path| path.into_iter().map(|idx| graph.node_at(idx).clone()).collect())
        .unwrap_or_default())
}
