//! In-memory permission graph
//!
//! Nodes live in a flat arena ordered by ascending permission id; edges are
//! index pairs held in forward (dependencies) and reverse (dependents)
//! adjacency sets. Index order equals id order, so every traversal over the
//! adjacency sets is deterministic.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::cycle;
use crate::error::{GraphError, NotFound, Result};
use crate::types::{DependencyEdge, PermissionId, PermissionNode};

/// Outcome of a successful `add_edge`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    /// The edge was recorded
    Added,
    /// The edge was already present; nothing changed
    AlreadyExists,
}

/// Summary counts over the graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    /// Number of permissions
    pub permissions: usize,
    /// Number of dependency edges
    pub dependencies: usize,
    /// Permissions that depend on nothing
    pub roots: usize,
    /// Permissions nothing depends on
    pub leaves: usize,
    /// Permissions with no edges at all
    pub isolated: usize,
    /// Number of distinct modules
    pub modules: usize,
}

/// Permission dependency graph
#[derive(Debug, Clone, Default)]
pub struct PermissionGraph {
    /// Arena of nodes, sorted by id
    nodes: Vec<PermissionNode>,

    /// Permission id -> arena index
    index: HashMap<PermissionId, usize>,

    /// Permission name -> arena index
    names: HashMap<String, usize>,

    /// Forward adjacency: what each node depends on
    dependencies: Vec<BTreeSet<usize>>,

    /// Reverse adjacency: what depends on each node
    dependents: Vec<BTreeSet<usize>>,

    edge_count: usize,
}

impl PermissionGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from snapshot data
    ///
    /// Duplicate ids or names, self-edges, and edges naming unknown
    /// permissions are rejected. Longer cycles already present in the data
    /// are loaded as-is so that [`cycle::check_all_cycles`] can report them.
    pub fn from_snapshot(
        permissions: impl IntoIterator<Item = PermissionNode>,
        dependencies: impl IntoIterator<Item = DependencyEdge>,
    ) -> Result<Self> {
        let mut builder = PermissionGraphBuilder::new();
        for permission in permissions {
            builder.add_permission(permission)?;
        }
        for edge in dependencies {
            builder.add_dependency(edge.from, edge.to);
        }
        builder.build()
    }

    /// Number of permissions
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of dependency edges
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// All permissions in ascending id order
    pub fn nodes(&self) -> &[PermissionNode] {
        &self.nodes
    }

    /// Look up a permission by id
    pub fn node(&self, id: PermissionId) -> Result<&PermissionNode> {
        let idx = self.index_of(id)?;
        Ok(&self.nodes[idx])
    }

    /// Look up a permission by name
    pub fn node_by_name(&self, name: &str) -> Result<&PermissionNode> {
        self.names
            .get(name)
            .map(|&idx| &self.nodes[idx])
            .ok_or_else(|| NotFound::PermissionName(name.to_string()).into())
    }

    pub fn contains(&self, id: PermissionId) -> bool {
        self.index.contains_key(&id)
    }

    /// Whether `from` directly depends on `to`
    pub fn contains_edge(&self, from: PermissionId, to: PermissionId) -> bool {
        match (self.index.get(&from), self.index.get(&to)) {
            (Some(&f), Some(&t)) => self.dependencies[f].contains(&t),
            _ => false,
        }
    }

    /// All edges, ordered by (from, to)
    pub fn edges(&self) -> Vec<DependencyEdge> {
        self.dependencies
            .iter()
            .enumerate()
            .flat_map(|(from, targets)| {
                targets
                    .iter()
                    .map(move |&to| DependencyEdge {
                        from: self.nodes[from].id,
                        to: self.nodes[to].id,
                    })
            })
            .collect()
    }

    /// Direct dependencies of `id`
    pub fn edges_from(&self, id: PermissionId) -> Result<BTreeSet<PermissionId>> {
        let idx = self.index_of(id)?;
        Ok(self.ids(&self.dependencies[idx]))
    }

    /// Direct dependents of `id`
    pub fn edges_to(&self, id: PermissionId) -> Result<BTreeSet<PermissionId>> {
        let idx = self.index_of(id)?;
        Ok(self.ids(&self.dependents[idx]))
    }

    /// Record that `from` depends on `to`
    ///
    /// # Errors
    ///
    /// - `SelfDependency` if `from == to`
    /// - `NotFound` if either permission is unknown
    /// - `CircularDependency` if `to` can already reach `from`
    pub fn add_edge(&mut self, from: PermissionId, to: PermissionId) -> Result<EdgeInsert> {
        if from == to {
            return Err(GraphError::SelfDependency(from));
        }

        let f = self.index_of(from)?;
        let t = self.index_of(to)?;

        if self.dependencies[f].contains(&t) {
            return Ok(EdgeInsert::AlreadyExists);
        }

        if let Some(cycle_path) = cycle::reachability_path(self, t, f) {
            return Err(GraphError::CircularDependency {
                from,
                to,
                cycle_path: cycle_path.into_iter().map(|idx| self.nodes[idx].id).collect(),
            });
        }

        self.insert_edge(f, t);
        Ok(EdgeInsert::Added)
    }

    /// Remove the edge `from -> to`
    ///
    /// Returns `true` when an edge was removed and `false` when it was absent.
    pub fn remove_edge(&mut self, from: PermissionId, to: PermissionId) -> Result<bool> {
        let f = self.index_of(from)?;
        let t = self.index_of(to)?;

        let removed = self.dependencies[f].remove(&t);
        if removed {
            self.dependents[t].remove(&f);
            self.edge_count -= 1;
        }
        Ok(removed)
    }

    /// Other permissions in the same module as `id`, ascending by id
    pub fn module_siblings(&self, id: PermissionId) -> Result<Vec<&PermissionNode>> {
        let node = self.node(id)?;
        Ok(self
            .nodes
            .iter()
            .filter(|n| n.module == node.module && n.id != id)
            .collect())
    }

    /// Summary counts
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            permissions: self.nodes.len(),
            dependencies: self.edge_count,
            ..Default::default()
        };

        for idx in 0..self.nodes.len() {
            let no_deps = self.dependencies[idx].is_empty();
            let no_dependents = self.dependents[idx].is_empty();
            if no_deps {
                stats.roots += 1;
            }
            if no_dependents {
                stats.leaves += 1;
            }
            if no_deps && no_dependents {
                stats.isolated += 1;
            }
        }

        stats.modules = self
            .nodes
            .iter()
            .map(|n| n.module.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        stats
    }

    pub(crate) fn index_of(&self, id: PermissionId) -> Result<usize> {
        self.index
            .get(&id)
            .copied()
            .ok_or_else(|| NotFound::Permission(id).into())
    }

    pub(crate) fn node_at(&self, idx: usize) -> &PermissionNode {
        &self.nodes[idx]
    }

    pub(crate) fn dependency_indices(&self, idx: usize) -> &BTreeSet<usize> {
        &self.dependencies[idx]
    }

    pub(crate) fn dependent_indices(&self, idx: usize) -> &BTreeSet<usize> {
        &self.dependents[idx]
    }

    fn insert_edge(&mut self, from: usize, to: usize) {
        if self.dependencies[from].insert(to) {
            self.dependents[to].insert(from);
            self.edge_count += 1;
        }
    }

    fn ids(&self, indices: &BTreeSet<usize>) -> BTreeSet<PermissionId> {
        indices.iter().map(|&idx| self.nodes[idx].id).collect()
    }
}

/// Collects permissions and edges, then builds a [`PermissionGraph`]
///
/// Edges are resolved at build time so they may be added before the
/// permissions they reference.
#[derive(Debug, Clone, Default)]
pub struct PermissionGraphBuilder {
    permissions: Vec<PermissionNode>,
    edges: Vec<(PermissionId, PermissionId)>,
}

impl PermissionGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a permission
    ///
    /// # Errors
    ///
    /// Returns `DuplicatePermission` if the id or name is already present.
    pub fn add_permission(&mut self, permission: PermissionNode) -> Result<&mut Self> {
        if self
            .permissions
            .iter()
            .any(|p| p.id == permission.id || p.name == permission.name)
        {
            return Err(GraphError::DuplicatePermission(permission.name));
        }
        self.permissions.push(permission);
        Ok(self)
    }

    /// Add a dependency edge `from -> to`
    pub fn add_dependency(&mut self, from: PermissionId, to: PermissionId) -> &mut Self {
        self.edges.push((from, to));
        self
    }

    /// Build the graph
    pub fn build(&self) -> Result<PermissionGraph> {
        let mut nodes = self.permissions.clone();
        nodes.sort_by_key(|n| n.id);

        let index: HashMap<PermissionId, usize> =
            nodes.iter().enumerate().map(|(idx, n)| (n.id, idx)).collect();
        let names: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(idx, n)| (n.name.clone(), idx))
            .collect();

        let mut graph = PermissionGraph {
            dependencies: vec![BTreeSet::new(); nodes.len()],
            dependents: vec![BTreeSet::new(); nodes.len()],
            nodes,
            index,
            names,
            edge_count: 0,
        };

        for &(from, to) in &self.edges {
            if from == to {
                return Err(GraphError::SelfDependency(from));
            }
            let f = graph.index_of(from)?;
            let t = graph.index_of(to)?;
            graph.insert_edge(f, t);
        }

        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_graph() -> PermissionGraph {
        PermissionGraph::from_snapshot(
            vec![
                PermissionNode::from_name(1, "users.view"),
                PermissionNode::from_name(2, "users.edit"),
                PermissionNode::from_name(3, "users.delete"),
            ],
            vec![DependencyEdge::new(2, 1)],
        )
        .unwrap()
    }

    #[test]
    fn test_adjacency_queries() {
        let graph = users_graph();
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(
            graph.edges_from(PermissionId(2)).unwrap(),
            BTreeSet::from([PermissionId(1)])
        );
        assert_eq!(
            graph.edges_to(PermissionId(1)).unwrap(),
            BTreeSet::from([PermissionId(2)])
        );
        assert!(graph.edges_from(PermissionId(1)).unwrap().is_empty());
        assert!(graph.edges_from(PermissionId(99)).unwrap_err().is_not_found());
    }

    #[test]
    fn test_add_edge() {
        let mut graph = users_graph();
        assert_eq!(
            graph.add_edge(PermissionId(3), PermissionId(2)).unwrap(),
            EdgeInsert::Added
        );
        assert_eq!(
            graph.add_edge(PermissionId(3), PermissionId(2)).unwrap(),
            EdgeInsert::AlreadyExists
        );
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.contains_edge(PermissionId(3), PermissionId(2)));
    }

    #[test]
    fn test_add_edge_errors() {
        let mut graph = users_graph();

        assert_eq!(
            graph.add_edge(PermissionId(1), PermissionId(1)),
            Err(GraphError::SelfDependency(PermissionId(1)))
        );
        assert_eq!(
            graph.add_edge(PermissionId(1), PermissionId(42)),
            Err(GraphError::NotFound(NotFound::Permission(PermissionId(42))))
        );
        assert!(matches!(
            graph.add_edge(PermissionId(1), PermissionId(2)),
            Err(GraphError::CircularDependency { .. })
        ));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_remove_edge() {
        let mut graph = users_graph();
        assert!(graph.remove_edge(PermissionId(2), PermissionId(1)).unwrap());
        assert!(!graph.remove_edge(PermissionId(2), PermissionId(1)).unwrap());
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.edges_to(PermissionId(1)).unwrap().is_empty());
        assert!(graph.remove_edge(PermissionId(2), PermissionId(7)).is_err());
    }

    #[test]
    fn test_builder_rejects_bad_snapshots() {
        let mut builder = PermissionGraphBuilder::new();
        builder
            .add_permission(PermissionNode::from_name(1, "users.view"))
            .unwrap();
        assert!(matches!(
            builder.add_permission(PermissionNode::from_name(2, "users.view")),
            Err(GraphError::DuplicatePermission(_))
        ));
        assert!(matches!(
            builder.add_permission(PermissionNode::from_name(1, "users.edit")),
            Err(GraphError::DuplicatePermission(_))
        ));

        builder.add_dependency(PermissionId(1), PermissionId(1));
        assert_eq!(
            builder.build().unwrap_err(),
            GraphError::SelfDependency(PermissionId(1))
        );

        let mut builder = PermissionGraphBuilder::new();
        builder
            .add_permission(PermissionNode::from_name(1, "users.view"))
            .unwrap();
        builder.add_dependency(PermissionId(1), PermissionId(5));
        assert!(builder.build().unwrap_err().is_not_found());
    }

    #[test]
    fn test_nodes_sorted_by_id() {
        let graph = PermissionGraph::from_snapshot(
            vec![
                PermissionNode::from_name(9, "posts.view"),
                PermissionNode::from_name(4, "users.view"),
            ],
            vec![],
        )
        .unwrap();
        let ids: Vec<_> = graph.nodes().iter().map(|n| n.id.0).collect();
        assert_eq!(ids, vec![4, 9]);
        assert_eq!(graph.node_by_name("posts.view").unwrap().id, PermissionId(9));
    }

    #[test]
    fn test_stats() {
        let mut graph = users_graph();
        graph.add_edge(PermissionId(3), PermissionId(2)).unwrap();
        let stats = graph.stats();
        assert_eq!(stats.permissions, 3);
        assert_eq!(stats.dependencies, 2);
        assert_eq!(stats.roots, 1);
        assert_eq!(stats.leaves, 1);
        assert_eq!(stats.isolated, 0);
        assert_eq!(stats.modules, 1);
    }
}
