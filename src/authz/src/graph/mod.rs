//! Permission dependency graph
//!
//! Provides the in-memory graph store, the cycle guard that keeps it acyclic,
//! bounded traversal for visualization, and naming-convention heuristics.
//!
//! # Features
//!
//! - **Arena storage**: nodes in a flat vector, edges as index pairs
//! - **Cycle guard**: every `add_edge` is checked by BFS reachability
//! - **Health sweep**: iterative DFS reporting every cycle in loaded data
//! - **Closure views**: depth-bounded BFS with display-only filters
//! - **Heuristics**: `delete`/`edit`/`manage` prerequisite suggestions
//!
//! # Example
//!
//! ```rust
//! use permgraph_authz::graph::{PermissionGraph, ClosureQuery, compute_closure};
//! use permgraph_authz::types::{PermissionId, PermissionNode};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut graph = PermissionGraph::from_snapshot(
//!     vec![
//!         PermissionNode::from_name(1, "users.view"),
//!         PermissionNode::from_name(2, "users.edit"),
//!     ],
//!     vec![],
//! )?;
//!
//! graph.add_edge(PermissionId(2), PermissionId(1))?;
//! assert!(graph.add_edge(PermissionId(1), PermissionId(2)).is_err());
//!
//! let tree = compute_closure(&graph, &ClosureQuery::new(PermissionId(2)))?;
//! assert_eq!(tree.nodes.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod cycle;
pub mod heuristic;
pub mod store;
pub mod traversal;

pub use cycle::{check_all_cycles, topological_order, would_create_cycle};
pub use heuristic::{auto_resolve, auto_resolve_all, suggest, AutoResolveReport};
pub use store::{EdgeInsert, GraphStats, PermissionGraph, PermissionGraphBuilder};
pub use traversal::{
    compute_closure, compute_dependency_path, ClosureNode, ClosureQuery, ClosureTree, Direction,
    DEFAULT_MAX_DEPTH,
};
