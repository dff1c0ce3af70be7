//! # Permgraph Authorization Engine
//!
//! Permission dependency graph and authorization-path resolver.
//!
//! ## Features
//!
//! - **Dependency graph** kept acyclic by a cycle guard on every edge mutation
//! - **Closure views** with depth bounds and display-only filters
//! - **Dependency heuristics** for `delete`/`edit`/`manage` permissions
//! - **Grant paths** explaining super-admin, direct and inherited access
//! - **Collaborator traits** for snapshot loading and edge persistence
//!
//! ## Example
//!
//! ```rust
//! use permgraph_authz::{InMemoryStore, PermissionService, Snapshot};
//! use permgraph_authz::types::{PermissionId, PermissionNode, RoleNode, SubjectType, UserSubject};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryStore::with_snapshot(Snapshot {
//!         permissions: vec![
//!             PermissionNode::from_name(1, "users.view"),
//!             PermissionNode::from_name(2, "users.edit"),
//!         ],
//!         roles: vec![RoleNode::new(1, "editor").with_permission(2)],
//!         users: vec![UserSubject::new(7).with_role(1)],
//!         ..Default::default()
//!     }));
//!     let service = PermissionService::new(store.clone(), store);
//!
//!     service.add_dependency(PermissionId(2), PermissionId(1)).await?;
//!
//!     let resolution = service.resolve(SubjectType::User, 7, "users.edit").await?;
//!     assert!(resolution.granted);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod resolver;
pub mod service;
pub mod snapshot;
pub mod types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{CyclePath, GraphError, NotFound, Result};
pub use graph::{
    AutoResolveReport, ClosureQuery, ClosureTree, Direction, EdgeInsert, PermissionGraph,
};
pub use resolver::AuthorizationResolver;
pub use service::PermissionService;
pub use snapshot::{EdgeSink, InMemoryStore, Snapshot, SnapshotProvider};
pub use types::{
    DependencyEdge, PathStep, PermissionId, PermissionNode, Resolution, RoleId, RoleNode,
    Subject, SubjectType, UserId, UserSubject,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
