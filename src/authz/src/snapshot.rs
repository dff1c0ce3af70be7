//! Snapshot data and the collaborator interfaces that supply and persist it

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::graph::PermissionGraph;
use crate::resolver::AuthorizationResolver;
use crate::types::{DependencyEdge, PermissionNode, RoleNode, UserSubject};

/// Read snapshot of everything the engine operates on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub permissions: Vec<PermissionNode>,

    #[serde(default)]
    pub dependencies: Vec<DependencyEdge>,

    #[serde(default)]
    pub roles: Vec<RoleNode>,

    #[serde(default)]
    pub users: Vec<UserSubject>,
}

impl Snapshot {
    /// Build the dependency graph
    pub fn permission_graph(&self) -> Result<PermissionGraph> {
        PermissionGraph::from_snapshot(
            self.permissions.iter().cloned(),
            self.dependencies.iter().copied(),
        )
    }

    /// Build the authorization resolver
    pub fn resolver(&self) -> Result<AuthorizationResolver> {
        AuthorizationResolver::new(
            &self.permissions,
            self.roles.iter().cloned(),
            self.users.iter().cloned(),
        )
    }

    /// Record an added edge, ignoring duplicates
    pub fn apply_added(&mut self, edge: DependencyEdge) {
        if !self.dependencies.contains(&edge) {
            self.dependencies.push(edge);
        }
    }

    /// Drop a removed edge
    pub fn apply_removed(&mut self, edge: DependencyEdge) {
        self.dependencies.retain(|e| *e != edge);
    }
}

/// Supplies a fresh snapshot per operation
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Load the current snapshot
    async fn load_snapshot(&self) -> Result<Snapshot>;
}

/// Durably stores edge mutations approved by the cycle guard
#[async_trait]
pub trait EdgeSink: Send + Sync {
    /// Persist a newly added dependency edge
    async fn persist_added(&self, edge: DependencyEdge) -> Result<()>;

    /// Persist the removal of a dependency edge
    async fn persist_removed(&self, edge: DependencyEdge) -> Result<()>;
}

/// In-memory snapshot store implementing both collaborator interfaces
pub struct InMemoryStore {
    snapshot: Arc<RwLock<Snapshot>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::with_snapshot(Snapshot::default())
    }

    /// Create a store seeded with `snapshot`
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Replace the stored snapshot
    pub async fn replace(&self, snapshot: Snapshot) {
        *self.snapshot.write().await = snapshot;
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotProvider for InMemoryStore {
    async fn load_snapshot(&self) -> Result<Snapshot> {
        let snapshot = self.snapshot.read().await;
        Ok(snapshot.clone())
    }
}

#[async_trait]
impl EdgeSink for InMemoryStore {
    async fn persist_added(&self, edge: DependencyEdge) -> Result<()> {
        let mut snapshot = self.snapshot.write().await;
        snapshot.apply_added(edge);
        Ok(())
    }

    async fn persist_removed(&self, edge: DependencyEdge) -> Result<()> {
        let mut snapshot = self.snapshot.write().await;
        snapshot.apply_removed(edge);
        Ok(())
    }
}
