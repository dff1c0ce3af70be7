//! Permission service facade
//!
//! Binds the synchronous graph algorithms and resolver to the snapshot
//! provider and edge sink collaborators. Every call loads a fresh snapshot;
//! nothing is cached across calls.
//!
//! Edge mutations run read-check-write under a single mutex so that two
//! concurrent additions cannot each pass the cycle guard against a stale
//! snapshot and jointly form a cycle.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{CyclePath, Result};
use crate::graph::{
    self, AutoResolveReport, ClosureQuery, ClosureTree, EdgeInsert, GraphStats, PermissionGraph,
};
use crate::resolver::{AuthorizationResolver, EffectivePermission, UnmetDependency};
use crate::snapshot::{EdgeSink, SnapshotProvider};
use crate::types::{DependencyEdge, PermissionId, PermissionNode, Resolution, SubjectType};

/// Entry point for UI, middleware and CLI collaborators
pub struct PermissionService {
    provider: Arc<dyn SnapshotProvider>,
    sink: Arc<dyn EdgeSink>,
    config: EngineConfig,
    mutation_lock: Mutex<()>,
}

impl PermissionService {
    /// Create a service with the default configuration
    pub fn new(provider: Arc<dyn SnapshotProvider>, sink: Arc<dyn EdgeSink>) -> Self {
        Self::build(provider, sink, EngineConfig::default())
    }

    /// Create a service with a custom configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the configuration fails
    /// [`EngineConfig::validate`].
    pub fn with_config(
        provider: Arc<dyn SnapshotProvider>,
        sink: Arc<dyn EdgeSink>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(provider, sink, config))
    }

    fn build(
        provider: Arc<dyn SnapshotProvider>,
        sink: Arc<dyn EdgeSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            provider,
            sink,
            config,
            mutation_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Closure query for `root` using the configured default depth
    pub fn closure_query(&self, root: PermissionId) -> ClosureQuery {
        ClosureQuery::new(root).max_depth(self.config.default_max_depth)
    }

    async fn load_graph(&self) -> Result<PermissionGraph> {
        let snapshot = self.provider.load_snapshot().await?;
        let graph = snapshot.permission_graph()?;
        debug!(
            permissions = graph.len(),
            dependencies = graph.edge_count(),
            "Loaded permission graph"
        );
        Ok(graph)
    }

    async fn load_resolver(&self) -> Result<AuthorizationResolver> {
        let snapshot = self.provider.load_snapshot().await?;
        snapshot.resolver()
    }

    /// Make `permission_id` depend on `depends_on_id`
    pub async fn add_dependency(
        &self,
        permission_id: PermissionId,
        depends_on_id: PermissionId,
    ) -> Result<()> {
        let _guard = self.mutation_lock.lock().await;
        let mut graph = self.load_graph().await?;

        match graph.add_edge(permission_id, depends_on_id) {
            Ok(EdgeInsert::Added) => {
                self.sink
                    .persist_added(DependencyEdge {
                        from: permission_id,
                        to: depends_on_id,
                    })
                    .await?;
                info!(from = %permission_id, to = %depends_on_id, "Dependency added");
                Ok(())
            }
            Ok(EdgeInsert::AlreadyExists) => {
                debug!(from = %permission_id, to = %depends_on_id, "Dependency already present");
                Ok(())
            }
            Err(e) => {
                warn!(from = %permission_id, to = %depends_on_id, error = %e, "Dependency rejected");
                Err(e)
            }
        }
    }

    /// Remove the dependency of `permission_id` on `depends_on_id`
    ///
    /// Removing an absent edge succeeds without touching the sink.
    pub async fn remove_dependency(
        &self,
        permission_id: PermissionId,
        depends_on_id: PermissionId,
    ) -> Result<()> {
        let _guard = self.mutation_lock.lock().await;
        let mut graph = self.load_graph().await?;

        if graph.remove_edge(permission_id, depends_on_id)? {
            self.sink
                .persist_removed(DependencyEdge {
                    from: permission_id,
                    to: depends_on_id,
                })
                .await?;
            info!(from = %permission_id, to = %depends_on_id, "Dependency removed");
        }
        Ok(())
    }

    /// Depth-bounded closure view around `query.root`
    pub async fn compute_closure(&self, query: &ClosureQuery) -> Result<ClosureTree> {
        self.config.check_depth(query.max_depth)?;
        let graph = self.load_graph().await?;
        graph::compute_closure(&graph, query)
    }

    /// Shortest dependency chain from `root` to `target`
    pub async fn compute_dependency_path(
        &self,
        root: PermissionId,
        target: PermissionId,
    ) -> Result<Vec<PermissionNode>> {
        let graph = self.load_graph().await?;
        graph::compute_dependency_path(&graph, root, target)
    }

    /// Missing dependencies suggested by naming conventions
    pub async fn suggest(&self, permission_id: PermissionId) -> Result<Vec<PermissionId>> {
        let graph = self.load_graph().await?;
        graph::suggest(&graph, permission_id)
    }

    /// Create every suggested dependency of `permission_id`
    ///
    /// Added edges are persisted one at a time in report order. If the sink
    /// fails partway, the edges before the failing one stay persisted, the
    /// rest are not, and the sink error is returned.
    pub async fn auto_resolve(&self, permission_id: PermissionId) -> Result<AutoResolveReport> {
        let _guard = self.mutation_lock.lock().await;
        let mut graph = self.load_graph().await?;
        let report = graph::auto_resolve(&mut graph, permission_id)?;
        self.persist_report(&report).await?;
        Ok(report)
    }

    /// Create every suggested dependency across the whole graph
    ///
    /// Persistence behaves as in [`PermissionService::auto_resolve`].
    pub async fn auto_resolve_all(&self) -> Result<AutoResolveReport> {
        let _guard = self.mutation_lock.lock().await;
        let mut graph = self.load_graph().await?;
        let report = graph::auto_resolve_all(&mut graph)?;
        self.persist_report(&report).await?;
        Ok(report)
    }

    async fn persist_report(&self, report: &AutoResolveReport) -> Result<()> {
        for (persisted, edge) in report.added.iter().enumerate() {
            if let Err(e) = self.sink.persist_added(*edge).await {
                warn!(
                    persisted,
                    pending = report.added.len() - persisted,
                    from = %edge.from,
                    to = %edge.to,
                    error = %e,
                    "Auto-resolve stopped by sink failure"
                );
                return Err(e);
            }
        }
        if !report.skipped_due_to_cycle.is_empty() {
            warn!(
                skipped = report.skipped_due_to_cycle.len(),
                "Suggested dependencies skipped to avoid cycles"
            );
        }
        info!(
            added = report.added.len(),
            already_exists = report.already_exists.len(),
            "Auto-resolve finished"
        );
        Ok(())
    }

    /// Every cycle in the stored graph; empty when healthy
    pub async fn check_all_cycles(&self) -> Result<Vec<CyclePath>> {
        let graph = self.load_graph().await?;
        let cycles = graph::check_all_cycles(&graph);
        if !cycles.is_empty() {
            warn!(cycles = cycles.len(), "Permission graph contains cycles");
        }
        Ok(cycles)
    }

    /// Permissions ordered dependencies-first
    pub async fn topological_order(&self) -> Result<Vec<PermissionId>> {
        let graph = self.load_graph().await?;
        graph::topological_order(&graph)
    }

    /// Summary counts over the stored graph
    pub async fn stats(&self) -> Result<GraphStats> {
        let graph = self.load_graph().await?;
        Ok(graph.stats())
    }

    /// Decide whether a subject holds `permission_name`, and why
    pub async fn resolve(
        &self,
        subject_type: SubjectType,
        subject_id: u64,
        permission_name: &str,
    ) -> Result<Resolution> {
        let resolver = self.load_resolver().await?;
        let resolution = resolver.resolve(subject_type, subject_id, permission_name)?;
        debug!(
            subject = %subject_type,
            subject_id,
            permission = permission_name,
            granted = resolution.granted,
            "Resolved permission"
        );
        Ok(resolution)
    }

    /// Every permission a subject holds, with grant paths
    pub async fn effective_permissions(
        &self,
        subject_type: SubjectType,
        subject_id: u64,
    ) -> Result<Vec<EffectivePermission>> {
        let resolver = self.load_resolver().await?;
        resolver.effective_permissions(subject_type, subject_id)
    }

    /// Held permissions whose dependencies the subject lacks
    pub async fn unmet_dependencies(
        &self,
        subject_type: SubjectType,
        subject_id: u64,
    ) -> Result<Vec<UnmetDependency>> {
        let snapshot = self.provider.load_snapshot().await?;
        let graph = snapshot.permission_graph()?;
        let resolver = snapshot.resolver()?;
        resolver.unmet_dependencies(subject_type, subject_id, &graph)
    }
}
