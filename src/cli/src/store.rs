//! JSON snapshot file store
//!
//! Reads the whole snapshot per load and rewrites the file on every edge
//! mutation. Writes go to a sibling temp file which is then renamed over the
//! original.

use async_trait::async_trait;
use permgraph_authz::{DependencyEdge, EdgeSink, GraphError, Snapshot, SnapshotProvider};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Snapshot provider and edge sink backed by a JSON file
pub struct JsonFileStore {
    path: PathBuf,
    pretty: bool,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pretty: true,
            write_lock: Mutex::new(()),
        }
    }

    /// Write compact JSON instead of pretty-printed
    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> permgraph_authz::Result<Snapshot> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| store_error("read", &self.path, e))?;
        serde_json::from_str(&contents).map_err(|e| store_error("parse", &self.path, e))
    }

    /// Replace the file contents with `snapshot`
    pub async fn write(&self, snapshot: &Snapshot) -> permgraph_authz::Result<()> {
        let contents = if self.pretty {
            serde_json::to_string_pretty(snapshot)
        } else {
            serde_json::to_string(snapshot)
        }
        .map_err(|e| store_error("serialize", &self.path, e))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| store_error("write", &tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| store_error("replace", &self.path, e))?;

        debug!(path = ?self.path, dependencies = snapshot.dependencies.len(), "Snapshot written");
        Ok(())
    }

    async fn update(&self, apply: impl FnOnce(&mut Snapshot)) -> permgraph_authz::Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut snapshot = self.read().await?;
        apply(&mut snapshot);
        self.write(&snapshot).await
    }
}

fn store_error(action: &str, path: &Path, err: impl std::fmt::Display) -> GraphError {
    GraphError::Store(format!("failed to {} {}: {}", action, path.display(), err))
}

#[async_trait]
impl SnapshotProvider for JsonFileStore {
    async fn load_snapshot(&self) -> permgraph_authz::Result<Snapshot> {
        self.read().await
    }
}

#[async_trait]
impl EdgeSink for JsonFileStore {
    async fn persist_added(&self, edge: DependencyEdge) -> permgraph_authz::Result<()> {
        self.update(|snapshot| snapshot.apply_added(edge)).await
    }

    async fn persist_removed(&self, edge: DependencyEdge) -> permgraph_authz::Result<()> {
        self.update(|snapshot| snapshot.apply_removed(edge)).await
    }
}
