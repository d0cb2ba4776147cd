//! Cluster state access.
//!
//! [`ClusterState`] is everything the reconciler needs from the cluster:
//! listing hosts and workloads, fetching one workload, persisting a host
//! label and deleting a workload so its controller recreates it.
//! [`MemoryCluster`] keeps that state in a [`ClusterSnapshot`], which the
//! daemon loads from and saves to a JSON file.

use std::future::Future;
use std::path::Path;

use migadapter_core::{Host, Workload, WorkloadKey};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{ClusterError, ClusterResult};

/// Access to the hosts and workloads of one cluster.
pub trait ClusterState: Send + Sync {
    fn list_hosts(&self) -> impl Future<Output = ClusterResult<Vec<Host>>> + Send;

    fn list_workloads(&self) -> impl Future<Output = ClusterResult<Vec<Workload>>> + Send;

    /// Fetch a workload by its concrete `namespace/name`; `None` if it is gone.
    fn get_workload(
        &self,
        reference: &WorkloadKey,
    ) -> impl Future<Output = ClusterResult<Option<Workload>>> + Send;

    /// Replace the stored host of the same name.
    fn update_host(&self, host: &Host) -> impl Future<Output = ClusterResult<()>> + Send;

    /// Delete a workload. Fails with [`ClusterError::NotFound`] if it is
    /// already gone.
    fn delete_workload(&self, workload: &Workload)
    -> impl Future<Output = ClusterResult<()>> + Send;
}

// ── Snapshot ──────────────────────────────────────────────────────

/// Point-in-time cluster contents, as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSnapshot {
    pub hosts: Vec<Host>,
    pub workloads: Vec<Workload>,
}

impl ClusterSnapshot {
    pub fn from_file(path: &Path) -> ClusterResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn to_file(&self, path: &Path) -> ClusterResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ── MemoryCluster ─────────────────────────────────────────────────

/// In-memory [`ClusterState`] backed by a snapshot.
#[derive(Debug, Default)]
pub struct MemoryCluster {
    state: RwLock<ClusterSnapshot>,
}

impl MemoryCluster {
    pub fn new(snapshot: ClusterSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    /// A copy of the current contents.
    pub async fn snapshot(&self) -> ClusterSnapshot {
        self.state.read().await.clone()
    }

    /// Swap in fresh contents, e.g. after re-reading a snapshot file.
    pub async fn replace(&self, snapshot: ClusterSnapshot) {
        *self.state.write().await = snapshot;
    }

    /// Add a workload, e.g. one recreated by its controller after a restart.
    pub async fn create_workload(&self, workload: Workload) {
        debug!(workload = %workload.reference(), "workload created");
        self.state.write().await.workloads.push(workload);
    }
}

impl ClusterState for MemoryCluster {
    async fn list_hosts(&self) -> ClusterResult<Vec<Host>> {
        Ok(self.state.read().await.hosts.clone())
    }

    async fn list_workloads(&self) -> ClusterResult<Vec<Workload>> {
        Ok(self.state.read().await.workloads.clone())
    }

    async fn get_workload(&self, reference: &WorkloadKey) -> ClusterResult<Option<Workload>> {
        let state = self.state.read().await;
        Ok(state
            .workloads
            .iter()
            .find(|w| w.reference() == *reference)
            .cloned())
    }

    async fn update_host(&self, host: &Host) -> ClusterResult<()> {
        let mut state = self.state.write().await;
        let slot = state
            .hosts
            .iter_mut()
            .find(|h| h.name() == host.name())
            .ok_or_else(|| ClusterError::NotFound(format!("host {}", host.name())))?;
        *slot = host.clone();
        debug!(host = host.name(), "host updated");
        Ok(())
    }

    async fn delete_workload(&self, workload: &Workload) -> ClusterResult<()> {
        let reference = workload.reference();
        let mut state = self.state.write().await;
        let before = state.workloads.len();
        state.workloads.retain(|w| w.reference() != reference);
        if state.workloads.len() == before {
            return Err(ClusterError::NotFound(format!("workload {reference}")));
        }
        debug!(workload = %reference, "workload deleted");
        Ok(())
    }
}
