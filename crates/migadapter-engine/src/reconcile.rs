//! Reconciler: the control-loop wiring around the planners.
//!
//! For one workload reference:
//!
//! ```text
//!   gone?    ──► drop its rules ──► plan_restore ──► delete flagged workloads
//!   pending? ──► plan_upsize ──► resized? ──► delete workload (recreated by
//!                    │                         its controller, then mutated
//!                    │                         at admission)
//!                    └── no fit ──► plan_idle_host ──► update host label
//! ```

use std::collections::BTreeSet;
use std::sync::Arc;

use migadapter_core::{Workload, WorkloadKey};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::adapter::Adapter;
use crate::cluster::ClusterState;
use crate::error::{ClusterError, ClusterResult};
use crate::pending::pending_partition;

/// What one reconcile step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Workloads deleted so they restart closer to their original size.
    Restored { restarted: Vec<WorkloadKey> },
    /// The pending workload was resized and deleted for recreation.
    Resized { workload: WorkloadKey },
    /// An idle host was labeled for repartitioning.
    HostLabeled { host: String, profile: String },
    NoAction,
}

/// One entry of a [`Reconciler::reconcile_all`] report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub workload: WorkloadKey,
    pub outcome: ReconcileOutcome,
}

pub struct Reconciler<C> {
    adapter: Adapter,
    cluster: Arc<C>,
    /// References seen by the previous `reconcile_all` pass.
    known: Mutex<BTreeSet<WorkloadKey>>,
}

impl<C: ClusterState> Reconciler<C> {
    pub fn new(adapter: Adapter, cluster: Arc<C>) -> Self {
        Self {
            adapter,
            cluster,
            known: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    pub fn cluster(&self) -> &Arc<C> {
        &self.cluster
    }

    /// Reconcile one workload by its concrete `namespace/name`.
    pub async fn reconcile(&self, reference: &WorkloadKey) -> ClusterResult<ReconcileOutcome> {
        match self.cluster.get_workload(reference).await? {
            None => self.on_deleted(reference).await,
            Some(workload) => self.on_present(workload).await,
        }
    }

    /// Reconcile every workload that disappeared since the previous pass,
    /// then every workload currently listed.
    ///
    /// Steps that did nothing are left out of the report.
    pub async fn reconcile_all(&self) -> ClusterResult<Vec<ReconcileReport>> {
        let current: BTreeSet<WorkloadKey> = self
            .cluster
            .list_workloads()
            .await?
            .iter()
            .map(Workload::reference)
            .collect();

        let vanished: Vec<WorkloadKey> = {
            let mut known = self.known.lock().await;
            let vanished = known.difference(&current).cloned().collect();
            *known = current.clone();
            vanished
        };

        let mut report = Vec::new();
        for reference in vanished.iter().chain(current.iter()) {
            let outcome = self.reconcile(reference).await?;
            if outcome != ReconcileOutcome::NoAction {
                report.push(ReconcileReport {
                    workload: reference.clone(),
                    outcome,
                });
            }
        }
        debug!(steps = report.len(), "reconcile pass complete");
        Ok(report)
    }

    async fn on_deleted(&self, reference: &WorkloadKey) -> ClusterResult<ReconcileOutcome> {
        info!(workload = %reference, "workload deleted");
        self.adapter.rules().remove(reference);

        let hosts = self.cluster.list_hosts().await?;
        let workloads = self.cluster.list_workloads().await?;

        let mut restarted = Vec::new();
        for workload in self.adapter.plan_restore(&hosts, &workloads) {
            if self.delete(workload).await? {
                restarted.push(workload.reference());
            }
        }

        if restarted.is_empty() {
            Ok(ReconcileOutcome::NoAction)
        } else {
            Ok(ReconcileOutcome::Restored { restarted })
        }
    }

    async fn on_present(&self, workload: Workload) -> ClusterResult<ReconcileOutcome> {
        if pending_partition(&workload).is_none() {
            return Ok(ReconcileOutcome::NoAction);
        }

        let hosts = self.cluster.list_hosts().await?;
        let running = self.cluster.list_workloads().await?;

        let mut resized = workload.clone();
        if self.adapter.plan_upsize(&mut resized, &hosts, &running) {
            self.delete(&workload).await?;
            return Ok(ReconcileOutcome::Resized {
                workload: workload.reference(),
            });
        }

        let Some(host) = self.adapter.plan_idle_host(&workload, &hosts, &running) else {
            return Ok(ReconcileOutcome::NoAction);
        };
        self.cluster.update_host(&host).await?;

        let profile = host
            .meta
            .labels
            .get(self.adapter.profile_label())
            .cloned()
            .unwrap_or_default();
        Ok(ReconcileOutcome::HostLabeled {
            host: host.name().to_string(),
            profile,
        })
    }

    /// Delete a workload; one already gone counts as not deleted.
    async fn delete(&self, workload: &Workload) -> ClusterResult<bool> {
        match self.cluster.delete_workload(workload).await {
            Ok(()) => {
                info!(workload = %workload.reference(), "workload deleted for restart");
                Ok(true)
            }
            Err(ClusterError::NotFound(what)) => {
                warn!(%what, "workload already gone");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
