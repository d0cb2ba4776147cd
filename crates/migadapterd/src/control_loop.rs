//! Reconcile passes over a snapshot-backed cluster.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use migadapter_core::{AdapterConfig, WorkloadKey};
use migadapter_engine::{
    Adapter, ClusterSnapshot, MemoryCluster, ReconcileOutcome, ReconcileReport, Reconciler,
};
use tokio::sync::watch;
use tracing::{error, info};

use crate::rules_file::{merge_existing, save_rules};

fn load(path: &Path) -> anyhow::Result<ClusterSnapshot> {
    ClusterSnapshot::from_file(path)
        .with_context(|| format!("reading snapshot {}", path.display()))
}

/// One pass: explicit deletions first, then every listed workload. Prints
/// the report as JSON.
///
/// With `rules_out`, rules already in that file are loaded first and the
/// store is written back after the pass, for a later `admit --rules`.
pub async fn run_once(
    config: &AdapterConfig,
    path: &Path,
    deleted: &[WorkloadKey],
    write_snapshot: bool,
    rules_out: Option<&Path>,
) -> anyhow::Result<()> {
    let cluster = Arc::new(MemoryCluster::new(load(path)?));
    let reconciler = Reconciler::new(Adapter::from_config(config), Arc::clone(&cluster));
    if let Some(rules) = rules_out {
        merge_existing(reconciler.adapter(), rules)?;
    }

    let mut report = Vec::new();
    for reference in deleted {
        let outcome = reconciler.reconcile(reference).await?;
        if outcome != ReconcileOutcome::NoAction {
            report.push(ReconcileReport {
                workload: reference.clone(),
                outcome,
            });
        }
    }
    report.extend(reconciler.reconcile_all().await?);

    println!("{}", serde_json::to_string_pretty(&report)?);

    if write_snapshot {
        cluster.snapshot().await.to_file(path)?;
        info!(path = %path.display(), "snapshot written");
    }
    if let Some(rules) = rules_out {
        let count = save_rules(reconciler.adapter(), rules)?;
        info!(path = %rules.display(), rules = count, "pending rules written");
    }
    Ok(())
}

/// Reconcile every `interval_secs` until Ctrl-C. Changes are written back
/// to the snapshot file so the next read sees them; pending rules go to
/// `rules_out` after every pass.
pub async fn run_watch(
    config: &AdapterConfig,
    path: &Path,
    interval_secs: u64,
    rules_out: Option<&Path>,
) -> anyhow::Result<()> {
    let cluster = Arc::new(MemoryCluster::new(load(path)?));
    let reconciler = Reconciler::new(Adapter::from_config(config), Arc::clone(&cluster));
    if let Some(rules) = rules_out {
        merge_existing(reconciler.adapter(), rules)?;
    }

    let (shutdown_tx, mut shutdown) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            return;
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    info!(interval_secs, path = %path.display(), "watching cluster snapshot");
    let interval = Duration::from_secs(interval_secs);

    loop {
        match pass(&reconciler, &cluster, path, rules_out).await {
            Ok(0) => {}
            Ok(steps) => info!(steps, "reconcile pass applied changes"),
            Err(e) => error!(error = %e, "reconcile pass failed"),
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {
                info!("watch loop shutting down");
                break;
            }
        }
    }
    Ok(())
}

async fn pass(
    reconciler: &Reconciler<MemoryCluster>,
    cluster: &MemoryCluster,
    path: &Path,
    rules_out: Option<&Path>,
) -> anyhow::Result<usize> {
    cluster.replace(load(path)?).await;
    let report = reconciler.reconcile_all().await?;
    for entry in &report {
        info!(
            workload = %entry.workload,
            outcome = %serde_json::to_string(&entry.outcome)?,
            "reconciled"
        );
    }
    if !report.is_empty() {
        cluster.snapshot().await.to_file(path)?;
    }
    if let Some(rules) = rules_out {
        save_rules(reconciler.adapter(), rules)?;
    }
    Ok(report.len())
}
