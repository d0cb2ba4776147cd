//! Restore planner: shrink resized workloads back toward what they asked for.
//!
//! Runs when capacity may have been freed (a workload went away). Workloads
//! carrying an original-value annotation are visited largest recorded
//! demand first, so the biggest potential reclaim gets first pick of scarce
//! partitions.

use migadapter_core::{
    ContainerResources, Host, ResourceList, ResourceRequirements, Workload, WorkloadKey,
};
use migadapter_placement::{
    Catalog, PartitionId, build_catalog, build_inventory, current_demand, demand_of, find_fit,
    rewrite_partition,
};
use tracing::{debug, info};

use crate::adapter::Adapter;

struct Candidate<'a> {
    workload: &'a Workload,
    key: WorkloadKey,
    records: ContainerResources,
    demand: Option<PartitionId>,
}

/// `original` with each partition-carrying list pointed at `fit`.
fn resized_original(
    original: &ResourceRequirements,
    fit: PartitionId,
) -> (Option<ResourceList>, Option<ResourceList>) {
    let rewrite = |list: &ResourceList| {
        demand_of(list).map(|d| rewrite_partition(list, fit, d.quantity).0)
    };
    (rewrite(&original.requests), rewrite(&original.limits))
}

impl Adapter {
    /// Decode the original-value annotation; `None` if absent, malformed or empty.
    pub fn original_resources(&self, workload: &Workload) -> Option<ContainerResources> {
        let raw = workload.annotation(&self.annotation_key)?;
        match serde_json::from_str::<ContainerResources>(raw) {
            Ok(records) if !records.is_empty() => Some(records),
            Ok(_) => None,
            Err(e) => {
                debug!(workload = %workload.key(), error = %e, "ignoring malformed original annotation");
                None
            }
        }
    }

    /// Workloads that should be restarted because a partition smaller than
    /// the one they run on, but no smaller than they first asked for, is
    /// now free.
    pub fn plan_restore<'a>(&self, hosts: &[Host], workloads: &'a [Workload]) -> Vec<&'a Workload> {
        let mut inventory = build_inventory(hosts, workloads);
        let catalog = build_catalog(&inventory);
        if inventory.is_empty() {
            return Vec::new();
        }

        let mut candidates: Vec<Candidate<'a>> = workloads
            .iter()
            .filter_map(|workload| {
                let records = self.original_resources(workload)?;
                let demand = records
                    .values()
                    .filter_map(|r| current_demand(r).map(|d| d.partition))
                    .max();
                Some(Candidate {
                    workload,
                    key: workload.key(),
                    records,
                    demand,
                })
            })
            .collect();
        candidates.sort_by(|a, b| b.demand.cmp(&a.demand).then_with(|| a.key.cmp(&b.key)));

        let mut restart = Vec::new();
        for candidate in candidates {
            let workload = candidate.workload;
            let mut flagged = false;

            for container in &workload.spec.containers {
                let Some(original) = candidate.records.get(&container.name) else {
                    continue;
                };
                let (Some(wanted), Some(running)) =
                    (current_demand(original), current_demand(&container.resources))
                else {
                    continue;
                };
                if wanted.partition >= running.partition {
                    continue;
                }

                // Only sizes strictly below the running one are a gain.
                let smaller: Catalog = catalog
                    .iter()
                    .copied()
                    .filter(|c| *c < running.partition)
                    .collect();
                let Some(fit) = find_fit(
                    wanted.partition,
                    wanted.quantity,
                    &workload.spec.node_selector,
                    &mut inventory,
                    &smaller,
                ) else {
                    continue;
                };

                if fit != wanted.partition {
                    let (requests, limits) = resized_original(original, fit);
                    self.rules.store(
                        &candidate.key,
                        &container.name,
                        requests,
                        limits,
                        (!original.claims.is_empty()).then(|| original.claims.clone()),
                    );
                }

                info!(
                    workload = %candidate.key,
                    container = %container.name,
                    original = %wanted.partition,
                    running = %running.partition,
                    target = %fit,
                    "workload can shrink toward original partition"
                );
                flagged = true;
            }

            if flagged {
                restart.push(workload);
            }
        }

        restart
    }
}
