//! Upsize planner: grow a pending workload into a free, larger partition.

use migadapter_core::{Host, Quantity, ResourceList, ResourceRequirements, Workload};
use migadapter_placement::{
    PartitionId, build_catalog, build_inventory, current_demand, demand_of, find_fit,
    rewrite_partition,
};
use tracing::{debug, info};

use crate::adapter::Adapter;

/// Resources with every partition-carrying list pointed at `target`.
///
/// Only lists that already hold a partition entry are rewritten. Returns
/// `None` when neither list changes.
pub(crate) fn resize_requirements(
    resources: &ResourceRequirements,
    target: PartitionId,
    quantity: Quantity,
) -> Option<ResourceRequirements> {
    let rewrite = |list: &ResourceList| {
        if demand_of(list).is_some() {
            rewrite_partition(list, target, quantity)
        } else {
            (list.clone(), false)
        }
    };
    let (requests, requests_changed) = rewrite(&resources.requests);
    let (limits, limits_changed) = rewrite(&resources.limits);

    (requests_changed || limits_changed).then(|| ResourceRequirements {
        requests,
        limits,
        claims: resources.claims.clone(),
    })
}

impl Adapter {
    /// Resize every container of `workload` whose partition demand can be
    /// met by an equal-or-larger free partition.
    ///
    /// Containers are rewritten in place and the new resources are recorded
    /// in the rule store for the admission mutator. Returns true iff some
    /// container's partition entry changed.
    pub fn plan_upsize(&self, workload: &mut Workload, hosts: &[Host], running: &[Workload]) -> bool {
        let key = workload.key();
        info!(workload = %key, "workload pending for partition");

        let mut inventory = build_inventory(hosts, running);
        let catalog = build_catalog(&inventory);
        if inventory.is_empty() || catalog.is_empty() {
            debug!(workload = %key, "no partition capacity in cluster");
            return false;
        }

        let selector = workload.spec.node_selector.clone();
        let mut resized = false;

        for container in &mut workload.spec.containers {
            let Some(demand) = current_demand(&container.resources) else {
                debug!(workload = %key, container = %container.name, "no partition demand");
                continue;
            };

            let Some(target) = find_fit(
                demand.partition,
                demand.quantity,
                &selector,
                &mut inventory,
                &catalog,
            ) else {
                continue;
            };

            let Some(updated) = resize_requirements(&container.resources, target, demand.quantity)
            else {
                debug!(workload = %key, container = %container.name, partition = %target, "already at best fit");
                continue;
            };

            let had_requests = demand_of(&container.resources.requests).is_some();
            let had_limits = demand_of(&container.resources.limits).is_some();
            self.rules.store(
                &key,
                &container.name,
                had_requests.then(|| updated.requests.clone()),
                had_limits.then(|| updated.limits.clone()),
                (!updated.claims.is_empty()).then(|| updated.claims.clone()),
            );

            info!(
                workload = %key,
                container = %container.name,
                from = %demand.partition,
                to = %target,
                "partition resized"
            );
            container.resources = updated;
            resized = true;
        }

        resized
    }
}
