//! Idle-host labeling.
//!
//! When no existing partition fits a pending workload, an idle host can be
//! asked to repartition its GPU wholesale into the demanded size. The
//! request is a single host label whose value names a profile; an external
//! partition manager acts on it.

use migadapter_core::config::ProfileTable;
use migadapter_core::{Host, Labels, Workload};
use migadapter_placement::{Inventory, PartitionId, build_inventory, find_idle_host};
use tracing::{debug, info, warn};

use crate::adapter::Adapter;
use crate::pending::pending_partition;

/// A copy of the first idle selector-matching host, labeled with the
/// profile for `target`.
///
/// Returns `None` if no host is idle or `target` has no profile. The caller
/// persists the returned host.
pub fn label_idle_host(
    selector: &Labels,
    hosts: &[Host],
    inventory: &Inventory,
    target: &PartitionId,
    profiles: &ProfileTable,
    label_key: &str,
) -> Option<Host> {
    let host = find_idle_host(selector, hosts, inventory)?;

    let resource = target.resource_name();
    let Some(profile) = profiles.get(&resource) else {
        warn!(partition = %target, host = host.name(), "no repartition profile for partition");
        return None;
    };

    let mut labeled = host.clone();
    labeled
        .meta
        .labels
        .insert(label_key.to_string(), profile.clone());
    info!(host = labeled.name(), profile = %profile, "labeling idle host for repartition");
    Some(labeled)
}

impl Adapter {
    /// Pick and label an idle host for a workload pending on a partition.
    pub fn plan_idle_host(
        &self,
        workload: &Workload,
        hosts: &[Host],
        running: &[Workload],
    ) -> Option<Host> {
        let demand = pending_partition(workload)?;
        let target = match demand.partition() {
            Ok(target) => target,
            Err(e) => {
                debug!(workload = %workload.key(), error = %e, "pending on unrecognized partition");
                return None;
            }
        };

        let inventory = build_inventory(hosts, running);
        label_idle_host(
            &workload.spec.node_selector,
            hosts,
            &inventory,
            &target,
            &self.profiles,
            &self.profile_label,
        )
    }
}
