//! Free partition capacity per host.
//!
//! Built fresh for every planning pass: each host's allocatable partitions
//! minus the partition limits of every running workload bound to it.

use std::collections::BTreeMap;

use migadapter_core::{Host, Labels, Quantity, Workload};
use tracing::{debug, warn};

use crate::idle::allocatable_partitions;
use crate::partition::{PartitionId, is_partition_resource};

/// Free capacity and labels of one host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostInventory {
    pub labels: Labels,
    pub free: BTreeMap<PartitionId, Quantity>,
}

impl HostInventory {
    pub fn free_of(&self, partition: &PartitionId) -> Quantity {
        self.free.get(partition).copied().unwrap_or(Quantity::ZERO)
    }
}

/// Host name → free capacity. Iterates in host-name order.
pub type Inventory = BTreeMap<String, HostInventory>;

/// Compute free partition capacity for every host in the snapshot.
pub fn build_inventory(hosts: &[Host], workloads: &[Workload]) -> Inventory {
    let mut inventory: Inventory = hosts
        .iter()
        .map(|host| {
            (
                host.name().to_string(),
                HostInventory {
                    labels: host.meta.labels.clone(),
                    free: allocatable_partitions(host),
                },
            )
        })
        .collect();

    for workload in workloads.iter().filter(|w| w.is_running()) {
        let Some(host_name) = workload.spec.host_name.as_deref() else {
            continue;
        };
        let Some(host) = inventory.get_mut(host_name) else {
            debug!(workload = %workload.key(), host = host_name, "running on unknown host");
            continue;
        };

        for container in &workload.spec.containers {
            for (name, used) in &container.resources.limits {
                if !is_partition_resource(name) {
                    continue;
                }
                let partition = match name.parse::<PartitionId>() {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(workload = %workload.key(), error = %e, "skipping malformed limit");
                        continue;
                    }
                };
                let free = host.free.entry(partition).or_insert(Quantity::ZERO);
                *free = *free - *used;
                if free.is_negative() {
                    warn!(
                        host = host_name,
                        partition = %partition,
                        free = %free,
                        "partition usage exceeds allocatable"
                    );
                }
            }
        }
    }

    debug!(hosts = inventory.len(), "built partition inventory");
    inventory
}
