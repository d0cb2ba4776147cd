//! Idle host detection.
//!
//! A host is idle when its free partition map equals its allocatable map,
//! i.e. no running workload consumes any partition on it. One physical GPU
//! per host is assumed, so an idle host can be repartitioned wholesale.

use std::collections::BTreeMap;

use migadapter_core::{Host, Labels, Quantity};
use tracing::{debug, warn};

use crate::inventory::Inventory;
use crate::partition::{PartitionId, is_partition_resource};

/// Allocatable partition capacity advertised by a host.
pub fn allocatable_partitions(host: &Host) -> BTreeMap<PartitionId, Quantity> {
    host.allocatable
        .iter()
        .filter(|(name, _)| is_partition_resource(name))
        .filter_map(|(name, quantity)| match name.parse::<PartitionId>() {
            Ok(id) => Some((id, *quantity)),
            Err(e) => {
                warn!(host = host.name(), error = %e, "skipping malformed allocatable entry");
                None
            }
        })
        .collect()
}

/// First selector-matching host (in name order) with no partition in use.
pub fn find_idle_host<'a>(
    selector: &Labels,
    hosts: &'a [Host],
    inventory: &Inventory,
) -> Option<&'a Host> {
    let mut candidates: Vec<&Host> = hosts.iter().filter(|h| h.matches(selector)).collect();
    candidates.sort_by(|a, b| a.name().cmp(b.name()));

    let idle = candidates.into_iter().find(|host| {
        inventory
            .get(host.name())
            .is_some_and(|inv| inv.free == allocatable_partitions(host))
    });

    match idle {
        Some(host) => debug!(host = host.name(), "found idle host"),
        None => debug!("no idle host matches selector"),
    }
    idle
}
