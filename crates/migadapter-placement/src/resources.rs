//! Reading and rewriting the partition entry of a resource list.
//!
//! A container is assumed to carry at most one partition resource. Lists
//! are never edited in place: a rewrite returns a new list.

use migadapter_core::{Quantity, ResourceList, ResourceRequirements};
use tracing::warn;

use crate::partition::{PartitionId, is_partition_resource};

/// A partition size together with how many of them are wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionDemand {
    pub partition: PartitionId,
    pub quantity: Quantity,
}

/// The partition entry of a resource list, if any.
///
/// Entries in the partition family that fail to parse are skipped.
pub fn demand_of(list: &ResourceList) -> Option<PartitionDemand> {
    list.iter()
        .filter(|(name, _)| is_partition_resource(name))
        .find_map(|(name, quantity)| match name.parse::<PartitionId>() {
            Ok(partition) => Some(PartitionDemand {
                partition,
                quantity: *quantity,
            }),
            Err(e) => {
                warn!(resource = %name, error = %e, "skipping malformed partition resource");
                None
            }
        })
}

/// Demand of a container: requests first, limits when requests carry none.
pub fn current_demand(resources: &ResourceRequirements) -> Option<PartitionDemand> {
    demand_of(&resources.requests).or_else(|| demand_of(&resources.limits))
}

/// Build a copy of `list` whose only partition entry is `target = quantity`.
///
/// Non-partition entries are kept as-is. The flag reports whether the new
/// list differs from the old one.
pub fn rewrite_partition(
    list: &ResourceList,
    target: PartitionId,
    quantity: Quantity,
) -> (ResourceList, bool) {
    let mut rebuilt: ResourceList = list
        .iter()
        .filter(|(name, _)| !is_partition_resource(name))
        .map(|(name, q)| (name.clone(), *q))
        .collect();
    rebuilt.insert(target.resource_name(), quantity);

    let changed = rebuilt != *list;
    (rebuilt, changed)
}
