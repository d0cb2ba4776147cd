//! Ascending catalog of the partition sizes present in the cluster.

use crate::inventory::Inventory;
use crate::partition::PartitionId;

/// Every distinct partition size seen in an inventory, smallest first.
pub type Catalog = Vec<PartitionId>;

pub fn build_catalog(inventory: &Inventory) -> Catalog {
    let mut catalog: Catalog = inventory
        .values()
        .flat_map(|host| host.free.keys().copied())
        .collect();
    catalog.sort();
    catalog.dedup();
    catalog
}
