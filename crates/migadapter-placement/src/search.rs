//! Greedy first-fit partition search.
//!
//! Walks the catalog from the current size upward and, for each size,
//! walks hosts in name order. The first host with enough free capacity at
//! a size wins and has that capacity reserved in the inventory, so later
//! searches in the same planning pass see it as taken.

use migadapter_core::{Labels, Quantity, labels_match};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::inventory::Inventory;
use crate::partition::PartitionId;

/// Find and reserve the smallest catalog size `>= current` that some
/// selector-matching host can supply `quantity` of.
///
/// On success exactly one inventory cell is decremented by `quantity`. On
/// failure the inventory is untouched.
pub fn find_fit(
    current: PartitionId,
    quantity: Quantity,
    selector: &Labels,
    inventory: &mut Inventory,
    catalog: &Catalog,
) -> Option<PartitionId> {
    for candidate in catalog.iter().filter(|c| **c >= current) {
        for (host_name, host) in inventory.iter_mut() {
            if !labels_match(&host.labels, selector) {
                continue;
            }
            let Some(free) = host.free.get_mut(candidate) else {
                continue;
            };
            if *free >= quantity {
                *free = *free - quantity;
                debug!(
                    host = %host_name,
                    partition = %candidate,
                    reserved = %quantity,
                    remaining = %free,
                    "reserved partition"
                );
                return Some(*candidate);
            }
        }
    }

    info!(demand = %current, quantity = %quantity, "no partition available to fit demand");
    None
}
