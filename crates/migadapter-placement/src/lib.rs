//! MIG adapter placement — partition algebra and first-fit search.
//!
//! This crate answers "which partition size can this demand have right
//! now?". It does NOT decide when to resize or touch the rule store (that's
//! `migadapter-engine`). Everything here is a pure computation over a
//! snapshot of hosts and workloads.
//!
//! # Components
//!
//! - **`partition`** — `PartitionId` parse/format/order
//! - **`inventory`** — Free partition capacity per host
//! - **`catalog`** — Ascending list of partition sizes in the cluster
//! - **`search`** — Greedy first-fit reservation
//! - **`resources`** — Reading and rewriting partition entries in resource lists
//! - **`idle`** — Hosts whose GPU carries no running workload

pub mod catalog;
pub mod idle;
pub mod inventory;
pub mod partition;
pub mod resources;
pub mod search;

pub use catalog::{Catalog, build_catalog};
pub use idle::{allocatable_partitions, find_idle_host};
pub use inventory::{HostInventory, Inventory, build_inventory};
pub use partition::{PartitionError, PartitionId, is_partition_resource};
pub use resources::{PartitionDemand, current_demand, demand_of, rewrite_partition};
pub use search::find_fit;
