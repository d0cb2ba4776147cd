//! migadapter-rules — pending resource overrides for the admission hook.
//!
//! Planners record here the resources a workload's containers should be
//! admitted with; the admission mutator reads and clears them when the
//! workload is next created.
//!
//! # Architecture
//!
//! One `RwLock` guards the whole keyspace. Entries are small and live only
//! between a planning decision and the next admission, so contention stays
//! low. The store is in-memory: losing it means a pending resize is never
//! applied, and the workload simply stays at its submitted size.
//!
//! `RuleStore` is `Send + Sync`; share it behind an `Arc`.

pub mod store;
pub mod types;

pub use store::RuleStore;
pub use types::{ContainerRule, WorkloadRules};
