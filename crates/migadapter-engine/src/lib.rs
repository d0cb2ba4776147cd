//! migadapter-engine — GPU partition resize planning.
//!
//! Decides when a workload's partition request should grow, when it can
//! shrink back, and which idle host should be repartitioned. Decisions
//! reach the workload through the admission mutator:
//!
//! - The upsize planner rewrites a pending workload to the smallest free
//!   partition that fits and records the new resources in the rule store
//! - The caller restarts the workload; on re-admission the mutator applies
//!   the recorded resources and stamps the submitted ones into an annotation
//! - When a workload goes away, the restore planner reads those annotations
//!   and picks workloads that can now run closer to what they asked for
//!
//! # Architecture
//!
//! ```text
//! Reconciler
//!   ├── ClusterState (list hosts/workloads, update host, delete workload)
//!   └── Adapter
//!       ├── Arc<RuleStore> (pending overrides, shared with admission)
//!       ├── plan_upsize / plan_restore / plan_idle_host
//!       │     └── migadapter-placement (inventory, catalog, find_fit)
//!       └── mutate (admission hook)
//! ```

pub mod adapter;
pub mod admission;
pub mod cluster;
pub mod error;
pub mod labeler;
pub mod pending;
pub mod reconcile;
pub mod restore;
pub mod upsize;

pub use adapter::Adapter;
pub use cluster::{ClusterSnapshot, ClusterState, MemoryCluster};
pub use error::{ClusterError, ClusterResult};
pub use labeler::label_idle_host;
pub use pending::{PendingDemand, insufficient_partition, pending_partition};
pub use reconcile::{ReconcileOutcome, ReconcileReport, Reconciler};
