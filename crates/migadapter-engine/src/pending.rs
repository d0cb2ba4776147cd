//! Detection of workloads that are unschedulable for lack of a partition.
//!
//! The scheduler reports this only as free text in the `PodScheduled`
//! condition, e.g. `0/2 nodes are available: Insufficient
//! nvidia.com/mig-1g.5gb, ...`. All knowledge of that message grammar is in
//! [`insufficient_partition`]; everything else consumes [`PendingDemand`].

use migadapter_core::{
    CONDITION_SCHEDULED, ConditionStatus, PARTITION_RESOURCE_PREFIX, Phase, REASON_UNSCHEDULABLE,
    Workload,
};
use migadapter_placement::{PartitionError, PartitionId};

const INSUFFICIENT_MARKER: &str = "Insufficient ";
const FIELD_SEPARATOR: char = ',';

/// The partition resource a pending workload is waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDemand {
    pub resource_name: String,
}

impl PendingDemand {
    pub fn partition(&self) -> Result<PartitionId, PartitionError> {
        self.resource_name.parse()
    }
}

/// Extract the partition resource name from a scheduler diagnostic.
///
/// Returns the text from `nvidia.com/mig-` up to the next `,` (or the end of
/// the message) following an `Insufficient nvidia.com/mig-` marker.
pub fn insufficient_partition(message: &str) -> Option<&str> {
    let marker = format!("{INSUFFICIENT_MARKER}{PARTITION_RESOURCE_PREFIX}");
    let start = message.find(&marker)? + INSUFFICIENT_MARKER.len();
    let rest = &message[start..];
    let end = rest.find(FIELD_SEPARATOR).unwrap_or(rest.len());
    Some(rest[..end].trim())
}

/// The partition a workload is stuck on, if it is pending for one.
pub fn pending_partition(workload: &Workload) -> Option<PendingDemand> {
    if workload.status.phase != Phase::Pending {
        return None;
    }

    workload
        .status
        .conditions
        .iter()
        .filter(|c| {
            c.kind == CONDITION_SCHEDULED
                && c.status == ConditionStatus::False
                && c.reason == REASON_UNSCHEDULABLE
        })
        .find_map(|c| insufficient_partition(&c.message))
        .map(|name| PendingDemand {
            resource_name: name.to_string(),
        })
}
