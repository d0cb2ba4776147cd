//! Object model shared across the adapter crates.
//!
//! These types mirror the slice of the cluster API the adapter reads and
//! writes: hosts with allocatable capacity, and workload instances with
//! per-container resource requirements and scheduling status. All maps are
//! `BTreeMap` so that every scan over them is reproducible.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::quantity::Quantity;

/// Prefix shared by every GPU partition resource name.
pub const PARTITION_RESOURCE_PREFIX: &str = "nvidia.com/mig-";

/// Annotation holding the caller-submitted resources of a mutated workload.
pub const ORIGINAL_ANNOTATION_KEY: &str = "adapter.gpu.turbonomic.ibm.com/original";

/// Host label read by the external partition manager.
pub const PROFILE_LABEL_KEY: &str = "nvidia.com/mig.config";

/// Condition type reported by the scheduler.
pub const CONDITION_SCHEDULED: &str = "PodScheduled";

/// Reason used by the scheduler when no host can take a workload.
pub const REASON_UNSCHEDULABLE: &str = "Unschedulable";

/// Resource name → quantity.
pub type ResourceList = BTreeMap<String, Quantity>;

/// Label or selector map.
pub type Labels = BTreeMap<String, String>;

// ── Metadata ──────────────────────────────────────────────────────

/// Identity and free-form metadata of a cluster object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ObjectMeta {
    pub name: String,
    /// Name prefix used when the final name is generated at creation.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub generate_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

// ── Resources ─────────────────────────────────────────────────────

/// Reference to a dynamically allocated resource claim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceClaim {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
}

/// Requests, limits and claims of a single container.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResourceRequirements {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub requests: ResourceList,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub limits: ResourceList,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub claims: Vec<ResourceClaim>,
}

/// Container name → resource requirements, as recorded in the original-value
/// annotation.
pub type ContainerResources = BTreeMap<String, ResourceRequirements>;

// ── Host ──────────────────────────────────────────────────────────

/// A compute host advertising allocatable capacity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Host {
    pub meta: ObjectMeta,
    pub allocatable: ResourceList,
}

impl Host {
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Whether every selector pair is present in this host's labels.
    pub fn matches(&self, selector: &Labels) -> bool {
        labels_match(&self.meta.labels, selector)
    }
}

/// Exact label match: every `selector` key must be present with the same value.
pub fn labels_match(labels: &Labels, selector: &Labels) -> bool {
    selector
        .iter()
        .all(|(k, v)| labels.get(k).is_some_and(|lv| lv == v))
}

// ── Workload ──────────────────────────────────────────────────────

/// One container of a workload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Container {
    pub name: String,
    pub resources: ResourceRequirements,
}

/// Desired state of a workload instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkloadSpec {
    /// Host the workload is bound to, once scheduled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: Labels,
    pub containers: Vec<Container>,
}

/// Lifecycle phase of a workload instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

/// Status of a scheduling condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

/// A condition reported on a workload's status.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: ConditionStatus,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// Observed state of a workload instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkloadStatus {
    pub phase: Phase,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// A workload instance (a pod, in Kubernetes terms).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Workload {
    pub meta: ObjectMeta,
    pub spec: WorkloadSpec,
    pub status: WorkloadStatus,
}

impl Workload {
    /// Rule-store key for this workload.
    pub fn key(&self) -> WorkloadKey {
        WorkloadKey::for_meta(&self.meta)
    }

    /// Concrete `namespace/name` reference, as used by cluster lookups.
    pub fn reference(&self) -> WorkloadKey {
        WorkloadKey::new(self.meta.namespace.clone(), self.meta.name.clone())
    }

    pub fn is_running(&self) -> bool {
        self.status.phase == Phase::Running
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.meta.annotations.get(key).map(String::as_str)
    }
}

// ── WorkloadKey ───────────────────────────────────────────────────

/// Namespace-scoped workload identity used to address the rule store.
///
/// The name part is the generation prefix when one is set, otherwise the
/// concrete name. A workload admitted before its name is generated and the
/// same workload observed later therefore share one key. Distinct workloads
/// sharing a prefix in one namespace share it too.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkloadKey {
    pub namespace: String,
    pub name: String,
}

impl WorkloadKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn for_meta(meta: &ObjectMeta) -> Self {
        let name = if meta.generate_name.is_empty() {
            &meta.name
        } else {
            &meta.generate_name
        };
        Self::new(meta.namespace.clone(), name.clone())
    }

    /// Parse a `namespace/name` string; a bare name lands in the empty namespace.
    pub fn parse(s: &str) -> Self {
        match s.split_once('/') {
            Some((ns, name)) => Self::new(ns, name),
            None => Self::new("", s),
        }
    }
}

impl fmt::Display for WorkloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
