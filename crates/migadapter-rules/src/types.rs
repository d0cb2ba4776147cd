//! Rule store record types.

use std::collections::BTreeMap;

use migadapter_core::{ResourceClaim, ResourceList};
use serde::{Deserialize, Serialize};

/// Pending overrides for one container. `None` means "leave as submitted".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requests: Option<ResourceList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<Vec<ResourceClaim>>,
}

impl ContainerRule {
    pub fn is_empty(&self) -> bool {
        self.requests.is_none() && self.limits.is_none() && self.claims.is_none()
    }
}

/// Container name → pending overrides, for one workload key.
pub type WorkloadRules = BTreeMap<String, ContainerRule>;
