//! RuleStore: lock-guarded map of pending container overrides.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use migadapter_core::{ResourceClaim, ResourceList, WorkloadKey};
use tracing::debug;

use crate::types::{ContainerRule, WorkloadRules};

/// Thread-safe store of pending resource overrides.
#[derive(Debug, Default)]
pub struct RuleStore {
    rules: RwLock<HashMap<WorkloadKey, WorkloadRules>>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    // The map holds plain data and no update spans a panic point, so a
    // poisoned lock still guards a consistent map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<WorkloadKey, WorkloadRules>> {
        self.rules.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<WorkloadKey, WorkloadRules>> {
        self.rules.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Upsert the supplied fields for one container of a workload.
    ///
    /// Fields passed as `None` keep whatever was stored before.
    pub fn store(
        &self,
        key: &WorkloadKey,
        container: &str,
        requests: Option<ResourceList>,
        limits: Option<ResourceList>,
        claims: Option<Vec<ResourceClaim>>,
    ) {
        let mut rules = self.write();
        let rule = rules
            .entry(key.clone())
            .or_default()
            .entry(container.to_string())
            .or_default();

        if requests.is_some() {
            rule.requests = requests;
        }
        if limits.is_some() {
            rule.limits = limits;
        }
        if claims.is_some() {
            rule.claims = claims;
        }
        debug!(workload = %key, container, "resource rule stored");
    }

    /// Pending overrides for one container; all fields `None` if unknown.
    pub fn get(&self, key: &WorkloadKey, container: &str) -> ContainerRule {
        self.read()
            .get(key)
            .and_then(|containers| containers.get(container))
            .cloned()
            .unwrap_or_default()
    }

    /// Pending overrides for every container of a workload.
    pub fn get_workload(&self, key: &WorkloadKey) -> Option<WorkloadRules> {
        self.read().get(key).cloned()
    }

    /// Drop every override for a workload. Returns true if any existed.
    pub fn remove(&self, key: &WorkloadKey) -> bool {
        let existed = self.write().remove(key).is_some();
        if existed {
            debug!(workload = %key, "resource rules removed");
        }
        existed
    }

    /// A copy of every pending override, ordered by workload key.
    pub fn entries(&self) -> BTreeMap<WorkloadKey, WorkloadRules> {
        self.read()
            .iter()
            .map(|(key, rules)| (key.clone(), rules.clone()))
            .collect()
    }

    pub fn contains(&self, key: &WorkloadKey) -> bool {
        self.read().contains_key(key)
    }

    /// Number of workload keys with pending overrides.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
