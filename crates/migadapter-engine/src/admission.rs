//! Admission mutator: apply pending resource rules to a workload being
//! (re)created.
//!
//! ```text
//!   submitted workload ──► rules.get(key, container) ──► overwrite fields
//!                                                            │
//!            annotation ◄── snapshot of overwritten fields ◄─┘
//!                                                            │
//!                                    rules.remove(key) ◄─────┘
//! ```
//!
//! The snapshot records what the caller asked for, so the restore planner
//! can later find its way back.

use migadapter_core::{ContainerResources, ResourceRequirements, Workload};
use tracing::{debug, info, warn};

use crate::adapter::Adapter;

impl Adapter {
    /// Overwrite container resources with any pending rules for this
    /// workload, recording the submitted values in the original-value
    /// annotation.
    ///
    /// Rules are consumed: the workload key is cleared from the store
    /// whether or not anything matched. Returns true iff some container was
    /// changed.
    pub fn mutate(&self, workload: &mut Workload) -> bool {
        let key = workload.key();
        let mut originals = ContainerResources::new();

        for container in &mut workload.spec.containers {
            let rule = self.rules.get(&key, &container.name);
            if rule.is_empty() {
                continue;
            }

            let mut snapshot = ResourceRequirements::default();
            let mut updated = container.resources.clone();
            if let Some(requests) = rule.requests {
                snapshot.requests = std::mem::replace(&mut updated.requests, requests);
            }
            if let Some(limits) = rule.limits {
                snapshot.limits = std::mem::replace(&mut updated.limits, limits);
            }
            if let Some(claims) = rule.claims {
                snapshot.claims = std::mem::replace(&mut updated.claims, claims);
            }

            debug!(workload = %key, container = %container.name, "applying resource rule");
            container.resources = updated;
            originals.insert(container.name.clone(), snapshot);
        }

        self.rules.remove(&key);

        if originals.is_empty() {
            return false;
        }

        match serde_json::to_string(&originals) {
            Ok(encoded) => {
                workload
                    .meta
                    .annotations
                    .insert(self.annotation_key.clone(), encoded);
            }
            Err(e) => warn!(workload = %key, error = %e, "failed to encode original resources"),
        }
        info!(workload = %key, containers = originals.len(), "workload resources mutated");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migadapter_core::{Container, Quantity, ResourceClaim, ResourceList, WorkloadKey};

    fn list(name: &str) -> ResourceList {
        let mut l = ResourceList::new();
        l.insert(name.to_string(), Quantity::from_units(1));
        l
    }

    fn workload(containers: &[&str]) -> Workload {
        let mut w = Workload::default();
        w.meta.namespace = "test".to_string();
        w.meta.generate_name = "job-".to_string();
        for name in containers {
            w.spec.containers.push(Container {
                name: name.to_string(),
                resources: ResourceRequirements {
                    requests: list("nvidia.com/mig-1g.5gb"),
                    limits: list("nvidia.com/mig-1g.5gb"),
                    claims: Vec::new(),
                },
            });
        }
        w
    }

    #[test]
    fn no_rule_no_change() {
        let adapter = Adapter::new();
        let mut w = workload(&["c1"]);
        let before = w.clone();
        assert!(!adapter.mutate(&mut w));
        assert_eq!(w, before);
    }

    #[test]
    fn applies_rule_and_records_original() {
        let adapter = Adapter::new();
        let key = WorkloadKey::new("test", "job-");
        adapter.rules().store(
            &key,
            "c1",
            Some(list("nvidia.com/mig-2g.10gb")),
            Some(list("nvidia.com/mig-2g.10gb")),
            None,
        );

        let mut w = workload(&["c1", "c2"]);
        assert!(adapter.mutate(&mut w));

        assert_eq!(w.spec.containers[0].resources.requests, list("nvidia.com/mig-2g.10gb"));
        assert_eq!(w.spec.containers[0].resources.limits, list("nvidia.com/mig-2g.10gb"));
        assert_eq!(w.spec.containers[1].resources.limits, list("nvidia.com/mig-1g.5gb"));

        let records = adapter.original_resources(&w).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records["c1"].requests, list("nvidia.com/mig-1g.5gb"));
        assert!(!adapter.rules().contains(&key));
    }

    #[test]
    fn absent_fields_are_left_alone() {
        let adapter = Adapter::new();
        let key = WorkloadKey::new("test", "job-");
        let claims = vec![ResourceClaim {
            name: "gpu".to_string(),
            request: None,
        }];
        adapter.rules().store(&key, "c1", None, None, Some(claims.clone()));

        let mut w = workload(&["c1"]);
        assert!(adapter.mutate(&mut w));
        assert_eq!(w.spec.containers[0].resources.claims, claims);
        assert_eq!(w.spec.containers[0].resources.requests, list("nvidia.com/mig-1g.5gb"));

        let records = adapter.original_resources(&w).unwrap();
        assert!(records["c1"].requests.is_empty());
        assert!(records["c1"].claims.is_empty());
    }

    #[test]
    fn rules_are_consumed_once() {
        let adapter = Adapter::new();
        let key = WorkloadKey::new("test", "job-");
        adapter
            .rules()
            .store(&key, "c1", Some(list("nvidia.com/mig-3g.20gb")), None, None);

        let mut first = workload(&["c1"]);
        assert!(adapter.mutate(&mut first));
        let mut second = workload(&["c1"]);
        assert!(!adapter.mutate(&mut second));
        assert_eq!(second.spec.containers[0].resources.requests, list("nvidia.com/mig-1g.5gb"));
    }

    #[test]
    fn unmatched_rules_are_still_cleared() {
        let adapter = Adapter::new();
        let key = WorkloadKey::new("test", "job-");
        adapter
            .rules()
            .store(&key, "other", Some(list("nvidia.com/mig-3g.20gb")), None, None);

        let mut w = workload(&["c1"]);
        assert!(!adapter.mutate(&mut w));
        assert!(adapter.rules().is_empty());
    }
}
