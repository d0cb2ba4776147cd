//! Rules file I/O: `{"namespace/name": {"container": {requests, limits, claims}}}`.
//!
//! `reconcile` and `watch` write the store here with `--rules-out`; `admit`
//! reads it back with `--rules`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use migadapter_core::WorkloadKey;
use migadapter_engine::Adapter;
use migadapter_rules::WorkloadRules;
use tracing::debug;

pub type RulesFile = BTreeMap<String, WorkloadRules>;

/// Load every rule in `path` into the adapter's store. Returns the number
/// of container rules stored.
pub fn load_rules(adapter: &Adapter, path: &Path) -> anyhow::Result<usize> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading rules {}", path.display()))?;
    let rules: RulesFile = serde_json::from_str(&content)
        .with_context(|| format!("parsing rules {}", path.display()))?;

    let mut count = 0;
    for (key, containers) in rules {
        let key = WorkloadKey::parse(&key);
        for (container, rule) in containers {
            adapter
                .rules()
                .store(&key, &container, rule.requests, rule.limits, rule.claims);
            count += 1;
        }
    }
    Ok(count)
}

/// Write the adapter's pending rules to `path`, replacing its contents.
pub fn save_rules(adapter: &Adapter, path: &Path) -> anyhow::Result<usize> {
    let rules: RulesFile = adapter
        .rules()
        .entries()
        .into_iter()
        .map(|(key, containers)| (key.to_string(), containers))
        .collect();
    let count: usize = rules.values().map(BTreeMap::len).sum();

    std::fs::write(path, serde_json::to_string_pretty(&rules)?)
        .with_context(|| format!("writing rules {}", path.display()))?;
    debug!(path = %path.display(), rules = count, "rules written");
    Ok(count)
}

/// Seed the store from `path` if a previous pass left rules there.
pub fn merge_existing(adapter: &Adapter, path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        let count = load_rules(adapter, path)?;
        debug!(path = %path.display(), rules = count, "pending rules carried over");
    }
    Ok(())
}
