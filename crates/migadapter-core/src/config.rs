//! migadapter.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::types::{ORIGINAL_ANNOTATION_KEY, PARTITION_RESOURCE_PREFIX, PROFILE_LABEL_KEY};

/// Partition resource name → repartition profile name.
pub type ProfileTable = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdapterConfig {
    pub adapter: Option<AdapterSection>,
    /// Overrides for the partition → profile table.
    pub profiles: Option<ProfileTable>,
    pub daemon: Option<DaemonSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdapterSection {
    pub annotation_key: Option<String>,
    pub profile_label: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonSection {
    pub snapshot: Option<String>,
    pub interval_secs: Option<u64>,
}

/// Built-in profile table used when no cluster configuration is supplied.
pub fn default_profiles() -> ProfileTable {
    ["1g.5gb", "2g.10gb", "3g.20gb", "4g.20gb"]
        .into_iter()
        .map(|size| (format!("{PARTITION_RESOURCE_PREFIX}{size}"), format!("all-{size}")))
        .collect()
}

impl AdapterConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AdapterConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn annotation_key(&self) -> &str {
        self.adapter
            .as_ref()
            .and_then(|a| a.annotation_key.as_deref())
            .unwrap_or(ORIGINAL_ANNOTATION_KEY)
    }

    pub fn profile_label(&self) -> &str {
        self.adapter
            .as_ref()
            .and_then(|a| a.profile_label.as_deref())
            .unwrap_or(PROFILE_LABEL_KEY)
    }

    /// The default table with any configured entries layered on top.
    pub fn profiles(&self) -> ProfileTable {
        let mut table = default_profiles();
        if let Some(overrides) = &self.profiles {
            table.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        table
    }

    pub fn interval_secs(&self) -> u64 {
        self.daemon
            .as_ref()
            .and_then(|d| d.interval_secs)
            .unwrap_or(30)
    }
}
