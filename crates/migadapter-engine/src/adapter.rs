//! The adapter engine value.
//!
//! Built once at process start and handed to the reconciler and the
//! admission hook. Clones share one rule store; separately constructed
//! adapters are fully isolated, which keeps tests independent.

use std::sync::Arc;

use migadapter_core::config::{ProfileTable, default_profiles};
use migadapter_core::{AdapterConfig, ORIGINAL_ANNOTATION_KEY, PROFILE_LABEL_KEY};
use migadapter_rules::RuleStore;

#[derive(Debug, Clone)]
pub struct Adapter {
    pub(crate) rules: Arc<RuleStore>,
    pub(crate) annotation_key: String,
    pub(crate) profile_label: String,
    pub(crate) profiles: Arc<ProfileTable>,
}

impl Adapter {
    /// An adapter with the built-in annotation key, label key and profiles.
    pub fn new() -> Self {
        Self {
            rules: Arc::new(RuleStore::new()),
            annotation_key: ORIGINAL_ANNOTATION_KEY.to_string(),
            profile_label: PROFILE_LABEL_KEY.to_string(),
            profiles: Arc::new(default_profiles()),
        }
    }

    pub fn from_config(config: &AdapterConfig) -> Self {
        Self {
            rules: Arc::new(RuleStore::new()),
            annotation_key: config.annotation_key().to_string(),
            profile_label: config.profile_label().to_string(),
            profiles: Arc::new(config.profiles()),
        }
    }

    /// Use an existing rule store instead of a fresh one.
    pub fn with_rules(mut self, rules: Arc<RuleStore>) -> Self {
        self.rules = rules;
        self
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    pub fn annotation_key(&self) -> &str {
        &self.annotation_key
    }

    pub fn profile_label(&self) -> &str {
        &self.profile_label
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }
}

impl Default for Adapter {
    fn default() -> Self {
        Self::new()
    }
}
