//! The `admit` command: mutate one workload with rules from a file.

use std::path::Path;

use anyhow::Context;
use migadapter_core::{AdapterConfig, Workload};
use migadapter_engine::Adapter;
use tracing::info;

use crate::rules_file::{load_rules, save_rules};

pub fn run(
    config: &AdapterConfig,
    workload_path: &Path,
    rules_path: Option<&Path>,
) -> anyhow::Result<()> {
    let adapter = Adapter::from_config(config);
    if let Some(path) = rules_path {
        let count = load_rules(&adapter, path)?;
        info!(rules = count, "rules loaded");
    }

    let content = std::fs::read_to_string(workload_path)
        .with_context(|| format!("reading workload {}", workload_path.display()))?;
    let mut workload: Workload = serde_json::from_str(&content)?;

    let changed = adapter.mutate(&mut workload);
    info!(workload = %workload.key(), changed, "workload admitted");

    // Consumed rules leave the file too.
    if let Some(path) = rules_path {
        save_rules(&adapter, path)?;
    }

    println!("{}", serde_json::to_string_pretty(&workload)?);
    Ok(())
}
