//! migadapterd — the MIG adapter daemon.
//!
//! Drives the adapter engine against a cluster snapshot file:
//! - `reconcile` runs one pass and prints what it did
//! - `watch` re-reads the snapshot on an interval until Ctrl-C
//! - `admit` runs the admission mutator on a single workload
//!
//! # Usage
//!
//! ```text
//! migadapterd --config migadapter.toml reconcile --snapshot cluster.json --write-snapshot \
//!     --rules-out rules.json
//! migadapterd watch --snapshot cluster.json --interval 10 --rules-out rules.json
//! migadapterd admit --workload pod.json --rules rules.json
//! ```

mod admit;
mod control_loop;
mod rules_file;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use migadapter_core::{AdapterConfig, WorkloadKey};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "migadapterd", about = "MIG partition adapter daemon")]
struct Cli {
    /// Adapter configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run one reconcile pass over a cluster snapshot.
    Reconcile {
        /// Cluster snapshot (JSON). Falls back to `daemon.snapshot` in the config.
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Workloads (`namespace/name`) known to have been deleted.
        #[arg(long = "deleted")]
        deleted: Vec<String>,

        /// Write the resulting cluster state back to the snapshot file.
        #[arg(long)]
        write_snapshot: bool,

        /// Write pending resource rules here for `admit --rules`.
        #[arg(long)]
        rules_out: Option<PathBuf>,
    },

    /// Reconcile repeatedly, re-reading the snapshot each interval.
    Watch {
        /// Cluster snapshot (JSON). Falls back to `daemon.snapshot` in the config.
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Seconds between passes. Falls back to `daemon.interval_secs`.
        #[arg(long)]
        interval: Option<u64>,

        /// Write pending resource rules here after every pass.
        #[arg(long)]
        rules_out: Option<PathBuf>,
    },

    /// Apply pending resource rules to a workload and print the result.
    Admit {
        /// Workload to admit (JSON).
        #[arg(long)]
        workload: PathBuf,

        /// Pending rules (JSON object keyed by `namespace/name`).
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = match &cli.config {
        Some(path) => AdapterConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AdapterConfig::default(),
    };

    match cli.command {
        Command::Reconcile {
            snapshot,
            deleted,
            write_snapshot,
            rules_out,
        } => {
            let path = snapshot_path(snapshot, &config)?;
            let deleted: Vec<WorkloadKey> =
                deleted.iter().map(|s| WorkloadKey::parse(s)).collect();
            control_loop::run_once(&config, &path, &deleted, write_snapshot, rules_out.as_deref())
                .await
        }
        Command::Watch {
            snapshot,
            interval,
            rules_out,
        } => {
            let path = snapshot_path(snapshot, &config)?;
            let interval = interval.unwrap_or_else(|| config.interval_secs());
            control_loop::run_watch(&config, &path, interval, rules_out.as_deref()).await
        }
        Command::Admit { workload, rules } => admit::run(&config, &workload, rules.as_deref()),
    }
}

fn init_tracing(format: LogFormat) {
    // Stdout carries command output; logs go to stderr.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,migadapterd=debug,migadapter=debug"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn snapshot_path(flag: Option<PathBuf>, config: &AdapterConfig) -> anyhow::Result<PathBuf> {
    flag.or_else(|| {
        config
            .daemon
            .as_ref()
            .and_then(|d| d.snapshot.as_deref())
            .map(PathBuf::from)
    })
    .context("no cluster snapshot given (use --snapshot or daemon.snapshot in the config)")
}
