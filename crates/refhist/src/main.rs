mod script;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use refhist_mod_history::config::resolve_config_path;
use refhist_mod_history::{FlushMode, HistoryConfig, HistoryOptions};

/// Drives an undo/redo history over a JSON value from a list of steps.
///
/// Steps: set=<json>, patch=<pointer>=<json>, commit, undo, redo, tick,
/// pause, resume, resume! (resume and commit), reset, clear, dispose.
#[derive(Parser, Debug)]
#[command(name = "refhist", version, about)]
struct Cli {
    /// Initial value, as JSON.
    initial: String,

    /// Steps to run, in order.
    steps: Vec<String>,

    /// Configuration file. Defaults to $REFHIST_CONFIG or refhist.json
    /// next to the executable.
    #[arg(long)]
    config: Option<PathBuf>,

    /// When changes are committed.
    #[arg(long, value_enum)]
    flush: Option<FlushArg>,

    /// Also record in-place patches.
    #[arg(long)]
    deep: bool,

    /// Deep-copy snapshots.
    #[arg(long)]
    clone: bool,

    /// Max undoable steps.
    #[arg(long)]
    capacity: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FlushArg {
    Sync,
    Pre,
}

impl From<FlushArg> for FlushMode {
    fn from(arg: FlushArg) -> Self {
        match arg {
            FlushArg::Sync => FlushMode::Sync,
            FlushArg::Pre => FlushMode::Pre,
        }
    }
}

impl Cli {
    /// Command-line flags layered over the configuration file.
    fn history_config(&self) -> HistoryConfig {
        let path = self.config.clone().unwrap_or_else(resolve_config_path);
        let mut config = HistoryConfig::load_or_default(&path);
        if let Some(flush) = self.flush {
            config.flush = flush.into();
        }
        config.deep |= self.deep;
        config.clone |= self.clone;
        if self.capacity.is_some() {
            config.capacity = self.capacity;
        }
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting refhist");

    let config = cli.history_config();
    tracing::debug!(?config, "Resolved history config");

    let initial = serde_json::from_str(&cli.initial).context("Failed to parse initial value")?;
    let steps = script::parse_steps(&cli.steps)?;

    let report = script::run(initial, HistoryOptions::from_config(&config), &steps)?;
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    println!("{json}");

    Ok(())
}
