//! # Command Line Interface
//!
//! `rank` scores a snapshot directory and prints the cycle output as JSON;
//! `audit` resolves it and prints identity diagnostics only.

use crate::config::{load_config, EngineConfig};
use crate::engine::StrengthEngine;
use crate::models::CohortKind;
use crate::snapshot::SnapshotLoader;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use player_registry::EngineCache;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Dynasty league strength rankings
#[derive(Parser, Debug)]
#[command(name = "strength-engine")]
#[command(about = "Score and rank a dynasty league snapshot", version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank one or every cohort
    Rank {
        /// Snapshot directory
        #[arg(long)]
        snapshot: PathBuf,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Only rank this cohort
        #[arg(long, value_enum)]
        cohort: Option<CohortKind>,
    },
    /// Report unresolved records, identity conflicts and orphans
    Audit {
        /// Snapshot directory
        #[arg(long)]
        snapshot: PathBuf,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Commands {
    pub fn config_path(&self) -> Option<&Path> {
        match self {
            Commands::Rank { config, .. } | Commands::Audit { config, .. } => config.as_deref(),
        }
    }
}

/// CLI handler
pub struct CliHandler {
    engine: StrengthEngine,
    cache: Arc<EngineCache>,
}

impl CliHandler {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let cache = Arc::new(EngineCache::new());
        let engine = StrengthEngine::new(config)
            .context("Invalid engine configuration")?
            .with_cache(cache.clone());
        Ok(Self { engine, cache })
    }

    /// Load configuration for a command
    pub fn load(command: &Commands) -> Result<EngineConfig> {
        load_config(command.config_path())
    }

    /// Run a command and return its JSON output
    pub async fn execute(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Rank { snapshot, cohort, .. } => {
                let inputs = self.load_snapshot(&snapshot).await?;
                let cohorts = match cohort {
                    Some(cohort) => vec![cohort],
                    None => CohortKind::ALL.to_vec(),
                };
                let output = self.engine.run_cycle(inputs, &cohorts).context("Cycle failed")?;
                serde_json::to_string_pretty(&output).context("Failed to serialize rankings")
            }
            Commands::Audit { snapshot, .. } => {
                let inputs = self.load_snapshot(&snapshot).await?;
                let report = self.engine.audit(inputs).context("Audit failed")?;
                serde_json::to_string_pretty(&report).context("Failed to serialize audit report")
            }
        }
    }

    async fn load_snapshot(&self, dir: &Path) -> Result<crate::engine::CycleInputs> {
        let inputs = SnapshotLoader::new(dir)
            .with_cache(self.cache.clone())
            .load()
            .await
            .with_context(|| format!("Failed to load snapshot {dir:?}"))?;
        let stats = self.cache.stats();
        info!("Payload cache holds {} payloads", stats.payloads);
        Ok(inputs)
    }
}
