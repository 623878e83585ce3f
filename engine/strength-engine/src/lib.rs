//! # Strength Engine
//!
//! Scores and ranks a dynasty fantasy league once per cycle. Source payloads
//! are ingested and resolved into one canonical identity space by
//! `player-registry`; this crate freezes that space, computes per-cohort
//! component scores relative to the cohort maximum, and publishes versioned,
//! deterministically ordered rankings for fantasy teams, prospects and the
//! MVP race.

pub mod aggregator;
pub mod calculator;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod player_components;
pub mod snapshot;
pub mod team_components;

#[cfg(test)]
mod integration_tests;

pub use aggregator::CompositeAggregator;
pub use calculator::{relative_scores, score_cohort, ComponentCalculator};
pub use config::{load_config, EngineConfig, HistoryConfig, LoggingConfig, ScoringTables, WeightTable};
pub use engine::{CycleInputs, ResolvedCycle, StrengthEngine};
pub use error::{EngineError, Result};
pub use logging::initialize_logging;
pub use models::{
    AuditReport, CohortKind, CohortRanking, Component, ComponentContribution, ComponentValue,
    CompositeScore, CycleOutput, OrphanedPlayer, RankedEntry, ScoreComponents,
};
pub use snapshot::SnapshotLoader;

/// Re-export commonly used types
pub use player_registry::{CanonicalId, Diagnostic, EngineCache};
pub use source_records::{IngestSource, SourceFailure};

/// Current version of the strength engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
