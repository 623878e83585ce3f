use crate::models::{CohortKind, Component};
use player_registry::RegistryError;
use source_records::{DataSourceError, SourceFailure};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that abort a cycle before anything is published
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid weight table '{version}': {reason}")]
    InvalidWeights { version: String, reason: String },

    #[error("Component {component} cannot score the {cohort} cohort")]
    UnsupportedComponent { cohort: CohortKind, component: Component },

    #[error("Team reference table unavailable: {0}")]
    MissingTeamReference(String),

    #[error("Every source failed this cycle ({} attempted)", .failures.len())]
    AllSourcesFailed { failures: Vec<SourceFailure> },

    #[error("Snapshot directory {path}: {error}")]
    Snapshot {
        path: String,
        #[source]
        error: std::io::Error,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    DataSource(#[from] DataSourceError),
}

impl EngineError {
    pub fn invalid_weights(version: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::InvalidWeights { version: version.into(), reason: reason.into() }
    }
}
