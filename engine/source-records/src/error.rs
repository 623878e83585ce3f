//! Error types for source ingestion

use thiserror::Error;

/// Result type for ingestion operations
pub type Result<T> = std::result::Result<T, DataSourceError>;

/// Errors raised while turning one source payload into records.
///
/// Any of these fails the whole source; other sources keep going.
#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("{source_name}: malformed JSON payload: {error}")]
    Json {
        source_name: String,
        #[source]
        error: serde_json::Error,
    },

    #[error("{source_name}: malformed CSV at line {line}: {message}")]
    Csv { source_name: String, line: u64, message: String },

    #[error("{source_name}: row {line} has invalid {field} value '{value}'")]
    InvalidField { source_name: String, line: usize, field: &'static str, value: String },

    #[error("{source_name}: row {line} is missing required field {field}")]
    MissingField { source_name: String, line: usize, field: &'static str },

    #[error("{source_name}: payload contains no rows")]
    Empty { source_name: String },

    #[error("{source_name}: duplicate team id {team_id} in reference table")]
    DuplicateTeam { source_name: String, team_id: String },

    #[error("{source_name}: source unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },
}

impl DataSourceError {
    /// Name of the source that failed
    pub fn source_name(&self) -> &str {
        match self {
            DataSourceError::Json { source_name, .. }
            | DataSourceError::Csv { source_name, .. }
            | DataSourceError::InvalidField { source_name, .. }
            | DataSourceError::MissingField { source_name, .. }
            | DataSourceError::Empty { source_name }
            | DataSourceError::DuplicateTeam { source_name, .. }
            | DataSourceError::Unavailable { source_name, .. } => source_name,
        }
    }

    pub fn unavailable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        DataSourceError::Unavailable { source_name: source_name.into(), reason: reason.into() }
    }
}
