use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors raised by the canonical entity store and the team directory
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Team reference table is empty")]
    EmptyTeamDirectory,

    #[error("Duplicate team id '{0}' in team reference table")]
    DuplicateTeam(String),

    #[error("Canonical player '{0}' not found in registry")]
    PlayerNotFound(String),

    #[error("Team '{0}' not found in registry")]
    TeamNotFound(String),

    #[error("Canonical id '{0}' is already taken")]
    CanonicalIdTaken(String),
}
