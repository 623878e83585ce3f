//! Player Registry - canonical identity space for players and teams
//!
//! Normalizes names, resolves source records from every dataset into one
//! canonical player or team, and holds the merged result for scoring.

pub mod cache;
pub mod error;
pub mod hashing;
pub mod normalize;
pub mod registry;
pub mod resolver;
pub mod teams;
pub mod types;

pub use cache::{CacheStats, EngineCache};
pub use error::{RegistryError, Result};
pub use normalize::normalize;
pub use registry::{PlayerRegistry, RegistrySnapshot};
pub use resolver::{IdentityResolver, Resolution, ResolutionStats};
pub use teams::TeamDirectory;
pub use types::{
    CanonicalId, CanonicalPlayer, CanonicalTeam, Diagnostic, MergedAttribute, TeamAssignment,
    TeamId, TeamRef, TeamSheet, UnresolvedReason,
};
