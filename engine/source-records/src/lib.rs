//! Source Records - typed inputs for the dynasty strength engine
//!
//! Every source the engine reads (platform rosters, player directory and
//! standings, the prospect and MVP lists, historical season tables, playoff
//! finishes and the static team reference table) is parsed here into explicit
//! payload types and converted into immutable `SourceRecord`s. Anything that
//! does not fit its declared shape is rejected at this boundary with a typed
//! `DataSourceError`.

pub mod error;
pub mod ingest;
pub mod payload;
pub mod record;

pub use error::{DataSourceError, Result};
pub use ingest::{
    ingest_all, parse_team_reference, IngestReport, IngestSource, SourceFailure, SourcePayload,
};
pub use payload::TeamReferenceRow;
pub use record::{
    AttributeKey, AttributeValue, RecordKind, RecordRef, SourcePriority, SourceRecord, Subject,
};
