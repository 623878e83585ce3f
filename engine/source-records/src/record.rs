use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Trust level of a source. Higher values win attribute conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourcePriority(pub u16);

impl SourcePriority {
    pub const ROSTER: Self = Self(100);
    pub const PLAYER_DIRECTORY: Self = Self(90);
    pub const STANDINGS: Self = Self(80);
    pub const MVP_LIST: Self = Self(60);
    pub const PROSPECT_LIST: Self = Self(50);
    pub const HISTORY: Self = Self(40);
    /// Below every source; held by a display name that is only an ID
    pub const UNNAMED: Self = Self(0);
}

impl fmt::Display for SourcePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// What a record talks about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Player,
    Team,
}

/// Shape of the row a record was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Platform roster slot (fantasy team assignment)
    RosterEntry,
    /// Platform player directory entry
    PlayerDirectory,
    /// Platform standings line for one team
    StandingsRow,
    /// MVP list row
    MvpRow,
    /// Prospect list row
    ProspectRow,
    /// One team's line in a past season's final table
    HistoricalRow,
    /// One podium finish in a past season
    PlayoffFinish,
}

impl RecordKind {
    pub fn subject(&self) -> Subject {
        match self {
            RecordKind::RosterEntry
            | RecordKind::PlayerDirectory
            | RecordKind::MvpRow
            | RecordKind::ProspectRow => Subject::Player,
            RecordKind::StandingsRow | RecordKind::HistoricalRow | RecordKind::PlayoffFinish => {
                Subject::Team
            }
        }
    }

    /// Roster entries are the only records that anchor a player to a fantasy team
    pub fn is_anchor(&self) -> bool {
        matches!(self, RecordKind::RosterEntry)
    }

    pub fn default_priority(&self) -> SourcePriority {
        match self {
            RecordKind::RosterEntry => SourcePriority::ROSTER,
            RecordKind::PlayerDirectory => SourcePriority::PLAYER_DIRECTORY,
            RecordKind::StandingsRow => SourcePriority::STANDINGS,
            RecordKind::MvpRow => SourcePriority::MVP_LIST,
            RecordKind::ProspectRow => SourcePriority::PROSPECT_LIST,
            RecordKind::HistoricalRow | RecordKind::PlayoffFinish => SourcePriority::HISTORY,
        }
    }
}

/// Attribute name plus an optional period (season, scoring period).
///
/// Serialized as `name` or `name@period` so it can key JSON maps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct AttributeKey {
    pub name: String,
    pub period: Option<String>,
}

impl AttributeKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), period: None }
    }

    pub fn for_period(name: impl Into<String>, period: impl Into<String>) -> Self {
        Self { name: name.into(), period: Some(period.into()) }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.period {
            Some(period) => write!(f, "{}@{}", self.name, period),
            None => write!(f, "{}", self.name),
        }
    }
}

impl From<AttributeKey> for String {
    fn from(key: AttributeKey) -> Self {
        key.to_string()
    }
}

impl From<String> for AttributeKey {
    fn from(raw: String) -> Self {
        match raw.split_once('@') {
            Some((name, period)) => AttributeKey::for_period(name, period),
            None => AttributeKey::new(raw),
        }
    }
}

/// Scalar attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
}

impl AttributeValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            AttributeValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            AttributeValue::Number(_) => None,
        }
    }

    /// Total order used to sort records deterministically (numbers before text)
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (AttributeValue::Number(a), AttributeValue::Number(b)) => a.total_cmp(b),
            (AttributeValue::Number(_), AttributeValue::Text(_)) => Ordering::Less,
            (AttributeValue::Text(_), AttributeValue::Number(_)) => Ordering::Greater,
            (AttributeValue::Text(a), AttributeValue::Text(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Number(n) => write!(f, "{n}"),
            AttributeValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Provenance pointer back to the row a record came from
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordRef {
    pub source: String,
    pub kind: RecordKind,
    pub line: usize,
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.line)
    }
}

/// One raw observation from one source, immutable once read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Name of the source (e.g. "platform-rosters", "prospects.csv")
    pub source: String,
    pub kind: RecordKind,
    /// Platform-native identifier, trusted without name comparison
    pub native_id: Option<String>,
    /// Name exactly as the source spelled it
    pub raw_name: String,
    /// Upper-cased position codes
    pub positions: Vec<String>,
    /// Fantasy team for player rows, the team itself for team rows
    pub team_label: Option<String>,
    /// Real-world club, used as an identity hint for players
    pub pro_team: Option<String>,
    pub attributes: BTreeMap<AttributeKey, AttributeValue>,
    pub priority: SourcePriority,
    /// Row or offset inside the source
    pub line: usize,
}

impl SourceRecord {
    /// Create a record with the kind's default priority and no attributes
    pub fn new(
        source: impl Into<String>,
        kind: RecordKind,
        raw_name: impl Into<String>,
        line: usize,
    ) -> Self {
        Self {
            source: source.into(),
            kind,
            native_id: None,
            raw_name: raw_name.into(),
            positions: Vec::new(),
            team_label: None,
            pro_team: None,
            attributes: BTreeMap::new(),
            priority: kind.default_priority(),
            line,
        }
    }

    pub fn with_native_id(mut self, native_id: Option<String>) -> Self {
        self.native_id = native_id.filter(|id| !id.is_empty());
        self
    }

    pub fn with_positions(mut self, positions: Vec<String>) -> Self {
        self.positions = positions;
        self
    }

    pub fn with_team_label(mut self, label: Option<String>) -> Self {
        self.team_label = non_blank(label);
        self
    }

    pub fn with_pro_team(mut self, pro_team: Option<String>) -> Self {
        self.pro_team = non_blank(pro_team);
        self
    }

    pub fn with_priority(mut self, priority: SourcePriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_number(mut self, key: AttributeKey, value: Option<f64>) -> Self {
        if let Some(value) = value.filter(|v| v.is_finite()) {
            self.attributes.insert(key, AttributeValue::Number(value));
        }
        self
    }

    pub fn with_text(mut self, key: AttributeKey, value: Option<String>) -> Self {
        if let Some(value) = non_blank(value) {
            self.attributes.insert(key, AttributeValue::Text(value));
        }
        self
    }

    pub fn subject(&self) -> Subject {
        self.kind.subject()
    }

    pub fn reference(&self) -> RecordRef {
        RecordRef { source: self.source.clone(), kind: self.kind, line: self.line }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.attributes.get(&AttributeKey::new(name)).and_then(AttributeValue::as_number)
    }
}

/// Split a position field such as "SS,2B" or "LF/RF" into upper-cased codes
pub fn parse_positions(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let mut positions: Vec<String> = raw
        .split([',', '/'])
        .map(|p| p.trim().to_uppercase())
        .filter(|p| !p.is_empty() && p != "N/A")
        .collect();
    positions.dedup();
    positions
}

/// Platform IDs are sometimes decorated with asterisks ("*04abc*")
pub fn clean_platform_id(raw: &str) -> Option<String> {
    let cleaned = raw.trim().trim_matches('*').trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
