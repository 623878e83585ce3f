use serde::{Deserialize, Serialize};
use source_records::{AttributeKey, AttributeValue, RecordRef, SourcePriority};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Stable canonical identifier: the platform ID when known, else generated
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalId(String);

impl CanonicalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical fantasy team identifier (the platform team ID)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(String);

impl TeamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fantasy team from the static reference table. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalTeam {
    pub team_id: TeamId,
    pub name: String,
    pub short_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Where a player's team label pointed
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRef {
    Known(TeamId),
    /// Label that matched nothing in the team directory
    Unlisted(String),
}

impl TeamRef {
    pub fn team_id(&self) -> Option<&TeamId> {
        match self {
            TeamRef::Known(id) => Some(id),
            TeamRef::Unlisted(_) => None,
        }
    }
}

/// Current team plus the record that set it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamAssignment {
    pub team: TeamRef,
    pub priority: SourcePriority,
    pub source: RecordRef,
}

/// A value that lost a priority conflict, kept only as provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupersededValue {
    pub value: AttributeValue,
    pub source: RecordRef,
    pub priority: SourcePriority,
}

/// Winning value for one attribute plus everything it beat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedAttribute {
    pub value: AttributeValue,
    pub source: RecordRef,
    pub priority: SourcePriority,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub superseded: Vec<SupersededValue>,
}

impl MergedAttribute {
    pub fn new(value: AttributeValue, source: RecordRef, priority: SourcePriority) -> Self {
        Self { value, source, priority, superseded: Vec::new() }
    }

    /// Strictly higher priority replaces the current value; otherwise the
    /// incoming value is kept as provenance when it differs.
    pub fn merge(&mut self, value: AttributeValue, source: RecordRef, priority: SourcePriority) {
        if priority > self.priority {
            let previous = std::mem::replace(
                self,
                MergedAttribute { value, source, priority, superseded: Vec::new() },
            );
            self.superseded = previous.superseded;
            self.superseded.push(SupersededValue {
                value: previous.value,
                source: previous.source,
                priority: previous.priority,
            });
        } else if value != self.value {
            self.superseded.push(SupersededValue { value, source, priority });
        }
    }
}

pub type MergedAttributes = BTreeMap<AttributeKey, MergedAttribute>;

pub(crate) fn merge_into(
    attributes: &mut MergedAttributes,
    key: AttributeKey,
    value: AttributeValue,
    source: &RecordRef,
    priority: SourcePriority,
) {
    match attributes.get_mut(&key) {
        Some(existing) => existing.merge(value, source.clone(), priority),
        None => {
            attributes.insert(key, MergedAttribute::new(value, source.clone(), priority));
        }
    }
}

fn lookup_number(attributes: &MergedAttributes, key: &AttributeKey) -> Option<f64> {
    attributes.get(key).and_then(|a| a.value.as_number())
}

/// One real-world player, merged across every source that mentions them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPlayer {
    pub canonical_id: CanonicalId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_id: Option<String>,
    /// Normalized-name key; empty only for ID-only records
    pub name_key: String,
    pub display_name: String,
    pub display_priority: SourcePriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_team: Option<TeamAssignment>,
    pub positions: BTreeSet<String>,
    /// Normalized real-world club labels
    pub pro_teams: BTreeSet<String>,
    pub attributes: MergedAttributes,
    pub sources: BTreeSet<RecordRef>,
    /// No roster record anchors this player to a fantasy team
    pub orphaned: bool,
}

impl CanonicalPlayer {
    pub fn new(
        canonical_id: CanonicalId,
        name_key: String,
        display_name: String,
        display_priority: SourcePriority,
    ) -> Self {
        Self {
            canonical_id,
            native_id: None,
            name_key,
            display_name,
            display_priority,
            current_team: None,
            positions: BTreeSet::new(),
            pro_teams: BTreeSet::new(),
            attributes: MergedAttributes::new(),
            sources: BTreeSet::new(),
            orphaned: false,
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        lookup_number(&self.attributes, &AttributeKey::new(name))
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.attributes.get(&AttributeKey::new(name)).and_then(|a| a.value.as_text())
    }

    pub fn team_id(&self) -> Option<&TeamId> {
        self.current_team.as_ref().and_then(|a| a.team.team_id())
    }

    /// True when at least one contributing record is a roster entry
    pub fn is_anchored(&self) -> bool {
        self.sources.iter().any(|r| r.kind.is_anchor())
    }
}

/// A canonical team plus every team-subject attribute merged onto it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSheet {
    pub team: CanonicalTeam,
    pub attributes: MergedAttributes,
    pub sources: BTreeSet<RecordRef>,
}

impl TeamSheet {
    pub fn new(team: CanonicalTeam) -> Self {
        Self { team, attributes: MergedAttributes::new(), sources: BTreeSet::new() }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        lookup_number(&self.attributes, &AttributeKey::new(name))
    }

    pub fn number_for(&self, name: &str, period: &str) -> Option<f64> {
        lookup_number(&self.attributes, &AttributeKey::for_period(name, period))
    }

    pub fn text_for(&self, name: &str, period: &str) -> Option<&str> {
        self.attributes
            .get(&AttributeKey::for_period(name, period))
            .and_then(|a| a.value.as_text())
    }
}

/// Why a record could not be placed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// Neither a strong ID nor a usable name key
    NoIdentity,
    /// Several canonical players fit equally well
    AmbiguousName { candidates: Vec<CanonicalId> },
    /// Team-subject record naming a team the directory does not know
    UnknownTeam,
}

/// Identity problems surfaced by a resolution pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Diagnostic {
    UnresolvedRecord { record: RecordRef, raw_name: String, reason: UnresolvedReason },
    /// Strong ID matched but the names disagree; the ID won
    IdentityConflict {
        canonical_id: CanonicalId,
        native_id: String,
        existing_name: String,
        incoming_name: String,
        record: RecordRef,
    },
    /// Player team label that is not in the team directory
    UnknownTeam { canonical_id: CanonicalId, label: String, record: RecordRef },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnresolvedRecord { record, raw_name, reason } => match reason {
                UnresolvedReason::NoIdentity => {
                    write!(f, "{record}: record has no usable identity")
                }
                UnresolvedReason::AmbiguousName { candidates } => {
                    let ids: Vec<&str> = candidates.iter().map(CanonicalId::as_str).collect();
                    write!(f, "{record}: '{raw_name}' matches {} equally", ids.join(", "))
                }
                UnresolvedReason::UnknownTeam => {
                    write!(f, "{record}: team '{raw_name}' not in team directory")
                }
            },
            Diagnostic::IdentityConflict {
                canonical_id,
                existing_name,
                incoming_name,
                record,
                ..
            } => write!(
                f,
                "{record}: id {canonical_id} is '{existing_name}' but record says '{incoming_name}'"
            ),
            Diagnostic::UnknownTeam { canonical_id, label, record } => {
                write!(f, "{record}: player {canonical_id} has unknown team '{label}'")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use source_records::RecordKind;

    fn reference(source: &str, kind: RecordKind, line: usize) -> RecordRef {
        RecordRef { source: source.to_string(), kind, line }
    }

    #[test]
    fn test_higher_priority_replaces_and_keeps_provenance() {
        let roster = reference("rosters", RecordKind::RosterEntry, 1);
        let mvp = reference("mvp.csv", RecordKind::MvpRow, 7);

        let mut attr =
            MergedAttribute::new(AttributeValue::Number(12.0), mvp.clone(), SourcePriority::MVP_LIST);
        attr.merge(AttributeValue::Number(15.0), roster.clone(), SourcePriority::ROSTER);

        assert_eq!(attr.value, AttributeValue::Number(15.0));
        assert_eq!(attr.source, roster);
        assert_eq!(attr.superseded.len(), 1);
        assert_eq!(attr.superseded[0].value, AttributeValue::Number(12.0));
        assert_eq!(attr.superseded[0].source, mvp);
    }

    #[test]
    fn test_lower_or_equal_priority_never_replaces() {
        let roster = reference("rosters", RecordKind::RosterEntry, 1);
        let mvp = reference("mvp.csv", RecordKind::MvpRow, 7);

        let mut attr =
            MergedAttribute::new(AttributeValue::Number(15.0), roster, SourcePriority::ROSTER);
        attr.merge(AttributeValue::Number(12.0), mvp.clone(), SourcePriority::MVP_LIST);
        attr.merge(AttributeValue::Number(15.0), mvp, SourcePriority::ROSTER);

        assert_eq!(attr.value, AttributeValue::Number(15.0));
        assert_eq!(attr.superseded.len(), 1);
    }

    #[test]
    fn test_diagnostic_serializes_with_type_tag() {
        let diagnostic = Diagnostic::UnresolvedRecord {
            record: reference("prospects.csv", RecordKind::ProspectRow, 4),
            raw_name: String::new(),
            reason: UnresolvedReason::NoIdentity,
        };
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["type"], "unresolved_record");
        assert_eq!(json["reason"]["kind"], "no_identity");
        assert!(diagnostic.to_string().contains("prospects.csv:4"));
    }
}
