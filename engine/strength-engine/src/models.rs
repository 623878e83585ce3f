use player_registry::{CanonicalId, Diagnostic};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use source_records::SourceFailure;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A score component, team or player
///
/// Serialized by name so it can key TOML and JSON maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Component {
    Power,
    Prospects,
    History,
    Playoff,
    ProspectScore,
    FantasyPoints,
    PointsPerGame,
    Salary,
    Age,
    Contract,
    PositionScarcity,
}

impl Component {
    pub const ALL: [Component; 11] = [
        Component::Power,
        Component::Prospects,
        Component::History,
        Component::Playoff,
        Component::ProspectScore,
        Component::FantasyPoints,
        Component::PointsPerGame,
        Component::Salary,
        Component::Age,
        Component::Contract,
        Component::PositionScarcity,
    ];

    pub const TEAM: [Component; 4] =
        [Component::Power, Component::Prospects, Component::History, Component::Playoff];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Power => "power",
            Component::Prospects => "prospects",
            Component::History => "history",
            Component::Playoff => "playoff",
            Component::ProspectScore => "prospect_score",
            Component::FantasyPoints => "fantasy_points",
            Component::PointsPerGame => "points_per_game",
            Component::Salary => "salary",
            Component::Age => "age",
            Component::Contract => "contract",
            Component::PositionScarcity => "position_scarcity",
        }
    }

    pub fn is_team_component(&self) -> bool {
        Self::TEAM.contains(self)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Component {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Component::ALL
            .into_iter()
            .find(|c| c.as_str() == name)
            .ok_or_else(|| format!("unknown score component '{name}'"))
    }
}

impl TryFrom<String> for Component {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl From<Component> for String {
    fn from(component: Component) -> Self {
        component.as_str().to_string()
    }
}

/// Which cohort a ranking covers
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum CohortKind {
    Teams,
    Prospects,
    Mvp,
}

impl CohortKind {
    pub const ALL: [CohortKind; 3] = [CohortKind::Teams, CohortKind::Prospects, CohortKind::Mvp];
}

impl fmt::Display for CohortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CohortKind::Teams => write!(f, "teams"),
            CohortKind::Prospects => write!(f, "prospects"),
            CohortKind::Mvp => write!(f, "mvp"),
        }
    }
}

/// One component score for one entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentValue {
    /// Percentage of the cohort maximum, in [0, 100]
    pub value: f64,
    pub raw: Option<f64>,
    /// No contributing data; `value` is 0
    pub missing: bool,
}

impl ComponentValue {
    pub fn missing() -> Self {
        Self { value: 0.0, raw: None, missing: true }
    }
}

/// Every component score for one entity within its cohort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub entity_id: String,
    pub values: BTreeMap<Component, ComponentValue>,
}

impl ScoreComponents {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self { entity_id: entity_id.into(), values: BTreeMap::new() }
    }

    pub fn with(mut self, component: Component, value: ComponentValue) -> Self {
        self.values.insert(component, value);
        self
    }

    pub fn value(&self, component: Component) -> f64 {
        self.values.get(&component).map(|v| v.value).unwrap_or(0.0)
    }

    /// Components with no contributing data
    pub fn missing(&self) -> Vec<Component> {
        self.values.iter().filter(|(_, v)| v.missing).map(|(c, _)| *c).collect()
    }
}

/// One line of a composite breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentContribution {
    pub component: Component,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub weight: Decimal,
    /// `weight * value`, rounded half-to-even to one decimal
    #[serde(with = "rust_decimal::serde::float")]
    pub contribution: Decimal,
    pub missing: bool,
}

/// Weighted composite for one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompositeScore {
    pub entity_id: String,
    pub breakdown: Vec<ComponentContribution>,
    pub weight_version: String,
    /// Sum of the rounded contributions, clamped to [0, 100]
    #[serde(with = "rust_decimal::serde::float")]
    pub composite: Decimal,
    /// Unrounded weighted sum
    #[serde(with = "rust_decimal::serde::float")]
    pub exact: Decimal,
    pub rank: usize,
}

impl CompositeScore {
    pub fn component_value(&self, component: Component) -> Decimal {
        self.breakdown
            .iter()
            .find(|c| c.component == component)
            .map(|c| c.value)
            .unwrap_or(Decimal::ZERO)
    }
}

/// Published row of a cohort ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub canonical_id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    pub component_scores: Vec<ComponentContribution>,
    #[serde(with = "rust_decimal::serde::float")]
    pub composite_score: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub exact_score: Decimal,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_components: Vec<Component>,
}

/// Ranked result set for one cohort
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CohortRanking {
    pub cohort: CohortKind,
    pub weight_version: String,
    pub tie_break_component: Component,
    pub entries: Vec<RankedEntry>,
}

/// Everything one cycle publishes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleOutput {
    pub cohorts: Vec<CohortRanking>,
    pub diagnostics: Vec<Diagnostic>,
    pub unavailable_sources: Vec<SourceFailure>,
}

/// Player with no roster anchor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanedPlayer {
    pub canonical_id: CanonicalId,
    pub display_name: String,
    pub sources: Vec<String>,
}

/// Identity audit of one snapshot, without scoring
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    pub players: usize,
    pub teams: usize,
    pub records: usize,
    pub merged_by_id: usize,
    pub merged_by_name: usize,
    pub unresolved: usize,
    pub diagnostics: Vec<Diagnostic>,
    pub orphans: Vec<OrphanedPlayer>,
    pub unavailable_sources: Vec<SourceFailure>,
}

