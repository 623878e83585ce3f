//! Wire shapes of every source the engine accepts.
//!
//! Platform payloads arrive as JSON already fetched by the API client; the
//! supplementary datasets arrive as CSV files. Required fields are plain
//! fields, optional ones are `Option`s, so a payload missing a required field
//! fails to deserialize instead of leaking half-typed data inward.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Platform rosters keyed by fantasy team ID
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RosterPayload {
    pub rosters: BTreeMap<String, TeamRoster>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRoster {
    pub team_name: String,
    #[serde(default)]
    pub roster_items: Vec<RosterItem>,
}

/// One roster slot. The platform omits the name for some items; the player
/// directory fills it in by ID.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RosterItem {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub salary: Option<f64>,
}

/// Platform player directory keyed by platform player ID
pub type PlayerDirectory = BTreeMap<String, DirectoryEntry>;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    /// Real-world club
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

/// One line of the platform standings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsEntry {
    pub team_id: String,
    pub team_name: String,
    #[serde(deserialize_with = "lenient_count")]
    pub wins: u32,
    #[serde(deserialize_with = "lenient_count")]
    pub losses: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub ties: u32,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub points_for: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub points_against: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub weeks_played: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub recent_wins: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub recent_losses: Option<f64>,
}

/// Prospect list row. Numeric cells stay text until validation so a bad cell
/// can be reported with its row number.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProspectRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Position", default)]
    pub position: Option<String>,
    #[serde(rename = "MLB Team", default)]
    pub mlb_team: Option<String>,
    #[serde(rename = "Score", default)]
    pub score: Option<String>,
    #[serde(rename = "Rank", default)]
    pub rank: Option<String>,
    #[serde(rename = "Date", default)]
    pub date: Option<String>,
}

/// MVP list row
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MvpRow {
    #[serde(rename = "ID", default)]
    pub id: Option<String>,
    #[serde(rename = "Player")]
    pub player: String,
    #[serde(rename = "Position", default)]
    pub position: Option<String>,
    #[serde(rename = "Team", default)]
    pub team: Option<String>,
    #[serde(rename = "Age", default)]
    pub age: Option<String>,
    #[serde(rename = "Salary", default)]
    pub salary: Option<String>,
    #[serde(rename = "Contract", default)]
    pub contract: Option<String>,
    #[serde(rename = "FPts", default)]
    pub fantasy_points: Option<String>,
    #[serde(rename = "FP/G", default)]
    pub points_per_game: Option<String>,
}

/// One team's line in a past season's final table
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryRow {
    #[serde(rename = "Rk")]
    pub rank: String,
    #[serde(rename = "Team")]
    pub team: String,
    #[serde(rename = "W", default)]
    pub wins: Option<String>,
    #[serde(rename = "L", default)]
    pub losses: Option<String>,
    #[serde(rename = "Win%", default)]
    pub win_pct: Option<String>,
    #[serde(rename = "FPts", default)]
    pub fantasy_points: Option<String>,
}

/// One podium finish
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayoffRow {
    #[serde(rename = "Season")]
    pub season: String,
    #[serde(rename = "Place")]
    pub place: String,
    #[serde(rename = "Team")]
    pub team: String,
}

/// Static team reference entry
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TeamReferenceRow {
    pub team_id: String,
    pub name: String,
    pub short_code: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Accepts `12.5`, `"12.5"`, `"-"`, `""` or null; the platform mixes all of them
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed == "-" {
                Ok(None)
            } else {
                trimmed.parse::<f64>().map(Some).map_err(de::Error::custom)
            }
        }
    }
}

fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match lenient_f64(deserializer)? {
        None => Ok(0),
        Some(n) if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => {
            Ok(n as u32)
        }
        Some(n) => Err(de::Error::custom(format!("invalid count {n}"))),
    }
}
