//! Ingestion boundary: typed payloads in, `SourceRecord`s out.

use crate::error::{DataSourceError, Result};
use crate::payload::*;
use crate::record::{
    clean_platform_id, parse_positions, AttributeKey, RecordKind, SourcePriority, SourceRecord,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Read;
use tracing::{info, warn};

/// A parsed payload, one variant per source kind
#[derive(Debug, Clone)]
pub enum SourcePayload {
    Rosters(RosterPayload),
    PlayerDirectory(PlayerDirectory),
    Standings(Vec<StandingsEntry>),
    Prospects(Vec<ProspectRow>),
    MvpList(Vec<MvpRow>),
    History { season: String, rows: Vec<HistoryRow> },
    PlayoffFinishes(Vec<PlayoffRow>),
}

/// A named payload ready for conversion
#[derive(Debug, Clone)]
pub struct IngestSource {
    pub name: String,
    pub payload: SourcePayload,
    /// Overrides the kind's default priority when set
    pub priority: Option<SourcePriority>,
}

/// A source that could not be ingested this cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub reason: String,
}

/// Records from every source that ingested, plus the ones that did not
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub records: Vec<SourceRecord>,
    pub failures: Vec<SourceFailure>,
    pub ingested_sources: Vec<String>,
}

impl IngestReport {
    /// True when at least one source failed
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl IngestSource {
    pub fn new(name: impl Into<String>, payload: SourcePayload) -> Self {
        Self { name: name.into(), payload, priority: None }
    }

    pub fn with_priority(mut self, priority: SourcePriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn rosters_from_json(name: impl Into<String>, json: &str) -> Result<Self> {
        let name = name.into();
        let payload = parse_json(&name, json)?;
        Ok(Self::new(name, SourcePayload::Rosters(payload)))
    }

    pub fn player_directory_from_json(name: impl Into<String>, json: &str) -> Result<Self> {
        let name = name.into();
        let payload = parse_json(&name, json)?;
        Ok(Self::new(name, SourcePayload::PlayerDirectory(payload)))
    }

    pub fn standings_from_json(name: impl Into<String>, json: &str) -> Result<Self> {
        let name = name.into();
        let payload = parse_json(&name, json)?;
        Ok(Self::new(name, SourcePayload::Standings(payload)))
    }

    pub fn prospects_from_csv<R: Read>(name: impl Into<String>, reader: R) -> Result<Self> {
        let name = name.into();
        let rows = read_csv_rows(&name, reader)?;
        Ok(Self::new(name, SourcePayload::Prospects(rows)))
    }

    pub fn mvp_from_csv<R: Read>(name: impl Into<String>, reader: R) -> Result<Self> {
        let name = name.into();
        let rows = read_csv_rows(&name, reader)?;
        Ok(Self::new(name, SourcePayload::MvpList(rows)))
    }

    pub fn history_from_csv<R: Read>(
        name: impl Into<String>,
        season: impl Into<String>,
        reader: R,
    ) -> Result<Self> {
        let name = name.into();
        let rows = read_csv_rows(&name, reader)?;
        Ok(Self::new(name, SourcePayload::History { season: season.into(), rows }))
    }

    pub fn playoffs_from_csv<R: Read>(name: impl Into<String>, reader: R) -> Result<Self> {
        let name = name.into();
        let rows = read_csv_rows(&name, reader)?;
        Ok(Self::new(name, SourcePayload::PlayoffFinishes(rows)))
    }

    /// Validate the payload and convert every row into a record
    pub fn into_records(self) -> Result<Vec<SourceRecord>> {
        let name = self.name;
        let mut records = match self.payload {
            SourcePayload::Rosters(payload) => roster_records(&name, payload),
            SourcePayload::PlayerDirectory(directory) => directory_records(&name, directory),
            SourcePayload::Standings(rows) => standings_records(&name, rows),
            SourcePayload::Prospects(rows) => prospect_records(&name, rows)?,
            SourcePayload::MvpList(rows) => mvp_records(&name, rows)?,
            SourcePayload::History { season, rows } => history_records(&name, &season, rows)?,
            SourcePayload::PlayoffFinishes(rows) => playoff_records(&name, rows)?,
        };

        if records.is_empty() {
            return Err(DataSourceError::Empty { source_name: name });
        }
        if let Some(priority) = self.priority {
            for record in &mut records {
                record.priority = priority;
            }
        }
        Ok(records)
    }
}

/// Ingest every source that arrived; failed ones become partial-availability entries.
///
/// `Err` items are failures reported by the fetching collaborator itself.
pub fn ingest_all<I>(sources: I) -> IngestReport
where
    I: IntoIterator<Item = Result<IngestSource>>,
{
    let mut report = IngestReport::default();

    for source in sources {
        let outcome = source.and_then(|source| {
            let name = source.name.clone();
            source.into_records().map(|records| (name, records))
        });

        match outcome {
            Ok((name, records)) => {
                info!("Ingested {} records from {}", records.len(), name);
                report.records.extend(records);
                report.ingested_sources.push(name);
            }
            Err(e) => {
                warn!("Source {} unavailable this cycle: {}", e.source_name(), e);
                report.failures.push(SourceFailure {
                    source: e.source_name().to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    report
}

/// Parse and validate the static team reference table
pub fn parse_team_reference(name: &str, json: &str) -> Result<Vec<TeamReferenceRow>> {
    let rows: Vec<TeamReferenceRow> = parse_json(name, json)?;
    if rows.is_empty() {
        return Err(DataSourceError::Empty { source_name: name.to_string() });
    }

    let mut seen = std::collections::BTreeSet::new();
    for (line, row) in rows.iter().enumerate() {
        if row.team_id.trim().is_empty() {
            return Err(DataSourceError::MissingField {
                source_name: name.to_string(),
                line,
                field: "team_id",
            });
        }
        if !seen.insert(row.team_id.clone()) {
            return Err(DataSourceError::DuplicateTeam {
                source_name: name.to_string(),
                team_id: row.team_id.clone(),
            });
        }
    }
    Ok(rows)
}

fn parse_json<T: DeserializeOwned>(name: &str, json: &str) -> Result<T> {
    serde_json::from_str(json)
        .map_err(|error| DataSourceError::Json { source_name: name.to_string(), error })
}

fn read_csv_rows<T: DeserializeOwned, R: Read>(name: &str, reader: R) -> Result<Vec<T>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for row in csv_reader.deserialize() {
        let row: T = row.map_err(|e| DataSourceError::Csv {
            source_name: name.to_string(),
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Blank, "NA" and "-" cells count as missing
fn parse_number(
    source_name: &str,
    line: usize,
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<f64>> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(None);
    };
    if raw.is_empty() || raw == "-" || raw.eq_ignore_ascii_case("na") {
        return Ok(None);
    }
    let cleaned = raw.trim_start_matches('$').replace(',', "");
    cleaned.parse::<f64>().map(Some).map_err(|_| DataSourceError::InvalidField {
        source_name: source_name.to_string(),
        line,
        field,
        value: raw.to_string(),
    })
}

/// Win% shows up as "0.550", ".550" or "55.0%"
fn parse_win_pct(source_name: &str, line: usize, raw: Option<&str>) -> Result<Option<f64>> {
    match raw.map(str::trim) {
        Some(text) if text.ends_with('%') => {
            let value = parse_number(source_name, line, "Win%", Some(text.trim_end_matches('%')))?;
            Ok(value.map(|v| v / 100.0))
        }
        other => parse_number(source_name, line, "Win%", other),
    }
}

fn roster_records(name: &str, payload: RosterPayload) -> Vec<SourceRecord> {
    let mut records = Vec::new();
    let mut line = 0;
    for (team_id, roster) in payload.rosters {
        for item in roster.roster_items {
            let native_id = clean_platform_id(&item.id);
            if native_id.is_none() {
                warn!("{}: roster item on team {} has a blank id", name, roster.team_name);
            }
            let record = SourceRecord::new(
                name,
                RecordKind::RosterEntry,
                item.name.unwrap_or_default(),
                line,
            )
            .with_native_id(native_id)
            .with_positions(parse_positions(item.position.as_deref()))
            .with_team_label(Some(team_id.clone()))
            .with_number(AttributeKey::new("salary"), item.salary)
            .with_text(AttributeKey::new("roster_status"), item.status.map(normalize_status));
            records.push(record);
            line += 1;
        }
    }
    records
}

/// The platform reports minor-league slots as "NA"
fn normalize_status(status: String) -> String {
    if status.trim().eq_ignore_ascii_case("na") {
        "Minors".to_string()
    } else {
        status
    }
}

fn directory_records(name: &str, directory: PlayerDirectory) -> Vec<SourceRecord> {
    directory
        .into_iter()
        .enumerate()
        .map(|(line, (player_id, entry))| {
            SourceRecord::new(name, RecordKind::PlayerDirectory, entry.name, line)
                .with_native_id(clean_platform_id(&player_id))
                .with_positions(parse_positions(entry.position.as_deref()))
                .with_pro_team(entry.team)
        })
        .collect()
}

fn standings_records(name: &str, rows: Vec<StandingsEntry>) -> Vec<SourceRecord> {
    rows.into_iter()
        .enumerate()
        .map(|(line, row)| {
            SourceRecord::new(name, RecordKind::StandingsRow, row.team_name, line)
                .with_native_id(Some(row.team_id.trim().to_string()))
                .with_team_label(Some(row.team_id))
                .with_number(AttributeKey::new("wins"), Some(row.wins as f64))
                .with_number(AttributeKey::new("losses"), Some(row.losses as f64))
                .with_number(AttributeKey::new("ties"), Some(row.ties as f64))
                .with_number(AttributeKey::new("points_for"), row.points_for)
                .with_number(AttributeKey::new("points_against"), row.points_against)
                .with_number(AttributeKey::new("weeks_played"), row.weeks_played)
                .with_number(AttributeKey::new("recent_wins"), row.recent_wins)
                .with_number(AttributeKey::new("recent_losses"), row.recent_losses)
        })
        .collect()
}

fn prospect_records(name: &str, rows: Vec<ProspectRow>) -> Result<Vec<SourceRecord>> {
    rows.into_iter()
        .enumerate()
        .map(|(line, row)| {
            let score = parse_number(name, line, "Score", row.score.as_deref())?;
            let rank = parse_number(name, line, "Rank", row.rank.as_deref())?;
            Ok(SourceRecord::new(name, RecordKind::ProspectRow, row.name, line)
                .with_positions(parse_positions(row.position.as_deref()))
                .with_pro_team(row.mlb_team)
                .with_number(AttributeKey::new("prospect_score"), score)
                .with_number(AttributeKey::new("prospect_rank"), rank)
                .with_text(AttributeKey::new("as_of"), row.date))
        })
        .collect()
}

fn mvp_records(name: &str, rows: Vec<MvpRow>) -> Result<Vec<SourceRecord>> {
    rows.into_iter()
        .enumerate()
        .map(|(line, row)| {
            let age = parse_number(name, line, "Age", row.age.as_deref())?;
            let salary = parse_number(name, line, "Salary", row.salary.as_deref())?;
            let fpts = parse_number(name, line, "FPts", row.fantasy_points.as_deref())?;
            let fppg = parse_number(name, line, "FP/G", row.points_per_game.as_deref())?;
            Ok(SourceRecord::new(name, RecordKind::MvpRow, row.player, line)
                .with_native_id(row.id.as_deref().and_then(clean_platform_id))
                .with_positions(parse_positions(row.position.as_deref()))
                .with_team_label(row.team)
                .with_number(AttributeKey::new("age"), age)
                .with_number(AttributeKey::new("salary"), salary)
                .with_number(AttributeKey::new("fantasy_points"), fpts)
                .with_number(AttributeKey::new("points_per_game"), fppg)
                .with_text(AttributeKey::new("contract"), row.contract))
        })
        .collect()
}

fn history_records(name: &str, season: &str, rows: Vec<HistoryRow>) -> Result<Vec<SourceRecord>> {
    rows.into_iter()
        .enumerate()
        .map(|(line, row)| {
            let rank = parse_number(name, line, "Rk", Some(row.rank.as_str()))?.ok_or(
                DataSourceError::MissingField { source_name: name.to_string(), line, field: "Rk" },
            )?;
            let wins = parse_number(name, line, "W", row.wins.as_deref())?;
            let losses = parse_number(name, line, "L", row.losses.as_deref())?;
            let win_pct = parse_win_pct(name, line, row.win_pct.as_deref())?;
            let fpts = parse_number(name, line, "FPts", row.fantasy_points.as_deref())?;
            Ok(SourceRecord::new(name, RecordKind::HistoricalRow, row.team.clone(), line)
                .with_team_label(Some(row.team))
                .with_number(AttributeKey::for_period("rank", season), Some(rank))
                .with_number(AttributeKey::for_period("wins", season), wins)
                .with_number(AttributeKey::for_period("losses", season), losses)
                .with_number(AttributeKey::for_period("win_pct", season), win_pct)
                .with_number(AttributeKey::for_period("fantasy_points", season), fpts))
        })
        .collect()
}

fn playoff_records(name: &str, rows: Vec<PlayoffRow>) -> Result<Vec<SourceRecord>> {
    rows.into_iter()
        .enumerate()
        .map(|(line, row)| {
            let season = row.season.trim().to_string();
            if season.is_empty() {
                return Err(DataSourceError::MissingField {
                    source_name: name.to_string(),
                    line,
                    field: "Season",
                });
            }
            let place = row.place.trim().to_lowercase();
            Ok(SourceRecord::new(name, RecordKind::PlayoffFinish, row.team.clone(), line)
                .with_team_label(Some(row.team))
                .with_text(AttributeKey::for_period("playoff_finish", season), Some(place)))
        })
        .collect()
}
