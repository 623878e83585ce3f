use crate::error::{RegistryError, Result};
use crate::normalize::normalize;
use crate::types::{CanonicalTeam, TeamId};
use source_records::{SourceRecord, TeamReferenceRow};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// The static fantasy team reference table with its lookup indexes
///
/// Resolution order is platform team ID, then short code, then normalized
/// name or alias.
#[derive(Debug, Clone)]
pub struct TeamDirectory {
    teams: BTreeMap<TeamId, CanonicalTeam>,
    by_short_code: HashMap<String, TeamId>,
    by_name: HashMap<String, TeamId>,
}

impl TeamDirectory {
    pub fn new(rows: Vec<TeamReferenceRow>) -> Result<Self> {
        if rows.is_empty() {
            return Err(RegistryError::EmptyTeamDirectory);
        }

        let mut teams = BTreeMap::new();
        for row in rows {
            let team_id = TeamId::new(row.team_id.trim());
            let team = CanonicalTeam {
                team_id: team_id.clone(),
                name: row.name,
                short_code: row.short_code,
                logo: row.logo,
                aliases: row.aliases,
            };
            if teams.insert(team_id.clone(), team).is_some() {
                return Err(RegistryError::DuplicateTeam(team_id.to_string()));
            }
        }

        // Built in team-id order so a clash always resolves to the same team
        let mut by_short_code = HashMap::new();
        let mut by_name = HashMap::new();
        for (team_id, team) in &teams {
            by_short_code.entry(team.short_code.trim().to_lowercase()).or_insert(team_id.clone());
            for label in std::iter::once(&team.name).chain(team.aliases.iter()) {
                let key = normalize(label);
                if !key.is_empty() {
                    by_name.entry(key).or_insert(team_id.clone());
                }
            }
        }

        Ok(Self { teams, by_short_code, by_name })
    }

    /// Resolve a free-text team label
    pub fn resolve(&self, label: &str) -> Option<&TeamId> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Some((team_id, _)) = self.teams.get_key_value(&TeamId::new(trimmed)) {
            return Some(team_id);
        }
        if let Some(team_id) = self.by_short_code.get(&trimmed.to_lowercase()) {
            return Some(team_id);
        }
        let resolved = self.by_name.get(&normalize(trimmed));
        if resolved.is_none() {
            debug!("Team label '{}' not found in directory", trimmed);
        }
        resolved
    }

    /// Resolve a team-subject record: native ID, then its team label, then its name
    pub fn resolve_record(&self, record: &SourceRecord) -> Option<&TeamId> {
        record
            .native_id
            .as_deref()
            .and_then(|id| self.resolve(id))
            .or_else(|| record.team_label.as_deref().and_then(|label| self.resolve(label)))
            .or_else(|| self.resolve(&record.raw_name))
    }

    pub fn get(&self, team_id: &TeamId) -> Option<&CanonicalTeam> {
        self.teams.get(team_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanonicalTeam> {
        self.teams.values()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use source_records::RecordKind;

    fn row(team_id: &str, name: &str, short_code: &str, aliases: &[&str]) -> TeamReferenceRow {
        TeamReferenceRow {
            team_id: team_id.to_string(),
            name: name.to_string(),
            short_code: short_code.to_string(),
            logo: None,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn directory() -> TeamDirectory {
        TeamDirectory::new(vec![
            row("t1", "Saint Louis Cardinals", "STL", &["St. Louis Cardinals"]),
            row("t2", "Athletics", "ATH", &["Oakland Athletics"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolution_order() {
        let teams = directory();
        assert_eq!(teams.resolve("t1"), Some(&TeamId::new("t1")));
        assert_eq!(teams.resolve("stl"), Some(&TeamId::new("t1")));
        assert_eq!(teams.resolve("St. Louis Cardinals"), Some(&TeamId::new("t1")));
        assert_eq!(teams.resolve("OAKLAND ATHLETICS"), Some(&TeamId::new("t2")));
        assert_eq!(teams.resolve("Montreal Expos"), None);
        assert_eq!(teams.resolve("  "), None);
    }

    #[test]
    fn test_resolve_record_prefers_native_id() {
        let teams = directory();
        let record = SourceRecord::new("standings", RecordKind::StandingsRow, "Athletics", 0)
            .with_native_id(Some("t1".to_string()));
        assert_eq!(teams.resolve_record(&record), Some(&TeamId::new("t1")));

        let by_name = SourceRecord::new("2024.csv", RecordKind::HistoricalRow, "Athletics", 0);
        assert_eq!(teams.resolve_record(&by_name), Some(&TeamId::new("t2")));
    }

    #[test]
    fn test_rejects_empty_and_duplicate_tables() {
        assert_eq!(TeamDirectory::new(vec![]).unwrap_err(), RegistryError::EmptyTeamDirectory);
        let duplicate = TeamDirectory::new(vec![
            row("t1", "A", "A", &[]),
            row("t1", "B", "B", &[]),
        ]);
        assert_eq!(duplicate.unwrap_err(), RegistryError::DuplicateTeam("t1".to_string()));
    }
}
