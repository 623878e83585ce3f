use crate::error::{RegistryError, Result};
use crate::teams::TeamDirectory;
use crate::types::{CanonicalId, CanonicalPlayer, CanonicalTeam, TeamId, TeamSheet};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Canonical entity store for one cycle
///
/// Written only by the identity resolver, then frozen into a
/// `RegistrySnapshot` for scoring.
#[derive(Debug, Clone)]
pub struct PlayerRegistry {
    players: BTreeMap<CanonicalId, CanonicalPlayer>,

    /// Normalized-name key to every canonical player carrying it
    by_key: HashMap<String, BTreeSet<CanonicalId>>,

    /// Platform-native ID to canonical ID
    by_native_id: HashMap<String, CanonicalId>,

    directory: TeamDirectory,

    team_sheets: BTreeMap<TeamId, TeamSheet>,
}

impl PlayerRegistry {
    /// Create an empty store over a team directory
    pub fn new(directory: TeamDirectory) -> Self {
        let team_sheets =
            directory.iter().map(|team| (team.team_id.clone(), TeamSheet::new(team.clone()))).collect();
        Self {
            players: BTreeMap::new(),
            by_key: HashMap::new(),
            by_native_id: HashMap::new(),
            directory,
            team_sheets,
        }
    }

    /// Insert a player or replace the one with the same canonical ID
    pub fn upsert(&mut self, player: CanonicalPlayer) {
        if let Some(previous) = self.players.remove(&player.canonical_id) {
            self.unindex(&previous);
        }
        self.index(&player);
        self.players.insert(player.canonical_id.clone(), player);
    }

    /// Move a player to a new canonical ID (generated ID promoted to a platform ID)
    pub fn rekey(&mut self, from: &CanonicalId, to: CanonicalId) -> Result<()> {
        if self.players.contains_key(&to) {
            return Err(RegistryError::CanonicalIdTaken(to.to_string()));
        }
        let mut player = self
            .players
            .remove(from)
            .ok_or_else(|| RegistryError::PlayerNotFound(from.to_string()))?;
        self.unindex(&player);
        debug!("Promoting canonical id {} to {}", from, to);
        player.canonical_id = to;
        self.index(&player);
        self.players.insert(player.canonical_id.clone(), player);
        Ok(())
    }

    /// Give a player its normalized-name key and index it under that key
    pub(crate) fn set_name_key(&mut self, id: &CanonicalId, name_key: &str) -> Result<()> {
        let mut player =
            self.players.remove(id).ok_or_else(|| RegistryError::PlayerNotFound(id.to_string()))?;
        self.unindex(&player);
        player.name_key = name_key.to_string();
        self.index(&player);
        self.players.insert(player.canonical_id.clone(), player);
        Ok(())
    }

    fn index(&mut self, player: &CanonicalPlayer) {
        if !player.name_key.is_empty() {
            self.by_key
                .entry(player.name_key.clone())
                .or_default()
                .insert(player.canonical_id.clone());
        }
        if let Some(native_id) = &player.native_id {
            self.by_native_id.insert(native_id.clone(), player.canonical_id.clone());
        }
    }

    fn unindex(&mut self, player: &CanonicalPlayer) {
        if let Some(ids) = self.by_key.get_mut(&player.name_key) {
            ids.remove(&player.canonical_id);
            if ids.is_empty() {
                self.by_key.remove(&player.name_key);
            }
        }
        if let Some(native_id) = &player.native_id {
            self.by_native_id.remove(native_id);
        }
    }

    pub fn lookup_by_id(&self, id: &CanonicalId) -> Result<&CanonicalPlayer> {
        self.players.get(id).ok_or_else(|| RegistryError::PlayerNotFound(id.to_string()))
    }

    /// Every canonical player carrying this normalized-name key, in ID order
    pub fn lookup_by_key(&self, key: &str) -> Vec<&CanonicalPlayer> {
        self.by_key
            .get(key)
            .map(|ids| ids.iter().filter_map(|id| self.players.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn lookup_by_native_id(&self, native_id: &str) -> Option<&CanonicalPlayer> {
        self.by_native_id.get(native_id).and_then(|id| self.players.get(id))
    }

    /// All players in canonical ID order
    pub fn all(&self) -> impl Iterator<Item = &CanonicalPlayer> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn team(&self, team_id: &TeamId) -> Result<&CanonicalTeam> {
        self.directory.get(team_id).ok_or_else(|| RegistryError::TeamNotFound(team_id.to_string()))
    }

    pub fn teams(&self) -> impl Iterator<Item = &CanonicalTeam> {
        self.directory.iter()
    }

    pub fn directory(&self) -> &TeamDirectory {
        &self.directory
    }

    /// Anchored players whose current team is `team_id`
    pub fn roster(&self, team_id: &TeamId) -> Vec<&CanonicalPlayer> {
        roster_of(&self.players, team_id)
    }

    pub fn team_sheet(&self, team_id: &TeamId) -> Option<&TeamSheet> {
        self.team_sheets.get(team_id)
    }

    pub(crate) fn player_mut(&mut self, id: &CanonicalId) -> Option<&mut CanonicalPlayer> {
        self.players.get_mut(id)
    }

    pub(crate) fn players_mut(&mut self) -> impl Iterator<Item = &mut CanonicalPlayer> {
        self.players.values_mut()
    }

    pub(crate) fn team_sheet_mut(&mut self, team_id: &TeamId) -> Option<&mut TeamSheet> {
        self.team_sheets.get_mut(team_id)
    }

    /// End the write phase
    pub fn freeze(self) -> RegistrySnapshot {
        RegistrySnapshot { players: self.players, team_sheets: self.team_sheets }
    }
}

fn roster_of<'a>(
    players: &'a BTreeMap<CanonicalId, CanonicalPlayer>,
    team_id: &TeamId,
) -> Vec<&'a CanonicalPlayer> {
    players.values().filter(|p| !p.orphaned && p.team_id() == Some(team_id)).collect()
}

/// Read-only view of a resolved cycle, consumed by scoring
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    players: BTreeMap<CanonicalId, CanonicalPlayer>,
    team_sheets: BTreeMap<TeamId, TeamSheet>,
}

impl RegistrySnapshot {
    pub fn player(&self, id: &CanonicalId) -> Option<&CanonicalPlayer> {
        self.players.get(id)
    }

    pub fn players(&self) -> impl Iterator<Item = &CanonicalPlayer> {
        self.players.values()
    }

    pub fn team_sheets(&self) -> impl Iterator<Item = &TeamSheet> {
        self.team_sheets.values()
    }

    pub fn team_sheet(&self, team_id: &TeamId) -> Option<&TeamSheet> {
        self.team_sheets.get(team_id)
    }

    pub fn roster(&self, team_id: &TeamId) -> Vec<&CanonicalPlayer> {
        roster_of(&self.players, team_id)
    }

    pub fn orphans(&self) -> impl Iterator<Item = &CanonicalPlayer> {
        self.players.values().filter(|p| p.orphaned)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn team_count(&self) -> usize {
        self.team_sheets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TeamAssignment, TeamRef};
    use source_records::{RecordKind, RecordRef, SourcePriority, TeamReferenceRow};

    fn directory() -> TeamDirectory {
        TeamDirectory::new(vec![TeamReferenceRow {
            team_id: "t1".to_string(),
            name: "Detroit Dynasty".to_string(),
            short_code: "DET".to_string(),
            logo: None,
            aliases: vec![],
        }])
        .unwrap()
    }

    fn player(id: &str, key: &str, native_id: Option<&str>) -> CanonicalPlayer {
        let mut player = CanonicalPlayer::new(
            CanonicalId::new(id),
            key.to_string(),
            key.to_string(),
            SourcePriority::ROSTER,
        );
        player.native_id = native_id.map(str::to_string);
        player
    }

    #[test]
    fn test_upsert_and_lookups() {
        let mut registry = PlayerRegistry::new(directory());
        registry.upsert(player("04a", "john smith", Some("04a")));
        registry.upsert(player("04b", "john smith", Some("04b")));
        registry.upsert(player("gen-1", "jane doe", None));

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.lookup_by_key("john smith").len(), 2);
        assert_eq!(registry.lookup_by_native_id("04b").unwrap().canonical_id.as_str(), "04b");
        assert!(registry.lookup_by_id(&CanonicalId::new("gen-1")).is_ok());
        assert_eq!(
            registry.lookup_by_id(&CanonicalId::new("missing")).unwrap_err(),
            RegistryError::PlayerNotFound("missing".to_string())
        );
        let ids: Vec<&str> = registry.all().map(|p| p.canonical_id.as_str()).collect();
        assert_eq!(ids, vec!["04a", "04b", "gen-1"]);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut registry = PlayerRegistry::new(directory());
        registry.upsert(player("gen-1", "jane doe", None));
        let mut updated = player("gen-1", "jane doe", None);
        updated.positions.insert("SS".to_string());
        registry.upsert(updated);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup_by_key("jane doe").len(), 1);
        assert!(registry.lookup_by_id(&CanonicalId::new("gen-1")).unwrap().positions.contains("SS"));
    }

    #[test]
    fn test_rekey_moves_indexes() {
        let mut registry = PlayerRegistry::new(directory());
        registry.upsert(player("gen-1", "jane doe", None));
        registry.rekey(&CanonicalId::new("gen-1"), CanonicalId::new("04z")).unwrap();

        assert!(registry.lookup_by_id(&CanonicalId::new("gen-1")).is_err());
        assert_eq!(registry.lookup_by_key("jane doe")[0].canonical_id.as_str(), "04z");

        registry.upsert(player("gen-2", "john smith", None));
        assert_eq!(
            registry.rekey(&CanonicalId::new("gen-2"), CanonicalId::new("04z")).unwrap_err(),
            RegistryError::CanonicalIdTaken("04z".to_string())
        );
    }

    #[test]
    fn test_roster_skips_orphans() {
        let mut registry = PlayerRegistry::new(directory());
        let team = TeamId::new("t1");
        let assignment = TeamAssignment {
            team: TeamRef::Known(team.clone()),
            priority: SourcePriority::ROSTER,
            source: RecordRef { source: "rosters".to_string(), kind: RecordKind::RosterEntry, line: 0 },
        };

        let mut rostered = player("04a", "john smith", Some("04a"));
        rostered.current_team = Some(assignment.clone());
        let mut orphan = player("04b", "jane doe", Some("04b"));
        orphan.current_team = Some(assignment);
        orphan.orphaned = true;
        registry.upsert(rostered);
        registry.upsert(orphan);

        assert_eq!(registry.roster(&team).len(), 1);
        assert_eq!(registry.team(&team).unwrap().short_code, "DET");

        let snapshot = registry.freeze();
        assert_eq!(snapshot.roster(&team).len(), 1);
        assert_eq!(snapshot.orphans().count(), 1);
        assert_eq!(snapshot.team_count(), 1);
        assert!(snapshot.team_sheet(&team).is_some());
    }
}
