//! Two-tier identity resolution
//!
//! Tier one trusts platform-native IDs outright. Tier two falls back to the
//! normalized-name key, accepting a candidate only when its position or team
//! hints are compatible with the record. Records are sorted before resolution
//! so the result does not depend on input order.

use crate::cache::EngineCache;
use crate::hashing::ConsistentHasher;
use crate::normalize::normalize;
use crate::registry::PlayerRegistry;
use crate::teams::TeamDirectory;
use crate::types::{
    merge_into, CanonicalId, CanonicalPlayer, Diagnostic, TeamAssignment, TeamRef,
    UnresolvedReason,
};
use source_records::{SourcePriority, SourceRecord, Subject};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Probe limit when a generated ID collides
const MAX_PROBES: u32 = 1000;

/// Outcome of comparing one identity hint dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintMatch {
    Match,
    Conflict,
    Unknown,
}

/// Counts for one resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub records: usize,
    pub merged_by_id: usize,
    pub merged_by_name: usize,
    pub created: usize,
    pub team_records: usize,
    pub unresolved: usize,
}

/// The populated store plus everything worth reporting about it
#[derive(Debug, Clone)]
pub struct Resolution {
    pub registry: PlayerRegistry,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: ResolutionStats,
}

/// A record with its name key computed once
struct KeyedRecord {
    record: SourceRecord,
    name_key: String,
    pro_team_key: Option<String>,
}

enum NameMatch {
    Found(CanonicalId),
    Ambiguous(Vec<CanonicalId>),
    None,
}

/// Merges source records into canonical players and team sheets
#[derive(Debug, Clone, Default)]
pub struct IdentityResolver {
    cache: Option<Arc<EngineCache>>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self { cache: None }
    }

    /// Memoize normalized names in a shared cache
    pub fn with_cache(cache: Arc<EngineCache>) -> Self {
        Self { cache: Some(cache) }
    }

    fn key_of(&self, raw: &str) -> String {
        match &self.cache {
            Some(cache) => cache.normalized(raw),
            None => normalize(raw),
        }
    }

    /// Resolve a full batch of records against a fresh store
    pub fn resolve(&self, directory: TeamDirectory, records: Vec<SourceRecord>) -> Resolution {
        let mut keyed: Vec<KeyedRecord> = records
            .into_iter()
            .map(|record| {
                let name_key = self.key_of(&record.raw_name);
                let pro_team_key = record
                    .pro_team
                    .as_deref()
                    .map(|t| self.key_of(t))
                    .filter(|k| !k.is_empty());
                KeyedRecord { record, name_key, pro_team_key }
            })
            .collect();
        keyed.sort_by(resolution_order);

        let mut pass = Pass {
            registry: PlayerRegistry::new(directory),
            diagnostics: Vec::new(),
            stats: ResolutionStats { records: keyed.len(), ..Default::default() },
        };

        for item in &keyed {
            match item.record.subject() {
                Subject::Team => pass.resolve_team(item),
                Subject::Player => pass.resolve_player(item),
            }
        }
        pass.flag_orphans();

        let Pass { registry, diagnostics, stats } = pass;
        info!(
            "Resolved {} records into {} players ({} by id, {} by name, {} created, {} unresolved)",
            stats.records,
            registry.len(),
            stats.merged_by_id,
            stats.merged_by_name,
            stats.created,
            stats.unresolved
        );
        Resolution { registry, diagnostics, stats }
    }
}

struct Pass {
    registry: PlayerRegistry,
    diagnostics: Vec<Diagnostic>,
    stats: ResolutionStats,
}

impl Pass {
    fn report(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        if matches!(diagnostic, Diagnostic::UnresolvedRecord { .. }) {
            self.stats.unresolved += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    fn unresolved(&mut self, item: &KeyedRecord, reason: UnresolvedReason) {
        self.report(Diagnostic::UnresolvedRecord {
            record: item.record.reference(),
            raw_name: item.record.raw_name.clone(),
            reason,
        });
    }

    fn resolve_team(&mut self, item: &KeyedRecord) {
        let record = &item.record;
        let Some(team_id) = self.registry.directory().resolve_record(record).cloned() else {
            self.unresolved(item, UnresolvedReason::UnknownTeam);
            return;
        };
        let Some(sheet) = self.registry.team_sheet_mut(&team_id) else {
            self.unresolved(item, UnresolvedReason::UnknownTeam);
            return;
        };
        let reference = record.reference();
        for (key, value) in &record.attributes {
            merge_into(&mut sheet.attributes, key.clone(), value.clone(), &reference, record.priority);
        }
        sheet.sources.insert(reference);
        self.stats.team_records += 1;
    }

    fn resolve_player(&mut self, item: &KeyedRecord) {
        let record = &item.record;

        // Tier one: platform ID is authoritative
        if let Some(native_id) = record.native_id.as_deref() {
            if let Some(existing) = self.registry.lookup_by_native_id(native_id) {
                let canonical_id = existing.canonical_id.clone();
                if !item.name_key.is_empty()
                    && !existing.name_key.is_empty()
                    && existing.name_key != item.name_key
                {
                    let diagnostic = Diagnostic::IdentityConflict {
                        canonical_id: canonical_id.clone(),
                        native_id: native_id.to_string(),
                        existing_name: existing.display_name.clone(),
                        incoming_name: record.raw_name.clone(),
                        record: record.reference(),
                    };
                    self.report(diagnostic);
                }
                debug!("{}: merged into {} by platform id", record.reference(), canonical_id);
                self.merge(&canonical_id, item);
                self.stats.merged_by_id += 1;
                return;
            }
        }

        if item.name_key.is_empty() {
            match record.native_id.as_deref() {
                Some(native_id) => self.create(item, CanonicalId::new(native_id)),
                None => self.unresolved(item, UnresolvedReason::NoIdentity),
            }
            return;
        }

        // Tier two: name key plus compatible hints
        match self.match_by_name(item) {
            NameMatch::Found(canonical_id) => {
                debug!("{}: merged into {} by name and hints", record.reference(), canonical_id);
                if let Some(native_id) = record.native_id.as_deref() {
                    self.promote(&canonical_id, native_id, item);
                }
                let canonical_id = match record.native_id.as_deref() {
                    Some(native_id) => self
                        .registry
                        .lookup_by_native_id(native_id)
                        .map(|p| p.canonical_id.clone())
                        .unwrap_or(canonical_id),
                    None => canonical_id,
                };
                self.merge(&canonical_id, item);
                self.stats.merged_by_name += 1;
            }
            NameMatch::Ambiguous(candidates) => {
                self.unresolved(item, UnresolvedReason::AmbiguousName { candidates });
            }
            NameMatch::None => {
                let canonical_id = match record.native_id.as_deref() {
                    Some(native_id) => CanonicalId::new(native_id),
                    None => self.generated_id(item),
                };
                self.create(item, canonical_id);
            }
        }
    }

    fn match_by_name(&self, item: &KeyedRecord) -> NameMatch {
        let record = &item.record;
        let record_team = self.team_ref(record);

        let mut best: Vec<(usize, CanonicalId)> = Vec::new();
        for candidate in self.registry.lookup_by_key(&item.name_key) {
            // Never merge across two different strong IDs
            if record.native_id.is_some() && candidate.native_id.is_some() {
                continue;
            }
            let hints = [
                position_hint(&record.positions, &candidate.positions),
                pro_team_hint(item.pro_team_key.as_deref(), &candidate.pro_teams),
                fantasy_team_hint(record_team.as_ref(), candidate),
            ];
            let matches = hints.iter().filter(|h| **h == HintMatch::Match).count();
            let conflicts = hints.iter().filter(|h| **h == HintMatch::Conflict).count();
            if matches == 0 && conflicts > 0 {
                continue;
            }
            best.push((matches, candidate.canonical_id.clone()));
        }

        let Some(top) = best.iter().map(|(m, _)| *m).max() else {
            return NameMatch::None;
        };
        let mut winners: Vec<CanonicalId> =
            best.into_iter().filter(|(m, _)| *m == top).map(|(_, id)| id).collect();
        match winners.len() {
            1 => NameMatch::Found(winners.remove(0)),
            _ => NameMatch::Ambiguous(winners),
        }
    }

    fn team_ref(&self, record: &SourceRecord) -> Option<TeamRef> {
        let label = record.team_label.as_deref()?;
        Some(match self.registry.directory().resolve(label) {
            Some(team_id) => TeamRef::Known(team_id.clone()),
            None => TeamRef::Unlisted(label.to_string()),
        })
    }

    fn generated_id(&self, item: &KeyedRecord) -> CanonicalId {
        let base = ConsistentHasher::generated_player_id(
            &item.name_key,
            &item.record.positions,
            item.pro_team_key.as_deref().unwrap_or(""),
        );
        if self.registry.lookup_by_id(&base).is_err() {
            return base;
        }
        for attempt in 2..MAX_PROBES {
            let candidate = ConsistentHasher::probe(&base, attempt);
            if self.registry.lookup_by_id(&candidate).is_err() {
                info!(
                    "Resolved id collision for {} after {} attempts, using {}",
                    item.name_key, attempt, candidate
                );
                return candidate;
            }
        }
        // Unreachable in practice: a thousand players sharing key and hints
        ConsistentHasher::probe(&base, MAX_PROBES)
    }

    fn create(&mut self, item: &KeyedRecord, canonical_id: CanonicalId) {
        let record = &item.record;
        // An ID stands in for a missing name until any named record arrives
        let (display_name, display_priority) = if record.raw_name.trim().is_empty() {
            (canonical_id.to_string(), SourcePriority::UNNAMED)
        } else {
            (record.raw_name.trim().to_string(), record.priority)
        };
        let mut player = CanonicalPlayer::new(
            canonical_id.clone(),
            item.name_key.clone(),
            display_name,
            display_priority,
        );
        player.native_id = record.native_id.clone();
        debug!("{}: created canonical player {}", record.reference(), canonical_id);
        self.registry.upsert(player);
        self.stats.created += 1;
        self.merge(&canonical_id, item);
    }

    /// Swap a generated ID for the platform ID a later record supplied
    fn promote(&mut self, canonical_id: &CanonicalId, native_id: &str, item: &KeyedRecord) {
        let Ok(existing) = self.registry.lookup_by_id(canonical_id) else {
            return;
        };
        if existing.native_id.is_some() {
            return;
        }
        let mut promoted = existing.clone();
        promoted.native_id = Some(native_id.to_string());
        if promoted.name_key.is_empty() {
            promoted.name_key = item.name_key.clone();
        }
        self.registry.upsert(promoted);
        if let Err(e) = self.registry.rekey(canonical_id, CanonicalId::new(native_id)) {
            warn!("Keeping generated id {}: {}", canonical_id, e);
        }
    }

    fn merge(&mut self, canonical_id: &CanonicalId, item: &KeyedRecord) {
        let record = &item.record;
        let team = self.team_ref(record);
        let reference = record.reference();

        let needs_key = !item.name_key.is_empty()
            && self.registry.lookup_by_id(canonical_id).is_ok_and(|p| p.name_key.is_empty());
        if needs_key {
            debug!("{}: named {} as {:?}", reference, canonical_id, item.name_key);
            if let Err(e) = self.registry.set_name_key(canonical_id, &item.name_key) {
                warn!("Could not name {}: {}", canonical_id, e);
            }
        }

        let Some(player) = self.registry.player_mut(canonical_id) else {
            return;
        };

        if record.priority > player.display_priority && !record.raw_name.trim().is_empty() {
            player.display_name = record.raw_name.trim().to_string();
            player.display_priority = record.priority;
        }
        player.positions.extend(record.positions.iter().cloned());
        if let Some(pro_team) = &item.pro_team_key {
            player.pro_teams.insert(pro_team.clone());
        }
        for (key, value) in &record.attributes {
            merge_into(&mut player.attributes, key.clone(), value.clone(), &reference, record.priority);
        }

        let mut unknown_label = None;
        if let Some(team) = team {
            let replace = match &player.current_team {
                None => true,
                Some(current) => record.priority > current.priority,
            };
            if let TeamRef::Unlisted(label) = &team {
                unknown_label = Some(label.clone());
            }
            if replace {
                player.current_team =
                    Some(TeamAssignment { team, priority: record.priority, source: reference.clone() });
            }
        }
        player.sources.insert(reference.clone());

        if let Some(label) = unknown_label {
            self.report(Diagnostic::UnknownTeam {
                canonical_id: canonical_id.clone(),
                label,
                record: reference,
            });
        }
    }

    fn flag_orphans(&mut self) {
        let mut orphans = 0;
        for player in self.registry.players_mut() {
            player.orphaned = !player.is_anchored();
            if player.orphaned {
                orphans += 1;
            }
        }
        if orphans > 0 {
            info!("{} canonical players have no roster anchor", orphans);
        }
    }
}

/// Highest priority first, then a total order over the record's content
fn resolution_order(a: &KeyedRecord, b: &KeyedRecord) -> Ordering {
    let (ra, rb) = (&a.record, &b.record);
    rb.priority
        .cmp(&ra.priority)
        .then_with(|| ra.kind.cmp(&rb.kind))
        .then_with(|| rb.native_id.is_some().cmp(&ra.native_id.is_some()))
        .then_with(|| ra.native_id.cmp(&rb.native_id))
        .then_with(|| a.name_key.cmp(&b.name_key))
        .then_with(|| ra.positions.cmp(&rb.positions))
        .then_with(|| a.pro_team_key.cmp(&b.pro_team_key))
        .then_with(|| ra.team_label.cmp(&rb.team_label))
        .then_with(|| ra.raw_name.cmp(&rb.raw_name))
        .then_with(|| compare_attributes(ra, rb))
        .then_with(|| ra.source.cmp(&rb.source))
        .then_with(|| ra.line.cmp(&rb.line))
}

fn compare_attributes(a: &SourceRecord, b: &SourceRecord) -> Ordering {
    for ((ka, va), (kb, vb)) in a.attributes.iter().zip(b.attributes.iter()) {
        let ordering = ka.cmp(kb).then_with(|| va.total_cmp(vb));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.attributes.len().cmp(&b.attributes.len())
}

/// Position families: OF covers the three outfield spots, P both pitcher roles
fn expand_position(position: &str) -> &'static [&'static str] {
    match position {
        "OF" => &["OF", "LF", "CF", "RF"],
        "LF" => &["LF", "OF"],
        "CF" => &["CF", "OF"],
        "RF" => &["RF", "OF"],
        "P" => &["P", "SP", "RP"],
        "SP" => &["SP", "P"],
        "RP" => &["RP", "P"],
        _ => &[],
    }
}

fn position_hint(record: &[String], candidate: &BTreeSet<String>) -> HintMatch {
    if record.is_empty() || candidate.is_empty() {
        return HintMatch::Unknown;
    }
    if record.iter().any(|p| p == "UT") || candidate.contains("UT") {
        return HintMatch::Match;
    }
    let overlaps = record.iter().any(|position| {
        candidate.contains(position)
            || expand_position(position).iter().any(|family| candidate.contains(*family))
    });
    if overlaps {
        HintMatch::Match
    } else {
        HintMatch::Conflict
    }
}

fn pro_team_hint(record: Option<&str>, candidate: &BTreeSet<String>) -> HintMatch {
    match record {
        None => HintMatch::Unknown,
        Some(_) if candidate.is_empty() => HintMatch::Unknown,
        Some(team) if candidate.contains(team) => HintMatch::Match,
        Some(_) => HintMatch::Conflict,
    }
}

fn fantasy_team_hint(record: Option<&TeamRef>, candidate: &CanonicalPlayer) -> HintMatch {
    match (record, candidate.current_team.as_ref()) {
        (Some(ours), Some(theirs)) if *ours == theirs.team => HintMatch::Match,
        (Some(_), Some(_)) => HintMatch::Conflict,
        _ => HintMatch::Unknown,
    }
}
