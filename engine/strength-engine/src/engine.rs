//! Cycle orchestration: ingest, resolve, freeze, score, rank
//!
//! A cycle either returns a complete `CycleOutput` or an `EngineError`; nothing
//! is published halfway. Source failures short of "every source failed" are
//! carried through as `unavailable_sources`.

use crate::aggregator::CompositeAggregator;
use crate::calculator::{score_cohort, ComponentCalculator};
use crate::config::{EngineConfig, WeightTable};
use crate::error::{EngineError, Result};
use crate::models::{
    AuditReport, CohortKind, CohortRanking, Component, CompositeScore, CycleOutput,
    OrphanedPlayer, RankedEntry,
};
use crate::player_components::{
    AttributeCalculator, ContractCalculator, PositionScarcityCalculator,
};
use crate::team_components::{
    HistoryCalculator, PlayoffCalculator, PowerCalculator, ProspectStrengthCalculator,
};
use player_registry::{
    CanonicalPlayer, Diagnostic, EngineCache, IdentityResolver, RegistrySnapshot,
    ResolutionStats, TeamDirectory, TeamSheet,
};
use source_records::{ingest_all, IngestSource, SourceFailure, TeamReferenceRow};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything one cycle reads
#[derive(Debug, Default)]
pub struct CycleInputs {
    /// Static team reference table; required
    pub teams: Vec<TeamReferenceRow>,
    /// Fetched sources, or the typed failure the fetcher reported
    pub sources: Vec<source_records::Result<IngestSource>>,
}

/// Frozen result of the resolution phase
#[derive(Debug)]
pub struct ResolvedCycle {
    pub snapshot: RegistrySnapshot,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: ResolutionStats,
    pub unavailable_sources: Vec<SourceFailure>,
}

/// Display details for one ranked entity
struct EntityLabel {
    display_name: String,
    team: Option<String>,
}

pub struct StrengthEngine {
    config: EngineConfig,
    resolver: IdentityResolver,
    teams: CompositeAggregator,
    prospects: CompositeAggregator,
    mvp: CompositeAggregator,
}

impl StrengthEngine {
    /// Validate every weight table against the components its cohort supports
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        for cohort in CohortKind::ALL {
            let table = weight_table(&config, cohort);
            if let Some(component) = table.components().find(|c| !supports(cohort, *c)) {
                return Err(EngineError::UnsupportedComponent { cohort, component });
            }
        }

        Ok(Self {
            teams: CompositeAggregator::new(&config.team_weights)?,
            prospects: CompositeAggregator::new(&config.prospect_weights)?,
            mvp: CompositeAggregator::new(&config.mvp_weights)?,
            resolver: IdentityResolver::new(),
            config,
        })
    }

    /// Share normalized names across cycles
    pub fn with_cache(mut self, cache: Arc<EngineCache>) -> Self {
        self.resolver = IdentityResolver::with_cache(cache);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Ingest and resolve, then end the write phase
    pub fn resolve(&self, inputs: CycleInputs) -> Result<ResolvedCycle> {
        if inputs.teams.is_empty() {
            return Err(EngineError::MissingTeamReference("no teams supplied".to_string()));
        }
        let directory = TeamDirectory::new(inputs.teams)?;

        let report = ingest_all(inputs.sources);
        if report.ingested_sources.is_empty() {
            return Err(EngineError::AllSourcesFailed { failures: report.failures });
        }
        if report.is_partial() {
            warn!(
                "Partial availability: {} of {} sources failed",
                report.failures.len(),
                report.failures.len() + report.ingested_sources.len()
            );
        }

        let resolution = self.resolver.resolve(directory, report.records);
        Ok(ResolvedCycle {
            snapshot: resolution.registry.freeze(),
            diagnostics: resolution.diagnostics,
            stats: resolution.stats,
            unavailable_sources: report.failures,
        })
    }

    /// Score and rank one cohort of a frozen snapshot
    pub fn rank_cohort(&self, snapshot: &RegistrySnapshot, cohort: CohortKind) -> CohortRanking {
        let (aggregator, ranked, labels) = match cohort {
            CohortKind::Teams => {
                let sheets: Vec<&TeamSheet> = snapshot.team_sheets().collect();
                let calculators = self.team_calculators();
                let scores = score_cohort(&calculators, &sheets, snapshot, |sheet| {
                    sheet.team.team_id.to_string()
                });
                let labels: BTreeMap<String, EntityLabel> = sheets
                    .iter()
                    .map(|sheet| {
                        let label = EntityLabel {
                            display_name: sheet.team.name.clone(),
                            team: Some(sheet.team.short_code.clone()),
                        };
                        (sheet.team.team_id.to_string(), label)
                    })
                    .collect();
                (&self.teams, self.teams.rank(&scores), labels)
            }
            CohortKind::Prospects | CohortKind::Mvp => {
                let (aggregator, attribute) = match cohort {
                    CohortKind::Prospects => (&self.prospects, "prospect_score"),
                    _ => (&self.mvp, "fantasy_points"),
                };
                let players: Vec<&CanonicalPlayer> =
                    snapshot.players().filter(|p| p.number(attribute).is_some()).collect();
                let calculators = self.player_calculators(aggregator);
                let scores = score_cohort(&calculators, &players, snapshot, |player| {
                    player.canonical_id.to_string()
                });
                let labels: BTreeMap<String, EntityLabel> = players
                    .iter()
                    .map(|player| {
                        let team = player
                            .team_id()
                            .and_then(|id| snapshot.team_sheet(id))
                            .map(|sheet| sheet.team.name.clone());
                        let label =
                            EntityLabel { display_name: player.display_name.clone(), team };
                        (player.canonical_id.to_string(), label)
                    })
                    .collect();
                (aggregator, aggregator.rank(&scores), labels)
            }
        };

        let entries = publish(ranked, &labels);
        info!("Ranked {} entries in the {} cohort ({})", entries.len(), cohort, aggregator.version());

        CohortRanking {
            cohort,
            weight_version: aggregator.version().to_string(),
            tie_break_component: aggregator.tie_break_component(),
            entries,
        }
    }

    /// Run one full cycle for the requested cohorts
    pub fn run_cycle(&self, inputs: CycleInputs, cohorts: &[CohortKind]) -> Result<CycleOutput> {
        let resolved = self.resolve(inputs)?;
        let rankings =
            cohorts.iter().map(|cohort| self.rank_cohort(&resolved.snapshot, *cohort)).collect();

        info!(
            "Cycle complete: {} players, {} teams, {} diagnostics, {} unavailable sources",
            resolved.snapshot.player_count(),
            resolved.snapshot.team_count(),
            resolved.diagnostics.len(),
            resolved.unavailable_sources.len()
        );

        Ok(CycleOutput {
            cohorts: rankings,
            diagnostics: resolved.diagnostics,
            unavailable_sources: resolved.unavailable_sources,
        })
    }

    /// Resolve without scoring and report identity problems
    pub fn audit(&self, inputs: CycleInputs) -> Result<AuditReport> {
        let resolved = self.resolve(inputs)?;
        let orphans = resolved
            .snapshot
            .orphans()
            .map(|player| OrphanedPlayer {
                canonical_id: player.canonical_id.clone(),
                display_name: player.display_name.clone(),
                sources: player.sources.iter().map(|r| r.to_string()).collect(),
            })
            .collect();

        Ok(AuditReport {
            players: resolved.snapshot.player_count(),
            teams: resolved.snapshot.team_count(),
            records: resolved.stats.records,
            merged_by_id: resolved.stats.merged_by_id,
            merged_by_name: resolved.stats.merged_by_name,
            unresolved: resolved.stats.unresolved,
            diagnostics: resolved.diagnostics,
            orphans,
            unavailable_sources: resolved.unavailable_sources,
        })
    }

    fn team_calculators(&self) -> Vec<Box<dyn ComponentCalculator<TeamSheet>>> {
        self.teams
            .components()
            .filter_map(|component| -> Option<Box<dyn ComponentCalculator<TeamSheet>>> {
                match component {
                    Component::Power => Some(Box::new(PowerCalculator)),
                    Component::Prospects => Some(Box::new(ProspectStrengthCalculator)),
                    Component::History => {
                        Some(Box::new(HistoryCalculator::new(&self.config.history)))
                    }
                    Component::Playoff => {
                        Some(Box::new(PlayoffCalculator::new(&self.config.history)))
                    }
                    _ => None,
                }
            })
            .collect()
    }

    fn player_calculators(
        &self,
        aggregator: &CompositeAggregator,
    ) -> Vec<Box<dyn ComponentCalculator<CanonicalPlayer>>> {
        aggregator
            .components()
            .filter_map(|component| -> Option<Box<dyn ComponentCalculator<CanonicalPlayer>>> {
                match component {
                    Component::Contract => {
                        Some(Box::new(ContractCalculator::new(&self.config.tables)))
                    }
                    Component::PositionScarcity => {
                        Some(Box::new(PositionScarcityCalculator::new(&self.config.tables)))
                    }
                    other => AttributeCalculator::for_component(other)
                        .map(|c| Box::new(c) as Box<dyn ComponentCalculator<CanonicalPlayer>>),
                }
            })
            .collect()
    }
}

fn weight_table(config: &EngineConfig, cohort: CohortKind) -> &WeightTable {
    match cohort {
        CohortKind::Teams => &config.team_weights,
        CohortKind::Prospects => &config.prospect_weights,
        CohortKind::Mvp => &config.mvp_weights,
    }
}

fn supports(cohort: CohortKind, component: Component) -> bool {
    match cohort {
        CohortKind::Teams => component.is_team_component(),
        CohortKind::Prospects | CohortKind::Mvp => !component.is_team_component(),
    }
}

fn publish(ranked: Vec<CompositeScore>, labels: &BTreeMap<String, EntityLabel>) -> Vec<RankedEntry> {
    ranked
        .into_iter()
        .map(|score| {
            let (display_name, team) = labels
                .get(&score.entity_id)
                .map(|l| (l.display_name.clone(), l.team.clone()))
                .unwrap_or_else(|| (score.entity_id.clone(), None));
            let missing_components =
                score.breakdown.iter().filter(|c| c.missing).map(|c| c.component).collect();
            RankedEntry {
                rank: score.rank,
                canonical_id: score.entity_id,
                display_name,
                team,
                component_scores: score.breakdown,
                composite_score: score.composite,
                exact_score: score.exact,
                missing_components,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use source_records::DataSourceError;

    fn teams() -> Vec<TeamReferenceRow> {
        vec![TeamReferenceRow {
            team_id: "t1".to_string(),
            name: "Team One".to_string(),
            short_code: "ONE".to_string(),
            logo: None,
            aliases: vec![],
        }]
    }

    #[test]
    fn test_team_component_in_player_table_is_rejected() {
        let mut config = EngineConfig::default();
        config.mvp_weights = WeightTable::new("mvp-bad", &[(Component::Power, 1.0)]);

        match StrengthEngine::new(config) {
            Err(EngineError::UnsupportedComponent { cohort, component }) => {
                assert_eq!(cohort, CohortKind::Mvp);
                assert_eq!(component, Component::Power);
            }
            other => panic!("expected unsupported component, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_invalid_weights_fail_construction() {
        let mut config = EngineConfig::default();
        config.team_weights = WeightTable::new("ddi-bad", &[(Component::Power, 0.7)]);
        assert!(matches!(StrengthEngine::new(config), Err(EngineError::InvalidWeights { .. })));
    }

    #[test]
    fn test_missing_team_reference_is_fatal() {
        let engine = StrengthEngine::new(EngineConfig::default()).unwrap();
        let inputs = CycleInputs { teams: vec![], sources: vec![] };
        assert!(matches!(
            engine.run_cycle(inputs, &CohortKind::ALL),
            Err(EngineError::MissingTeamReference(_))
        ));
    }

    #[test]
    fn test_all_sources_failing_is_fatal() {
        let engine = StrengthEngine::new(EngineConfig::default()).unwrap();
        let inputs = CycleInputs {
            teams: teams(),
            sources: vec![
                Err(DataSourceError::unavailable("rosters.json", "timed out")),
                IngestSource::standings_from_json("standings.json", "{not json"),
            ],
        };

        match engine.run_cycle(inputs, &CohortKind::ALL) {
            Err(EngineError::AllSourcesFailed { failures }) => {
                let names: Vec<&str> = failures.iter().map(|f| f.source.as_str()).collect();
                assert_eq!(names, vec!["rosters.json", "standings.json"]);
            }
            other => panic!("expected all sources failed, got {:?}", other.err()),
        }
    }
}
