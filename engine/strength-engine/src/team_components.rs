//! Team cohort components: power, prospects, history, playoff

use crate::calculator::ComponentCalculator;
use crate::config::HistoryConfig;
use crate::models::Component;
use player_registry::{RegistrySnapshot, TeamSheet};
use std::collections::{BTreeMap, BTreeSet};

const POWER_BANDS: usize = 10;

/// Recent record thresholds for the hot/cold modifier, best first
const HOT_COLD_STEPS: [(f64, f64); 5] =
    [(0.800, 1.5), (0.650, 1.4), (0.500, 1.3), (0.350, 1.2), (0.200, 1.1)];

/// Current-season strength from standings
pub struct PowerCalculator;

impl PowerCalculator {
    /// Ten equal bands by points-for rank: 1.9 for the top band down to 1.0
    pub fn points_modifier(rank: usize, teams: usize) -> f64 {
        if teams == 0 {
            return 1.0;
        }
        let band = (rank * POWER_BANDS / teams).min(POWER_BANDS - 1);
        1.0 + 0.1 * (POWER_BANDS - 1 - band) as f64
    }

    pub fn hot_cold_modifier(recent_record: f64) -> f64 {
        HOT_COLD_STEPS
            .iter()
            .find(|(threshold, _)| recent_record >= *threshold)
            .map(|(_, modifier)| *modifier)
            .unwrap_or(1.0)
    }

    fn weekly_average(sheet: &TeamSheet, points_for: f64) -> f64 {
        let weeks = sheet.number("weeks_played").unwrap_or_else(|| {
            ["wins", "losses", "ties"].iter().filter_map(|k| sheet.number(k)).sum()
        });
        points_for / weeks.max(1.0)
    }

    fn recent_record(sheet: &TeamSheet) -> f64 {
        let wins = sheet.number("recent_wins").unwrap_or(0.0);
        let losses = sheet.number("recent_losses").unwrap_or(0.0);
        if wins + losses > 0.0 {
            wins / (wins + losses)
        } else {
            0.5
        }
    }
}

impl ComponentCalculator<TeamSheet> for PowerCalculator {
    fn component(&self) -> Component {
        Component::Power
    }

    fn raw_metrics(&self, cohort: &[&TeamSheet], _: &RegistrySnapshot) -> Vec<Option<f64>> {
        let points: Vec<Option<f64>> = cohort.iter().map(|s| s.number("points_for")).collect();
        let known: Vec<f64> = points.iter().flatten().copied().collect();

        cohort
            .iter()
            .zip(&points)
            .map(|(sheet, points_for)| {
                let points_for = (*points_for)?;
                // Equal points share the better band
                let rank = known.iter().filter(|other| **other > points_for).count();
                let modifier = Self::points_modifier(rank, known.len());
                let hot_cold = Self::hot_cold_modifier(Self::recent_record(sheet));
                Some(Self::weekly_average(sheet, points_for) * modifier * hot_cold)
            })
            .collect()
    }
}

/// Sum of prospect scores across a team's current roster
pub struct ProspectStrengthCalculator;

impl ComponentCalculator<TeamSheet> for ProspectStrengthCalculator {
    fn component(&self) -> Component {
        Component::Prospects
    }

    fn raw_metrics(&self, cohort: &[&TeamSheet], snapshot: &RegistrySnapshot) -> Vec<Option<f64>> {
        cohort
            .iter()
            .map(|sheet| {
                let scores: Vec<f64> = snapshot
                    .roster(&sheet.team.team_id)
                    .iter()
                    .filter_map(|player| player.number("prospect_score"))
                    .collect();
                if scores.is_empty() {
                    None
                } else {
                    Some(scores.iter().sum())
                }
            })
            .collect()
    }
}

/// Most recent seasons present in the cohort, newest first, paired with their weights
fn weighted_seasons(cohort: &[&TeamSheet], weights: &[f64]) -> Vec<(String, f64)> {
    let seasons: BTreeSet<&str> = cohort
        .iter()
        .flat_map(|sheet| sheet.attributes.keys())
        .filter(|key| key.name == "rank" || key.name == "playoff_finish")
        .filter_map(|key| key.period.as_deref())
        .collect();

    seasons
        .into_iter()
        .rev()
        .zip(weights.iter().copied())
        .map(|(season, weight)| (season.to_string(), weight))
        .collect()
}

/// Weighted past-season performance: win%, final rank and fantasy points
pub struct HistoryCalculator {
    season_weights: Vec<f64>,
}

impl HistoryCalculator {
    pub fn new(config: &HistoryConfig) -> Self {
        Self { season_weights: config.season_weights.clone() }
    }

    /// `(win_pct * 100 + rank_score + fpts_score) / 3`
    pub fn season_score(win_pct: f64, rank: f64, teams: usize, fpts: f64, max_fpts: f64) -> f64 {
        let rank_score = if teams > 1 {
            100.0 * (1.0 - (rank - 1.0) / (teams as f64 - 1.0))
        } else {
            100.0
        };
        let fpts_score = if max_fpts > 0.0 { 100.0 * fpts / max_fpts } else { 0.0 };
        (win_pct * 100.0 + rank_score + fpts_score) / 3.0
    }
}

impl ComponentCalculator<TeamSheet> for HistoryCalculator {
    fn component(&self) -> Component {
        Component::History
    }

    fn raw_metrics(&self, cohort: &[&TeamSheet], _: &RegistrySnapshot) -> Vec<Option<f64>> {
        let seasons = weighted_seasons(cohort, &self.season_weights);

        // Per-season cohort facts: teams with a final rank and the best points total
        let season_facts: BTreeMap<&str, (usize, f64)> = seasons
            .iter()
            .map(|(season, _)| {
                let ranked: Vec<&&TeamSheet> =
                    cohort.iter().filter(|s| s.number_for("rank", season).is_some()).collect();
                let max_fpts = ranked
                    .iter()
                    .filter_map(|s| s.number_for("fantasy_points", season))
                    .fold(0.0, f64::max);
                (season.as_str(), (ranked.len(), max_fpts))
            })
            .collect();

        cohort
            .iter()
            .map(|sheet| {
                let mut total = None;
                for (season, weight) in &seasons {
                    let Some(rank) = sheet.number_for("rank", season) else {
                        continue;
                    };
                    let (teams, max_fpts) =
                        season_facts.get(season.as_str()).copied().unwrap_or((1, 0.0));
                    let score = Self::season_score(
                        sheet.number_for("win_pct", season).unwrap_or(0.0),
                        rank,
                        teams,
                        sheet.number_for("fantasy_points", season).unwrap_or(0.0),
                        max_fpts,
                    );
                    total = Some(total.unwrap_or(0.0) + weight * score);
                }
                total
            })
            .collect()
    }
}

/// Weighted podium finishes
pub struct PlayoffCalculator {
    season_weights: Vec<f64>,
    points: BTreeMap<String, f64>,
}

impl PlayoffCalculator {
    pub fn new(config: &HistoryConfig) -> Self {
        Self {
            season_weights: config.season_weights.clone(),
            points: config
                .playoff_points
                .iter()
                .map(|(place, points)| (place.trim().to_lowercase(), *points))
                .collect(),
        }
    }
}

impl ComponentCalculator<TeamSheet> for PlayoffCalculator {
    fn component(&self) -> Component {
        Component::Playoff
    }

    fn raw_metrics(&self, cohort: &[&TeamSheet], _: &RegistrySnapshot) -> Vec<Option<f64>> {
        let seasons = weighted_seasons(cohort, &self.season_weights);
        cohort
            .iter()
            .map(|sheet| {
                let mut total = None;
                for (season, weight) in &seasons {
                    if let Some(finish) = sheet.text_for("playoff_finish", season) {
                        let points = self.points.get(finish).copied().unwrap_or(0.0);
                        total = Some(total.unwrap_or(0.0) + weight * points);
                    }
                }
                total
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use player_registry::{CanonicalTeam, TeamId};
    use source_records::{AttributeKey, AttributeValue, RecordKind, RecordRef, SourcePriority};

    fn sheet(team_id: &str, numbers: &[(&str, Option<&str>, f64)]) -> TeamSheet {
        let mut sheet = TeamSheet::new(CanonicalTeam {
            team_id: TeamId::new(team_id),
            name: team_id.to_string(),
            short_code: team_id.to_uppercase(),
            logo: None,
            aliases: vec![],
        });
        for (name, period, value) in numbers {
            let key = match period {
                Some(period) => AttributeKey::for_period(*name, *period),
                None => AttributeKey::new(*name),
            };
            sheet.attributes.insert(
                key,
                player_registry::MergedAttribute::new(
                    AttributeValue::Number(*value),
                    RecordRef { source: "test".to_string(), kind: RecordKind::StandingsRow, line: 0 },
                    SourcePriority::STANDINGS,
                ),
            );
        }
        sheet
    }

    fn empty_snapshot() -> RegistrySnapshot {
        let directory = player_registry::TeamDirectory::new(vec![source_records::TeamReferenceRow {
            team_id: "t1".to_string(),
            name: "Team One".to_string(),
            short_code: "T1".to_string(),
            logo: None,
            aliases: vec![],
        }])
        .unwrap();
        player_registry::PlayerRegistry::new(directory).freeze()
    }

    #[test]
    fn test_points_modifier_bands() {
        let close = |a: f64, b: f64| (a - b).abs() < 1e-12;
        assert!(close(PowerCalculator::points_modifier(0, 30), 1.9));
        assert!(close(PowerCalculator::points_modifier(2, 30), 1.9));
        assert!(close(PowerCalculator::points_modifier(3, 30), 1.8));
        assert!(close(PowerCalculator::points_modifier(29, 30), 1.0));
        assert!(close(PowerCalculator::points_modifier(1, 2), 1.4));
        assert!(close(PowerCalculator::points_modifier(0, 0), 1.0));
    }

    #[test]
    fn test_hot_cold_modifier() {
        assert_eq!(PowerCalculator::hot_cold_modifier(0.8), 1.5);
        assert_eq!(PowerCalculator::hot_cold_modifier(0.7), 1.4);
        assert_eq!(PowerCalculator::hot_cold_modifier(0.5), 1.3);
        assert_eq!(PowerCalculator::hot_cold_modifier(0.35), 1.2);
        assert_eq!(PowerCalculator::hot_cold_modifier(0.2), 1.1);
        assert_eq!(PowerCalculator::hot_cold_modifier(0.1), 1.0);
    }

    #[test]
    fn test_power_raw_metric() {
        let leader = sheet(
            "a",
            &[("points_for", None, 1000.0), ("weeks_played", None, 10.0), ("recent_wins", None, 4.0)],
        );
        let trailer = sheet(
            "b",
            &[("points_for", None, 800.0), ("wins", None, 3.0), ("losses", None, 5.0)],
        );
        let unknown = sheet("c", &[]);
        let raw = PowerCalculator.raw_metrics(&[&leader, &trailer, &unknown], &empty_snapshot());

        // 100/week * 1.9 * 1.5 (4-0 recent)
        assert!((raw[0].unwrap() - 285.0).abs() < 1e-9);
        // 100/week * 1.4 (second of two) * 1.3 (no recent games)
        assert!((raw[1].unwrap() - 182.0).abs() < 1e-9);
        assert_eq!(raw[2], None);
    }

    #[test]
    fn test_history_season_score() {
        let score = HistoryCalculator::season_score(0.6, 1.0, 12, 900.0, 900.0);
        assert!((score - (60.0 + 100.0 + 100.0) / 3.0).abs() < 1e-9);
        let lone = HistoryCalculator::season_score(0.0, 1.0, 1, 0.0, 0.0);
        assert!((lone - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_history_weights_newest_season_most() {
        let a = sheet(
            "a",
            &[
                ("rank", Some("2024"), 1.0),
                ("win_pct", Some("2024"), 0.6),
                ("fantasy_points", Some("2024"), 1000.0),
                ("rank", Some("2023"), 2.0),
                ("win_pct", Some("2023"), 0.4),
                ("fantasy_points", Some("2023"), 500.0),
            ],
        );
        let b = sheet(
            "b",
            &[
                ("rank", Some("2024"), 2.0),
                ("win_pct", Some("2024"), 0.4),
                ("fantasy_points", Some("2024"), 500.0),
                ("rank", Some("2023"), 1.0),
                ("win_pct", Some("2023"), 0.6),
                ("fantasy_points", Some("2023"), 1000.0),
            ],
        );
        let calculator = HistoryCalculator::new(&HistoryConfig::default());
        let raw = calculator.raw_metrics(&[&a, &b], &empty_snapshot());

        let strong = (60.0 + 100.0 + 100.0) / 3.0;
        let weak = (40.0 + 0.0 + 50.0) / 3.0;
        assert!((raw[0].unwrap() - (0.4 * strong + 0.3 * weak)).abs() < 1e-9);
        assert!((raw[1].unwrap() - (0.4 * weak + 0.3 * strong)).abs() < 1e-9);
    }

    #[test]
    fn test_playoff_points() {
        let mut champion = sheet("a", &[("rank", Some("2024"), 1.0)]);
        champion.attributes.insert(
            AttributeKey::for_period("playoff_finish", "2024"),
            player_registry::MergedAttribute::new(
                AttributeValue::Text("1st".to_string()),
                RecordRef { source: "playoffs.csv".to_string(), kind: RecordKind::PlayoffFinish, line: 0 },
                SourcePriority::HISTORY,
            ),
        );
        let other = sheet("b", &[("rank", Some("2024"), 2.0)]);

        let calculator = PlayoffCalculator::new(&HistoryConfig::default());
        let raw = calculator.raw_metrics(&[&champion, &other], &empty_snapshot());
        assert!((raw[0].unwrap() - 12.0).abs() < 1e-9);
        assert_eq!(raw[1], None);
    }
}
