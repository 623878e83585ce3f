//! Whole-cycle tests: ingestion through published rankings

use crate::config::EngineConfig;
use crate::engine::{CycleInputs, StrengthEngine};
use crate::error::EngineError;
use crate::models::{CohortKind, CohortRanking, Component, CycleOutput};
use crate::snapshot::SnapshotLoader;
use player_registry::Diagnostic;
use source_records::{parse_team_reference, DataSourceError, IngestSource};
use std::fs;
use std::path::Path;

const TEAMS: &str = r#"[
    {"team_id": "t1", "name": "Detroit Dynasty", "short_code": "DD"},
    {"team_id": "t2", "name": "Boston Bombers", "short_code": "BB", "aliases": ["Bombers"]},
    {"team_id": "t3", "name": "Chicago Cubs Fans", "short_code": "CCF"}
]"#;

const ROSTERS: &str = r#"{"rosters": {
    "t1": {"teamName": "Detroit Dynasty", "rosterItems": [
        {"id": "p1", "name": "Riley Greene", "position": "LF", "status": "Active"},
        {"id": "p2", "name": "Jackson Jobe", "position": "SP", "status": "NA"},
        {"id": "p5", "position": "OF", "status": "NA"}
    ]},
    "t2": {"teamName": "Boston Bombers", "rosterItems": [
        {"id": "p3", "name": "Marcelo Mayer", "position": "SS", "status": "NA"}
    ]},
    "t3": {"teamName": "Chicago Cubs Fans", "rosterItems": [
        {"id": "p4", "name": "Pete Crow-Armstrong", "position": "CF", "status": "Active"}
    ]}
}}"#;

const PLAYERS: &str = r#"{
    "p1": {"name": "Riley Greene", "team": "DET", "position": "LF"},
    "p2": {"name": "Jackson Jobe", "team": "DET", "position": "SP"},
    "p3": {"name": "Marcelo Mayer", "team": "BOS", "position": "SS"},
    "p4": {"name": "Pete Crow-Armstrong", "team": "CHC", "position": "CF"},
    "p5": {"name": "Max Clark", "team": "DET", "position": "OF"}
}"#;

const STANDINGS: &str = r#"[
    {"teamId": "t1", "teamName": "Detroit Dynasty", "wins": 10, "losses": 4, "pointsFor": 1500,
     "weeksPlayed": 14, "recentWins": 3, "recentLosses": 1},
    {"teamId": "t2", "teamName": "Boston Bombers", "wins": 8, "losses": 6, "pointsFor": 1300,
     "weeksPlayed": 14},
    {"teamId": "t3", "teamName": "Chicago Cubs Fans", "wins": 4, "losses": 10, "pointsFor": 1000,
     "weeksPlayed": 14}
]"#;

const PROSPECTS: &str = "\
Name,Position,MLB Team,Score,Rank
Jackson Jobe,SP,DET,85,5
Marcelo Mayer,SS,BOS,90,3
Max Clark,OF,DET,88,4
Unknown Kid,2B,SEA,70,20
";

const MVP: &str = "\
ID,Player,Position,Team,Age,Salary,Contract,FPts,FP/G
p1,Riley Grene,LF,t1,24,5,2029,450,3.2
p4,Pete Crow-Armstrong,CF,t3,22,2,2030,500,3.5
";

const HISTORY_2023: &str = "\
Rk,Team,W,L,Win%,FPts
1,Detroit Dynasty,12,2,.857,1600
2,Bombers,8,6,.571,1400
3,Chicago Cubs Fans,2,12,.143,1100
";

const PLAYOFFS: &str = "\
Season,Place,Team
2023,1st,Detroit Dynasty
2023,2nd,Boston Bombers
";

fn sources() -> Vec<source_records::Result<IngestSource>> {
    vec![
        IngestSource::rosters_from_json("rosters.json", ROSTERS),
        IngestSource::player_directory_from_json("players.json", PLAYERS),
        IngestSource::standings_from_json("standings.json", STANDINGS),
        IngestSource::prospects_from_csv("prospects.csv", PROSPECTS.as_bytes()),
        IngestSource::mvp_from_csv("mvp.csv", MVP.as_bytes()),
        IngestSource::history_from_csv("history/2023.csv", "2023", HISTORY_2023.as_bytes()),
        IngestSource::playoffs_from_csv("playoffs.csv", PLAYOFFS.as_bytes()),
    ]
}

fn inputs() -> CycleInputs {
    CycleInputs { teams: parse_team_reference("teams.json", TEAMS).unwrap(), sources: sources() }
}

fn engine() -> StrengthEngine {
    StrengthEngine::new(EngineConfig::default()).unwrap()
}

fn cohort(output: &CycleOutput, kind: CohortKind) -> &CohortRanking {
    output.cohorts.iter().find(|c| c.cohort == kind).unwrap()
}

fn ids(ranking: &CohortRanking) -> Vec<&str> {
    ranking.entries.iter().map(|e| e.canonical_id.as_str()).collect()
}

#[test]
fn test_full_cycle_ranks_every_cohort() {
    let output = engine().run_cycle(inputs(), &CohortKind::ALL).unwrap();

    assert!(output.unavailable_sources.is_empty());
    assert_eq!(output.cohorts.len(), 3);

    let teams = cohort(&output, CohortKind::Teams);
    assert_eq!(teams.weight_version, "ddi-v2");
    assert_eq!(teams.tie_break_component, Component::Power);
    assert_eq!(ids(teams), vec!["t1", "t2", "t3"]);
    assert_eq!(teams.entries[0].display_name, "Detroit Dynasty");
    // t3 has no listed prospects and no podium finish
    assert_eq!(
        teams.entries[2].missing_components,
        vec![Component::Prospects, Component::Playoff]
    );

    let prospects = cohort(&output, CohortKind::Prospects);
    let names: Vec<&str> = prospects.entries.iter().map(|e| e.display_name.as_str()).collect();
    assert_eq!(names, vec!["Marcelo Mayer", "Max Clark", "Jackson Jobe", "Unknown Kid"]);
    assert_eq!(prospects.entries[0].canonical_id, "p3");
    assert_eq!(prospects.entries[0].team.as_deref(), Some("Boston Bombers"));
    // p5's roster slot carries only an ID; the directory supplies the name
    assert_eq!(prospects.entries[1].canonical_id, "p5");
    assert_eq!(prospects.entries[1].team.as_deref(), Some("Detroit Dynasty"));
    assert_eq!(prospects.entries[3].team, None);

    let mvp = cohort(&output, CohortKind::Mvp);
    assert_eq!(ids(mvp), vec!["p4", "p1"]);
    assert_eq!(mvp.entries[1].display_name, "Riley Greene");
    assert_eq!(mvp.entries[1].team.as_deref(), Some("Detroit Dynasty"));

    for ranking in &output.cohorts {
        let ranks: Vec<usize> = ranking.entries.iter().map(|e| e.rank).collect();
        let expected: Vec<usize> = (1..=ranking.entries.len()).collect();
        assert_eq!(ranks, expected);
        for entry in &ranking.entries {
            assert!(entry.composite_score >= rust_decimal::Decimal::ZERO);
            assert!(entry.composite_score <= rust_decimal::Decimal::ONE_HUNDRED);
        }
    }
}

#[test]
fn test_misspelled_name_with_platform_id_merges() {
    let output = engine().run_cycle(inputs(), &[CohortKind::Mvp]).unwrap();

    let conflict = output.diagnostics.iter().find_map(|d| match d {
        Diagnostic::IdentityConflict { canonical_id, incoming_name, .. } => {
            Some((canonical_id.as_str().to_string(), incoming_name.clone()))
        }
        _ => None,
    });
    assert_eq!(conflict, Some(("p1".to_string(), "Riley Grene".to_string())));

    let mvp = cohort(&output, CohortKind::Mvp);
    assert_eq!(mvp.entries.iter().filter(|e| e.canonical_id == "p1").count(), 1);
}

#[test]
fn test_rerun_is_byte_identical() {
    let engine = engine();
    let first = serde_json::to_string(&engine.run_cycle(inputs(), &CohortKind::ALL).unwrap())
        .unwrap();
    let second = serde_json::to_string(&engine.run_cycle(inputs(), &CohortKind::ALL).unwrap())
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_reversed_source_order_gives_same_rankings() {
    let engine = engine();
    let forward = engine.run_cycle(inputs(), &CohortKind::ALL).unwrap();

    let mut reversed = inputs();
    reversed.sources.reverse();
    let backward = engine.run_cycle(reversed, &CohortKind::ALL).unwrap();

    assert_eq!(forward.cohorts, backward.cohorts);
    assert_eq!(forward.diagnostics, backward.diagnostics);
}

#[test]
fn test_failed_source_is_partial_availability() {
    let mut inputs = inputs();
    inputs.sources[2] = Err(DataSourceError::unavailable("standings.json", "HTTP 503"));

    let output = engine().run_cycle(inputs, &[CohortKind::Teams]).unwrap();

    assert_eq!(output.unavailable_sources.len(), 1);
    assert_eq!(output.unavailable_sources[0].source, "standings.json");

    let teams = cohort(&output, CohortKind::Teams);
    assert_eq!(teams.entries.len(), 3);
    for entry in &teams.entries {
        assert!(entry.missing_components.contains(&Component::Power));
        let power = entry.component_scores.iter().find(|c| c.component == Component::Power);
        assert_eq!(power.map(|c| c.value), Some(rust_decimal::Decimal::ZERO));
    }
}

#[test]
fn test_every_source_failing_publishes_nothing() {
    let inputs = CycleInputs {
        teams: parse_team_reference("teams.json", TEAMS).unwrap(),
        sources: vec![
            Err(DataSourceError::unavailable("rosters.json", "HTTP 500")),
            IngestSource::mvp_from_csv("mvp.csv", "ID,Player\n".as_bytes()),
        ],
    };

    let result = engine().run_cycle(inputs, &CohortKind::ALL);
    assert!(matches!(result, Err(EngineError::AllSourcesFailed { failures }) if failures.len() == 2));
}

#[test]
fn test_audit_reports_orphans_and_conflicts() {
    let report = engine().audit(inputs()).unwrap();

    assert_eq!(report.teams, 3);
    assert_eq!(report.players, 6);
    assert!(report.merged_by_id > 0);
    assert!(report.merged_by_name >= 3);
    let orphans: Vec<&str> = report.orphans.iter().map(|o| o.display_name.as_str()).collect();
    assert_eq!(orphans, vec!["Unknown Kid"]);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::IdentityConflict { .. })));
}

fn write_snapshot(dir: &Path) {
    let files = [
        ("teams.json", TEAMS),
        ("rosters.json", ROSTERS),
        ("players.json", PLAYERS),
        ("standings.json", STANDINGS),
        ("prospects.csv", PROSPECTS),
        ("mvp.csv", MVP),
        ("playoffs.csv", PLAYOFFS),
        ("history/2023.csv", HISTORY_2023),
    ];
    for (relative, content) in files {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

#[tokio::test]
async fn test_snapshot_directory_matches_in_memory_cycle() {
    let dir = tempfile::tempdir().unwrap();
    write_snapshot(dir.path());

    let engine = engine();
    let loaded = SnapshotLoader::new(dir.path()).load().await.unwrap();
    let from_disk = engine.run_cycle(loaded, &CohortKind::ALL).unwrap();
    let in_memory = engine.run_cycle(inputs(), &CohortKind::ALL).unwrap();

    assert_eq!(
        serde_json::to_string(&from_disk.cohorts).unwrap(),
        serde_json::to_string(&in_memory.cohorts).unwrap()
    );
}
