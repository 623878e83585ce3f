//! Snapshot directory loader
//!
//! Reads every source file of one snapshot concurrently and hands the engine
//! parsed payloads. Only `teams.json` is required; a missing optional file is
//! simply not a source this cycle, while an unreadable or malformed one is
//! reported as an unavailable source.

use crate::engine::CycleInputs;
use crate::error::{EngineError, Result};
use futures::future::join_all;
use player_registry::EngineCache;
use source_records::{parse_team_reference, DataSourceError, IngestSource};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub const TEAMS_FILE: &str = "teams.json";
pub const HISTORY_DIR: &str = "history";

/// One optional file in the snapshot layout
#[derive(Debug, Clone, PartialEq, Eq)]
enum SourceFile {
    Rosters,
    Players,
    Standings,
    Prospects,
    Mvp,
    Playoffs,
    History { season: String },
}

impl SourceFile {
    /// Path relative to the snapshot root, also used as the source name
    fn relative_path(&self) -> String {
        match self {
            SourceFile::Rosters => "rosters.json".to_string(),
            SourceFile::Players => "players.json".to_string(),
            SourceFile::Standings => "standings.json".to_string(),
            SourceFile::Prospects => "prospects.csv".to_string(),
            SourceFile::Mvp => "mvp.csv".to_string(),
            SourceFile::Playoffs => "playoffs.csv".to_string(),
            SourceFile::History { season } => format!("{HISTORY_DIR}/{season}.csv"),
        }
    }

    fn parse(&self, name: String, text: &str) -> source_records::Result<IngestSource> {
        match self {
            SourceFile::Rosters => IngestSource::rosters_from_json(name, text),
            SourceFile::Players => IngestSource::player_directory_from_json(name, text),
            SourceFile::Standings => IngestSource::standings_from_json(name, text),
            SourceFile::Prospects => IngestSource::prospects_from_csv(name, text.as_bytes()),
            SourceFile::Mvp => IngestSource::mvp_from_csv(name, text.as_bytes()),
            SourceFile::Playoffs => IngestSource::playoffs_from_csv(name, text.as_bytes()),
            SourceFile::History { season } => {
                IngestSource::history_from_csv(name, season.clone(), text.as_bytes())
            }
        }
    }
}

/// Loads `CycleInputs` from a snapshot directory
#[derive(Debug, Clone)]
pub struct SnapshotLoader {
    dir: PathBuf,
    cache: Option<Arc<EngineCache>>,
}

impl SnapshotLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), cache: None }
    }

    /// Publish raw payloads into a shared cache as they are read
    pub fn with_cache(mut self, cache: Arc<EngineCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn load(&self) -> Result<CycleInputs> {
        let teams_path = self.dir.join(TEAMS_FILE);
        let teams_json = match tokio::fs::read_to_string(&teams_path).await {
            Ok(text) => self.publish(&teams_path, text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(EngineError::MissingTeamReference(teams_path.display().to_string()));
            }
            Err(error) => {
                return Err(EngineError::Snapshot { path: teams_path.display().to_string(), error });
            }
        };
        let teams = parse_team_reference(TEAMS_FILE, &teams_json)?;

        let files = self.source_files().await?;
        let reads = join_all(files.iter().map(|file| {
            let path = self.dir.join(file.relative_path());
            async move {
                let content = tokio::fs::read_to_string(&path).await;
                (path, content)
            }
        }))
        .await;

        let mut sources = Vec::new();
        for (file, (path, content)) in files.iter().zip(reads) {
            let name = file.relative_path();
            match content {
                Ok(text) => {
                    let text = self.publish(&path, text);
                    sources.push(file.parse(name, &text));
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("{} not present in snapshot", name);
                }
                Err(e) => {
                    sources.push(Err(DataSourceError::unavailable(name, e.to_string())));
                }
            }
        }

        info!(
            "Loaded snapshot {:?}: {} teams, {} sources",
            self.dir,
            teams.len(),
            sources.len()
        );
        Ok(CycleInputs { teams, sources })
    }

    /// Fixed files plus one history file per season, oldest season first
    async fn source_files(&self) -> Result<Vec<SourceFile>> {
        let mut files = vec![
            SourceFile::Rosters,
            SourceFile::Players,
            SourceFile::Standings,
            SourceFile::Prospects,
            SourceFile::Mvp,
            SourceFile::Playoffs,
        ];

        let history_dir = self.dir.join(HISTORY_DIR);
        let mut entries = match tokio::fs::read_dir(&history_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(files),
            Err(error) => {
                return Err(EngineError::Snapshot {
                    path: history_dir.display().to_string(),
                    error,
                });
            }
        };

        let mut seasons = Vec::new();
        loop {
            let entry = entries.next_entry().await.map_err(|error| EngineError::Snapshot {
                path: history_dir.display().to_string(),
                error,
            })?;
            let Some(entry) = entry else { break };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(season) = path.file_stem().and_then(|s| s.to_str()) {
                seasons.push(season.to_string());
            }
        }
        seasons.sort();
        files.extend(seasons.into_iter().map(|season| SourceFile::History { season }));
        Ok(files)
    }

    fn publish(&self, path: &Path, text: String) -> Arc<str> {
        match &self.cache {
            Some(cache) => cache.publish_content(&path.display().to_string(), text),
            None => Arc::from(text),
        }
    }
}
