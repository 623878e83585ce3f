//! Engine configuration: weight tables, scoring tables, logging

use crate::error::{EngineError, Result as EngineResult};
use crate::models::Component;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Tolerance for a weight table summing to 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Configuration for one strength cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Dynasty index weights for the team cohort
    pub team_weights: WeightTable,

    /// MVP race weights
    pub mvp_weights: WeightTable,

    /// Prospect ranking weights
    pub prospect_weights: WeightTable,

    /// Season weighting for history and playoff components
    pub history: HistoryConfig,

    /// Lookup tables for the categorical player components
    pub tables: ScoringTables,

    pub logging: LoggingConfig,
}

/// A versioned component weight set. Weights must sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    pub version: String,
    pub weights: BTreeMap<Component, f64>,
}

impl WeightTable {
    pub fn new(version: impl Into<String>, weights: &[(Component, f64)]) -> Self {
        Self { version: version.into(), weights: weights.iter().copied().collect() }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.weights.is_empty() {
            return Err(EngineError::invalid_weights(&self.version, "no components"));
        }
        for (component, weight) in &self.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(EngineError::invalid_weights(
                    &self.version,
                    format!("weight for {component} is {weight}"),
                ));
            }
        }
        let total: f64 = self.weights.values().sum();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(EngineError::invalid_weights(
                &self.version,
                format!("weights sum to {total}, expected 1.0"),
            ));
        }
        Ok(())
    }

    /// Highest-weighted component; ties go to the name that sorts first
    pub fn tie_break_component(&self) -> Option<Component> {
        self.weights
            .iter()
            .max_by(|(ca, wa), (cb, wb)| {
                wa.total_cmp(wb).then_with(|| cb.as_str().cmp(ca.as_str()))
            })
            .map(|(component, _)| *component)
    }

    pub fn components(&self) -> impl Iterator<Item = Component> + '_ {
        self.weights.keys().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Most recent season first
    pub season_weights: Vec<f64>,

    /// Points per playoff finish ("1st", "2nd", ...)
    pub playoff_points: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTables {
    /// Contract label (expiry year or "1st") to tier value
    pub contract_tiers: BTreeMap<String, f64>,
    pub contract_default: f64,

    /// Position code to scarcity value
    pub position_scarcity: BTreeMap<String, f64>,
    pub position_default: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (pretty, json, compact)
    pub format: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            team_weights: WeightTable::new(
                "ddi-v2",
                &[
                    (Component::Power, 0.35),
                    (Component::Prospects, 0.25),
                    (Component::History, 0.25),
                    (Component::Playoff, 0.15),
                ],
            ),
            mvp_weights: WeightTable::new(
                "mvp-v1",
                &[
                    (Component::FantasyPoints, 0.35),
                    (Component::PointsPerGame, 0.25),
                    (Component::Salary, 0.20),
                    (Component::Contract, 0.10),
                    (Component::Age, 0.10),
                ],
            ),
            prospect_weights: WeightTable::new("prospects-v1", &[(Component::ProspectScore, 1.0)]),
            history: HistoryConfig::default(),
            tables: ScoringTables::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            season_weights: vec![0.40, 0.30, 0.20, 0.10],
            playoff_points: [("1st", 30.0), ("2nd", 20.0), ("3rd", 10.0)]
                .into_iter()
                .map(|(place, points)| (place.to_string(), points))
                .collect(),
        }
    }
}

impl Default for ScoringTables {
    fn default() -> Self {
        let contract_tiers = [
            ("2050", 1.0),
            ("2045", 0.9),
            ("2040", 0.8),
            ("2035", 0.7),
            ("2029", 0.6),
            ("2028", 0.5),
            ("2027", 0.4),
            ("2026", 0.3),
            ("2025", 0.2),
            ("1st", 0.1),
        ];
        let position_scarcity = [
            ("C", 1.0),
            ("SS", 0.9),
            ("2B", 0.8),
            ("3B", 0.7),
            ("1B", 0.6),
            ("CF", 0.7),
            ("LF", 0.5),
            ("RF", 0.5),
            ("OF", 0.5),
            ("DH", 0.4),
            ("SP", 0.9),
            ("RP", 0.6),
            ("UT", 0.8),
        ];
        Self {
            contract_tiers: contract_tiers.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            contract_default: 0.1,
            position_scarcity: position_scarcity.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            position_default: 0.5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

impl EngineConfig {
    /// Validate every weight table and the logging settings
    pub fn validate(&self) -> EngineResult<()> {
        self.team_weights.validate()?;
        self.mvp_weights.validate()?;
        self.prospect_weights.validate()?;
        if self.history.season_weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(EngineError::invalid_weights("history", "negative season weight"));
        }
        Ok(())
    }
}

/// Load configuration from an optional TOML file, then environment variables
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => {
            tracing::debug!("Loading configuration from file: {:?}", path);
            load_from_file(path)?
        }
        None => EngineConfig::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config)?;
    Ok(config)
}

/// Load configuration from a TOML file
fn load_from_file(path: &Path) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {path:?}"))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config file: {path:?}"))
}

/// Apply `STRENGTH_*` overrides from a variable lookup
pub fn apply_overrides<F>(config: &mut EngineConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(level) = lookup("STRENGTH_LOG_LEVEL") {
        config.logging.level = level;
    }

    if let Some(format) = lookup("STRENGTH_LOG_FORMAT") {
        config.logging.format = format;
    }

    if let Some(version) = lookup("STRENGTH_TEAM_WEIGHTS_VERSION") {
        config.team_weights.version = version;
    }
}

fn validate_config(config: &EngineConfig) -> Result<()> {
    config.validate().context("Invalid weight configuration")?;

    match config.logging.level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow::anyhow!("Invalid log level: {}", config.logging.level)),
    }

    match config.logging.format.as_str() {
        "json" | "pretty" | "compact" => {}
        _ => return Err(anyhow::anyhow!("Invalid log format: {}", config.logging.format)),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_tables_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.team_weights.version, "ddi-v2");
        assert_eq!(config.team_weights.tie_break_component(), Some(Component::Power));
        assert_eq!(config.mvp_weights.tie_break_component(), Some(Component::FantasyPoints));
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let table = WeightTable::new("bad", &[(Component::Power, 0.5), (Component::History, 0.4)]);
        assert!(matches!(table.validate(), Err(EngineError::InvalidWeights { .. })));

        let negative = WeightTable::new(
            "negative",
            &[(Component::Power, 1.2), (Component::History, -0.2)],
        );
        assert!(negative.validate().is_err());

        let empty = WeightTable::new("empty", &[]);
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_tie_break_prefers_first_name_on_equal_weight() {
        let table = WeightTable::new(
            "even",
            &[(Component::Power, 0.5), (Component::History, 0.5)],
        );
        assert_eq!(table.tie_break_component(), Some(Component::History));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = EngineConfig::default();
        apply_overrides(&mut config, |key| match key {
            "STRENGTH_LOG_FORMAT" => Some("json".to_string()),
            "STRENGTH_TEAM_WEIGHTS_VERSION" => Some("ddi-v3".to_string()),
            _ => None,
        });
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.team_weights.version, "ddi-v3");
    }

    #[test]
    fn test_load_partial_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[prospect_weights]
version = "prospects-v2"

[prospect_weights.weights]
prospect_score = 1.0

[logging]
level = "debug"
"#
        )
        .unwrap();

        let config = load_from_file(file.path()).unwrap();
        assert_eq!(config.prospect_weights.version, "prospects-v2");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.team_weights, EngineConfig::default().team_weights);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_log_format_is_rejected() {
        let mut config = EngineConfig::default();
        config.logging.format = "xml".to_string();
        assert!(validate_config(&config).is_err());
    }
}
