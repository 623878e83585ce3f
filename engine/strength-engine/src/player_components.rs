//! Player cohort components: prospect and MVP stat values

use crate::calculator::{invert_against_max, ComponentCalculator};
use crate::config::ScoringTables;
use crate::models::Component;
use player_registry::{CanonicalPlayer, RegistrySnapshot};
use std::collections::BTreeMap;

/// Whether a larger stat is better
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// A component read straight from one numeric attribute
pub struct AttributeCalculator {
    component: Component,
    attribute: &'static str,
    direction: Direction,
}

impl AttributeCalculator {
    pub fn new(component: Component, attribute: &'static str, direction: Direction) -> Self {
        Self { component, attribute, direction }
    }

    pub fn for_component(component: Component) -> Option<Self> {
        let (attribute, direction) = match component {
            Component::ProspectScore => ("prospect_score", Direction::HigherIsBetter),
            Component::FantasyPoints => ("fantasy_points", Direction::HigherIsBetter),
            Component::PointsPerGame => ("points_per_game", Direction::HigherIsBetter),
            Component::Salary => ("salary", Direction::LowerIsBetter),
            Component::Age => ("age", Direction::LowerIsBetter),
            _ => return None,
        };
        Some(Self::new(component, attribute, direction))
    }
}

impl ComponentCalculator<CanonicalPlayer> for AttributeCalculator {
    fn component(&self) -> Component {
        self.component
    }

    fn raw_metrics(&self, cohort: &[&CanonicalPlayer], _: &RegistrySnapshot) -> Vec<Option<f64>> {
        let values: Vec<Option<f64>> = cohort.iter().map(|p| p.number(self.attribute)).collect();
        match self.direction {
            Direction::HigherIsBetter => values,
            Direction::LowerIsBetter => invert_against_max(&values),
        }
    }
}

/// Contract length tier
pub struct ContractCalculator {
    tiers: BTreeMap<String, f64>,
    default: f64,
}

impl ContractCalculator {
    pub fn new(tables: &ScoringTables) -> Self {
        Self {
            tiers: tables
                .contract_tiers
                .iter()
                .map(|(label, value)| (label.trim().to_lowercase(), *value))
                .collect(),
            default: tables.contract_default,
        }
    }

    pub fn tier(&self, contract: &str) -> f64 {
        self.tiers.get(&contract.trim().to_lowercase()).copied().unwrap_or(self.default)
    }
}

impl ComponentCalculator<CanonicalPlayer> for ContractCalculator {
    fn component(&self) -> Component {
        Component::Contract
    }

    fn raw_metrics(&self, cohort: &[&CanonicalPlayer], _: &RegistrySnapshot) -> Vec<Option<f64>> {
        cohort.iter().map(|p| p.text("contract").map(|c| self.tier(c))).collect()
    }
}

/// Best scarcity value across a player's positions
pub struct PositionScarcityCalculator {
    values: BTreeMap<String, f64>,
    default: f64,
}

impl PositionScarcityCalculator {
    pub fn new(tables: &ScoringTables) -> Self {
        Self {
            values: tables
                .position_scarcity
                .iter()
                .map(|(position, value)| (position.trim().to_uppercase(), *value))
                .collect(),
            default: tables.position_default,
        }
    }

    pub fn scarcity<'a, I>(&self, positions: I) -> Option<f64>
    where
        I: IntoIterator<Item = &'a String>,
    {
        positions
            .into_iter()
            .map(|p| self.values.get(p).copied().unwrap_or(self.default))
            .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v))))
    }
}

impl ComponentCalculator<CanonicalPlayer> for PositionScarcityCalculator {
    fn component(&self) -> Component {
        Component::PositionScarcity
    }

    fn raw_metrics(&self, cohort: &[&CanonicalPlayer], _: &RegistrySnapshot) -> Vec<Option<f64>> {
        cohort.iter().map(|p| self.scarcity(&p.positions)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use player_registry::{CanonicalId, MergedAttribute, PlayerRegistry, TeamDirectory};
    use source_records::{
        AttributeKey, AttributeValue, RecordKind, RecordRef, SourcePriority, TeamReferenceRow,
    };

    fn player(id: &str, attributes: &[(&str, AttributeValue)], positions: &[&str]) -> CanonicalPlayer {
        let mut player = CanonicalPlayer::new(
            CanonicalId::new(id),
            id.to_string(),
            id.to_string(),
            SourcePriority::MVP_LIST,
        );
        for (name, value) in attributes {
            player.attributes.insert(
                AttributeKey::new(*name),
                MergedAttribute::new(
                    value.clone(),
                    RecordRef { source: "mvp.csv".to_string(), kind: RecordKind::MvpRow, line: 0 },
                    SourcePriority::MVP_LIST,
                ),
            );
        }
        player.positions = positions.iter().map(|p| p.to_string()).collect();
        player
    }

    fn snapshot() -> RegistrySnapshot {
        let directory = TeamDirectory::new(vec![TeamReferenceRow {
            team_id: "t1".to_string(),
            name: "Team One".to_string(),
            short_code: "T1".to_string(),
            logo: None,
            aliases: vec![],
        }])
        .unwrap();
        PlayerRegistry::new(directory).freeze()
    }

    #[test]
    fn test_lower_salary_scores_higher() {
        let cheap = player("a", &[("salary", AttributeValue::Number(5.0))], &[]);
        let pricey = player("b", &[("salary", AttributeValue::Number(30.0))], &[]);
        let unknown = player("c", &[], &[]);
        let calculator = AttributeCalculator::for_component(Component::Salary).unwrap();

        let raw = calculator.raw_metrics(&[&cheap, &pricey, &unknown], &snapshot());
        assert_eq!(raw, vec![Some(25.0), Some(0.0), None]);
    }

    #[test]
    fn test_team_components_have_no_attribute_calculator() {
        assert!(AttributeCalculator::for_component(Component::Power).is_none());
        assert!(AttributeCalculator::for_component(Component::Contract).is_none());
    }

    #[test]
    fn test_contract_tiers() {
        let calculator = ContractCalculator::new(&ScoringTables::default());
        assert_eq!(calculator.tier("2050"), 1.0);
        assert_eq!(calculator.tier("1st"), 0.1);
        assert_eq!(calculator.tier("2031"), 0.1);

        let signed = player("a", &[("contract", AttributeValue::Text("2045".to_string()))], &[]);
        let unsigned = player("b", &[], &[]);
        let raw = calculator.raw_metrics(&[&signed, &unsigned], &snapshot());
        assert_eq!(raw, vec![Some(0.9), None]);
    }

    #[test]
    fn test_position_scarcity_takes_best_position() {
        let calculator = PositionScarcityCalculator::new(&ScoringTables::default());
        let catcher = player("a", &[], &["1B", "C"]);
        let mystery = player("b", &[], &["XX"]);
        let none = player("c", &[], &[]);

        let raw = calculator.raw_metrics(&[&catcher, &mystery, &none], &snapshot());
        assert_eq!(raw, vec![Some(1.0), Some(0.5), None]);
    }
}
