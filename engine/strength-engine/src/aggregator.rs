//! Composite scoring and cohort ranking
//!
//! Contributions are computed in exact decimal arithmetic. Each one is rounded
//! half-to-even to one decimal, and the published composite is the sum of the
//! rounded contributions so a breakdown always adds up to its composite.

use crate::config::WeightTable;
use crate::error::{EngineError, Result};
use crate::models::{Component, ComponentContribution, CompositeScore, ScoreComponents};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::cmp::Ordering;
use tracing::debug;

const SCORE_DP: u32 = 1;

/// Weighted sum plus total ordering over one cohort
#[derive(Debug, Clone)]
pub struct CompositeAggregator {
    version: String,
    weights: Vec<(Component, Decimal)>,
    tie_break: Component,
}

impl CompositeAggregator {
    pub fn new(table: &WeightTable) -> Result<Self> {
        table.validate()?;

        let mut weights = Vec::with_capacity(table.weights.len());
        for (component, weight) in &table.weights {
            let weight = Decimal::from_f64(*weight).ok_or_else(|| {
                EngineError::invalid_weights(
                    &table.version,
                    format!("weight for {component} is not representable"),
                )
            })?;
            weights.push((*component, weight));
        }

        let tie_break = table
            .tie_break_component()
            .ok_or_else(|| EngineError::invalid_weights(&table.version, "no components"))?;

        Ok(Self { version: table.version.clone(), weights, tie_break })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn tie_break_component(&self) -> Component {
        self.tie_break
    }

    pub fn components(&self) -> impl Iterator<Item = Component> + '_ {
        self.weights.iter().map(|(component, _)| *component)
    }

    /// Weighted composite for one entity; `rank` is filled in by `rank`
    ///
    /// The published composite is the sum of the contributions after each one
    /// is rounded half-to-even to one decimal, so the breakdown always adds up
    /// to it. That can differ from rounding `exact` directly by a few tenths:
    /// an exact 20.095 built from 10.045 and 10.05 publishes as 20.0.
    pub fn composite(&self, scores: &ScoreComponents) -> CompositeScore {
        let mut breakdown = Vec::with_capacity(self.weights.len());
        let mut exact = Decimal::ZERO;
        let mut rounded = Decimal::ZERO;

        for (component, weight) in &self.weights {
            let entry = scores.values.get(component);
            let value = entry
                .and_then(|v| Decimal::from_f64(v.value))
                .unwrap_or(Decimal::ZERO);
            let weighted = *weight * value;
            let contribution =
                weighted.round_dp_with_strategy(SCORE_DP, RoundingStrategy::MidpointNearestEven);

            exact += weighted;
            rounded += contribution;
            breakdown.push(ComponentContribution {
                component: *component,
                value,
                weight: *weight,
                contribution,
                missing: entry.map_or(true, |v| v.missing),
            });
        }

        let composite = rounded.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
        debug!("{} composite {} (exact {})", scores.entity_id, composite, exact);

        CompositeScore {
            entity_id: scores.entity_id.clone(),
            breakdown,
            weight_version: self.version.clone(),
            composite,
            exact,
            rank: 0,
        }
    }

    /// Composite every entity and order the cohort
    ///
    /// Order: composite descending, then the tie-break component's value
    /// descending, then entity ID ascending. Ranks are 1-based and unique.
    pub fn rank(&self, cohort: &[ScoreComponents]) -> Vec<CompositeScore> {
        let mut scores: Vec<CompositeScore> = cohort.iter().map(|s| self.composite(s)).collect();
        scores.sort_by(|a, b| self.compare(a, b));
        for (idx, score) in scores.iter_mut().enumerate() {
            score.rank = idx + 1;
        }
        scores
    }

    fn compare(&self, a: &CompositeScore, b: &CompositeScore) -> Ordering {
        b.composite
            .cmp(&a.composite)
            .then_with(|| {
                b.component_value(self.tie_break).cmp(&a.component_value(self.tie_break))
            })
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    }
}
