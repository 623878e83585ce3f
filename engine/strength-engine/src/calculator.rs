use crate::models::{Component, ComponentValue, ScoreComponents};
use player_registry::RegistrySnapshot;

/// A pure component calculator over one cohort
///
/// `raw_metrics` returns one entry per cohort member, in cohort order; `None`
/// means the entity has no data for this component. Raw metrics are turned
/// into 0-100 scores relative to the cohort maximum by `relative_scores`.
pub trait ComponentCalculator<E> {
    fn component(&self) -> Component;

    fn raw_metrics(&self, cohort: &[&E], snapshot: &RegistrySnapshot) -> Vec<Option<f64>>;
}

/// `100 * raw / max(raw)`, floor-clamped at 0
///
/// Missing metrics score 0 and are flagged. A cohort whose maximum is not
/// positive scores 0 for everyone.
pub fn relative_scores(raw: &[Option<f64>]) -> Vec<ComponentValue> {
    let max = raw
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))));

    raw.iter()
        .map(|metric| match metric {
            Some(value) if value.is_finite() => {
                let scaled = match max {
                    Some(max) if max > 0.0 => (100.0 * value / max).clamp(0.0, 100.0),
                    _ => 0.0,
                };
                ComponentValue { value: scaled, raw: Some(*value), missing: false }
            }
            _ => ComponentValue::missing(),
        })
        .collect()
}

/// Lower-is-better metrics become `cohort_max - value`
pub fn invert_against_max(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let max = values.iter().flatten().copied().fold(f64::NEG_INFINITY, f64::max);
    values.iter().map(|v| v.map(|v| max - v)).collect()
}

/// Run every calculator over a cohort
pub fn score_cohort<E, F>(
    calculators: &[Box<dyn ComponentCalculator<E>>],
    cohort: &[&E],
    snapshot: &RegistrySnapshot,
    entity_id: F,
) -> Vec<ScoreComponents>
where
    F: Fn(&E) -> String,
{
    let mut scores: Vec<ScoreComponents> =
        cohort.iter().map(|entity| ScoreComponents::new(entity_id(entity))).collect();

    for calculator in calculators {
        let raw = calculator.raw_metrics(cohort, snapshot);
        let values = relative_scores(&raw);
        for (score, value) in scores.iter_mut().zip(values) {
            score.values.insert(calculator.component(), value);
        }
    }
    scores
}
