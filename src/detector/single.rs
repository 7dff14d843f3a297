//! Single-step detection: adjacent-pair spikes

use super::window::{Candidate, Series};
use super::{Algorithm, ChangeResult, DetectorConfig};
use crate::confidence::ConfidenceScorer;
use crate::market::Direction;

pub(crate) fn detect(
    series: &Series<'_>,
    config: &DetectorConfig,
    scorer: &ConfidenceScorer,
) -> Vec<ChangeResult> {
    let mut results = Vec::new();

    for i in 1..series.len() {
        let Some(change) = series.change(i - 1, i) else {
            continue;
        };
        if change.abs() < config.min_change_percent {
            continue;
        }
        let Some(direction) = Direction::from_change(change) else {
            continue;
        };

        let candidate = Candidate {
            algorithm: Algorithm::Single,
            start: i - 1,
            end: i,
            change_percent: change,
            direction,
        };
        let result = series.measure(candidate, scorer, config);
        if result.confidence >= config.min_confidence {
            results.push(result);
        }
    }

    results
}
