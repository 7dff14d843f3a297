//! Continuous detection: sustained same-direction runs
//!
//! From each start the longest run of at least three points whose continuity
//! ratio exceeds the threshold is taken. After an emitted run the scan resumes
//! at the run's last point, so consecutive runs never share a step.

use super::window::{Candidate, Series};
use super::{Algorithm, ChangeResult, DetectorConfig};
use crate::confidence::ConfidenceScorer;
use crate::market::Direction;

/// Minimum number of points in a run
pub const MIN_RUN_POINTS: usize = 3;

pub(crate) fn detect(
    series: &Series<'_>,
    config: &DetectorConfig,
    scorer: &ConfidenceScorer,
) -> Vec<ChangeResult> {
    let n = series.len();
    let mut results = Vec::new();
    let mut start = 0;

    while start + MIN_RUN_POINTS <= n {
        match longest_run(series, start, config) {
            Some(candidate) => {
                let result = series.measure(candidate, scorer, config);
                if result.confidence >= config.min_confidence {
                    results.push(result);
                    start = candidate.end;
                } else {
                    start += 1;
                }
            }
            None => start += 1,
        }
    }

    results
}

/// Longest qualifying run beginning at `start`
fn longest_run(series: &Series<'_>, start: usize, config: &DetectorConfig) -> Option<Candidate> {
    let mut best = None;

    for end in (start + MIN_RUN_POINTS - 1)..series.len() {
        let Some(change) = series.change(start, end) else {
            // non-positive base price, nothing starting here is comparable
            return None;
        };
        if change.abs() < config.min_change_percent {
            continue;
        }
        let Some(direction) = Direction::from_change(change) else {
            continue;
        };
        if series.continuity(start, end, direction) > config.continuity_threshold {
            best = Some(Candidate {
                algorithm: Algorithm::Continuous,
                start,
                end,
                change_percent: change,
                direction,
            });
        }
    }

    best
}
