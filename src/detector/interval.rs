//! Interval detection: the tightest window explaining each move
//!
//! Every `(i, j)` pair is a candidate. A candidate is dropped when an inner
//! sub-interval `(i, k)` or `(k, j)` in the same direction already carries at
//! least 90% of its magnitude, and when it sits strictly inside another
//! surviving candidate of the same direction.

use super::window::{Candidate, Series};
use super::{Algorithm, ChangeResult, DetectorConfig};
use crate::confidence::ConfidenceScorer;
use crate::market::Direction;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Share of a move an inner interval must reproduce to make the outer one redundant
const REDUNDANCY_RATIO: Decimal = dec!(0.9);

pub(crate) fn detect(
    series: &Series<'_>,
    config: &DetectorConfig,
    scorer: &ConfidenceScorer,
) -> Vec<ChangeResult> {
    let n = series.len();
    let mut candidates = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            let Some(change) = series.change(i, j) else {
                continue;
            };
            if change.abs() < config.min_change_percent {
                continue;
            }
            let Some(direction) = Direction::from_change(change) else {
                continue;
            };
            if explained_by_inner(series, i, j, change) {
                continue;
            }
            candidates.push(Candidate {
                algorithm: Algorithm::Interval,
                start: i,
                end: j,
                change_percent: change,
                direction,
            });
        }
    }

    let survivors: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| !nested_in_other(c, &candidates))
        .collect();

    survivors
        .into_iter()
        .map(|c| series.measure(*c, scorer, config))
        .filter(|r| r.confidence >= config.min_confidence)
        .collect()
}

/// Whether a same-direction inner sub-interval reproduces ≥90% of the move
fn explained_by_inner(series: &Series<'_>, i: usize, j: usize, change: Decimal) -> bool {
    let threshold = change.abs() * REDUNDANCY_RATIO;
    let same_direction = |sub: Decimal| sub.is_sign_negative() == change.is_sign_negative();

    for k in (i + 1)..j {
        for sub in [series.change(i, k), series.change(k, j)].into_iter().flatten() {
            if !sub.is_zero() && same_direction(sub) && sub.abs() >= threshold {
                return true;
            }
        }
    }
    false
}

fn nested_in_other(candidate: &Candidate, all: &[Candidate]) -> bool {
    all.iter().any(|other| {
        other.direction == candidate.direction
            && other.start <= candidate.start
            && candidate.end <= other.end
            && (other.start, other.end) != (candidate.start, candidate.end)
    })
}
