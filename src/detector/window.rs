//! Measurement of a candidate window `[start..=end]` of a series

use super::{Algorithm, ChangeResult, DetectorConfig};
use crate::confidence::{stats, ConfidenceScorer, ScoreInputs};
use crate::market::{Direction, PricePoint};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

/// Percent change from `base` to `end`, `None` when `base` is not positive
pub(crate) fn pct_change(base: Decimal, end: Decimal) -> Option<Decimal> {
    if base <= Decimal::ZERO {
        return None;
    }
    end.checked_sub(base)
        .and_then(|diff| diff.checked_div(base))
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
}

pub(crate) fn to_f64(value: Decimal) -> f64 {
    f64::try_from(value).unwrap_or(0.0)
}

/// A window that passed an algorithm's magnitude rule
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub algorithm: Algorithm,
    pub start: usize,
    pub end: usize,
    pub change_percent: Decimal,
    pub direction: Direction,
}

/// Series prepared once per scan
pub(crate) struct Series<'a> {
    pub points: &'a [PricePoint],
    pub prices: Vec<f64>,
}

impl<'a> Series<'a> {
    pub fn new(points: &'a [PricePoint]) -> Self {
        let prices = points.iter().map(|p| to_f64(p.price)).collect();
        Self { points, prices }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Percent change between two indices
    pub fn change(&self, start: usize, end: usize) -> Option<Decimal> {
        pct_change(self.points[start].price, self.points[end].price)
    }

    pub fn continuity(&self, start: usize, end: usize, direction: Direction) -> f64 {
        stats::continuity_ratio(&self.prices[start..=end], to_f64(direction.sign()))
    }

    /// Measure and score the window; the caller applies the thresholds
    pub fn measure(
        &self,
        candidate: Candidate,
        scorer: &ConfidenceScorer,
        config: &DetectorConfig,
    ) -> ChangeResult {
        let Candidate {
            algorithm,
            start,
            end,
            change_percent,
            direction,
        } = candidate;
        let window = &self.points[start..=end];
        let prices = &self.prices[start..=end];
        let first = &window[0];
        let last = &window[window.len() - 1];

        let volume_sum = window
            .iter()
            .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.volume_24h));
        let avg_volume = volume_sum / Decimal::from(window.len());

        let elapsed_minutes =
            ((last.timestamp - first.timestamp).num_milliseconds() as f64 / 60_000.0).max(0.0);
        let volatility_pct = stats::volatility_pct(prices);
        let continuity_ratio = self.continuity(start, end, direction);
        let trend_strength = stats::trend_strength(prices);

        let inputs = ScoreInputs {
            change_percent: to_f64(change_percent),
            avg_volume: to_f64(avg_volume),
            elapsed_minutes,
            volatility_pct,
            data_points: window.len(),
            continuity_ratio,
            trend_strength,
        };
        let confidence = scorer.score(algorithm, &inputs);

        let is_continuous = match algorithm {
            Algorithm::Single => false,
            Algorithm::Interval => continuity_ratio >= config.continuity_threshold,
            Algorithm::Continuous => true,
        };

        let mut indicators = BTreeMap::new();
        indicators.insert("volatility_pct".to_string(), volatility_pct);
        indicators.insert("elapsed_minutes".to_string(), elapsed_minutes);
        indicators.insert("avg_volume".to_string(), inputs.avg_volume);
        if algorithm != Algorithm::Single {
            indicators.insert("continuity_ratio".to_string(), continuity_ratio);
            indicators.insert("trend_strength".to_string(), trend_strength);
        }

        ChangeResult {
            symbol: first.symbol.clone(),
            algorithm,
            direction,
            change_percent,
            confidence,
            period_minutes: elapsed_minutes.round() as i64,
            data_points: window.len(),
            start_price: first.price,
            end_price: last.price,
            avg_volume,
            is_continuous,
            start_time: first.timestamp,
            end_time: last.timestamp,
            indicators,
        }
    }
}
