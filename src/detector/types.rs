//! Change detection types

use crate::market::Direction;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Detection algorithm that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Adjacent-pair spike
    Single,
    /// Tightest interval explaining a move
    Interval,
    /// Sustained run of same-direction steps
    Continuous,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Single => "single",
            Algorithm::Interval => "interval",
            Algorithm::Continuous => "continuous",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds shared by the three algorithms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Minimum confidence (0..=100) for a result to be emitted
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Minimum absolute change in percent (1.0 = 1%)
    #[serde(default = "default_min_change_percent")]
    pub min_change_percent: Decimal,

    /// Continuity ratio a run must exceed, 0..=1
    #[serde(default = "default_continuity_threshold")]
    pub continuity_threshold: f64,

    /// Multiplier on the volume confidence term
    #[serde(default = "default_volume_weight")]
    pub volume_weight: f64,
}

fn default_min_confidence() -> f64 {
    50.0
}
fn default_min_change_percent() -> Decimal {
    Decimal::ONE // 1%
}
fn default_continuity_threshold() -> f64 {
    0.7
}
fn default_volume_weight() -> f64 {
    1.0
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_confidence: 50.0,
            min_change_percent: Decimal::ONE,
            continuity_threshold: 0.7,
            volume_weight: 1.0,
        }
    }
}

/// A qualifying move found in one series
///
/// Immutable once built; consumed to assemble a signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeResult {
    pub symbol: String,
    pub algorithm: Algorithm,
    pub direction: Direction,
    /// Signed change in percent
    pub change_percent: Decimal,
    /// Confidence in [0, 100]
    pub confidence: f64,
    /// Minutes between the first and last point of the move
    pub period_minutes: i64,
    pub data_points: usize,
    pub start_price: Decimal,
    pub end_price: Decimal,
    pub avg_volume: Decimal,
    pub is_continuous: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Measurements the confidence was computed from
    pub indicators: BTreeMap<String, f64>,
}

impl ChangeResult {
    pub fn abs_change(&self) -> Decimal {
        self.change_percent.abs()
    }

    pub fn continuity_ratio(&self) -> Option<f64> {
        self.indicators.get("continuity_ratio").copied()
    }
}
