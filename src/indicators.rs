//! Technical indicators attached to published signals

use crate::market::PricePoint;
use ta::indicators::{MovingAverageConvergenceDivergence, RelativeStrengthIndex};
use ta::Next;

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// Indicator values at the last point of a series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
}

impl IndicatorSnapshot {
    /// Named values in the layout signals carry
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("rsi", self.rsi),
            ("macd", self.macd),
            ("macd_signal", self.macd_signal),
            ("macd_histogram", self.macd_histogram),
        ]
    }
}

/// RSI(14) and MACD(12, 26, 9) over closing prices
///
/// Fed bar by bar; short series give warm-up values. `None` for an empty series.
pub fn compute(closes: &[f64]) -> Option<IndicatorSnapshot> {
    if closes.is_empty() {
        return None;
    }

    let mut rsi = RelativeStrengthIndex::new(RSI_PERIOD).ok()?;
    let mut macd = MovingAverageConvergenceDivergence::new(MACD_FAST, MACD_SLOW, MACD_SIGNAL).ok()?;

    let mut snapshot = None;
    for &close in closes.iter().filter(|c| c.is_finite()) {
        let rsi_value = rsi.next(close);
        let macd_value = macd.next(close);
        snapshot = Some(IndicatorSnapshot {
            rsi: rsi_value,
            macd: macd_value.macd,
            macd_signal: macd_value.signal,
            macd_histogram: macd_value.histogram,
        });
    }
    snapshot
}

/// Indicators over a price series
pub fn from_points(points: &[PricePoint]) -> Option<IndicatorSnapshot> {
    let closes: Vec<f64> = points
        .iter()
        .map(|p| f64::try_from(p.price).unwrap_or(0.0))
        .collect();
    compute(&closes)
}
