//! Market data model
//!
//! Price observations, analysis periods and move directions shared by the
//! detectors, the confirmation state machine and the signal records.

mod period;

pub use period::{Period, PeriodDurations, UnknownPeriod};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a detected price move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Price went up
    Growth,
    /// Price went down
    Fall,
}

impl Direction {
    /// Direction of a signed change, `None` when flat
    pub fn from_change(change: Decimal) -> Option<Self> {
        if change > Decimal::ZERO {
            Some(Direction::Growth)
        } else if change < Decimal::ZERO {
            Some(Direction::Fall)
        } else {
            None
        }
    }

    /// `1` for growth, `-1` for fall
    pub fn sign(&self) -> Decimal {
        match self {
            Direction::Growth => Decimal::ONE,
            Direction::Fall => Decimal::NEGATIVE_ONE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Growth => "growth",
            Direction::Fall => "fall",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded market observation for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading symbol (e.g., "BTCUSDT")
    pub symbol: String,
    /// Last traded price
    pub price: Decimal,
    /// Rolling 24h volume
    #[serde(default)]
    pub volume_24h: Decimal,
    /// Open interest
    #[serde(default)]
    pub open_interest: Decimal,
    /// Current funding rate
    #[serde(default)]
    pub funding_rate: Decimal,
    /// Observation time
    pub timestamp: DateTime<Utc>,
    /// 24h high
    #[serde(default)]
    pub high_24h: Decimal,
    /// 24h low
    #[serde(default)]
    pub low_24h: Decimal,
}

impl PricePoint {
    /// Create a point carrying only price and volume
    pub fn new(
        symbol: impl Into<String>,
        price: Decimal,
        volume_24h: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            volume_24h,
            open_interest: Decimal::ZERO,
            funding_rate: Decimal::ZERO,
            timestamp,
            high_24h: price,
            low_24h: price,
        }
    }
}

/// Current market state for a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub price: Decimal,
    pub volume_24h: Decimal,
    pub open_interest: Decimal,
    pub funding_rate: Decimal,
}

impl From<&PricePoint> for Snapshot {
    fn from(point: &PricePoint) -> Self {
        Self {
            price: point.price,
            volume_24h: point.volume_24h,
            open_interest: point.open_interest,
            funding_rate: point.funding_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_direction_from_change() {
        assert_eq!(Direction::from_change(dec!(1.5)), Some(Direction::Growth));
        assert_eq!(Direction::from_change(dec!(-0.1)), Some(Direction::Fall));
        assert_eq!(Direction::from_change(Decimal::ZERO), None);
    }

    #[test]
    fn test_direction_serde() {
        let json = serde_json::to_string(&Direction::Fall).unwrap();
        assert_eq!(json, "\"fall\"");
        let parsed: Direction = serde_json::from_str("\"growth\"").unwrap();
        assert_eq!(parsed, Direction::Growth);
    }

    #[test]
    fn test_price_point_deserialize_minimal() {
        let json = r#"{"symbol":"BTCUSDT","price":"100.5","timestamp":"2024-01-01T00:00:00Z"}"#;
        let point: PricePoint = serde_json::from_str(json).unwrap();
        assert_eq!(point.price, dec!(100.5));
        assert_eq!(point.volume_24h, Decimal::ZERO);
    }

    #[test]
    fn test_snapshot_from_point() {
        let point = PricePoint::new("ETHUSDT", dec!(2500), dec!(1000000), Utc::now());
        let snapshot = Snapshot::from(&point);
        assert_eq!(snapshot.price, dec!(2500));
        assert_eq!(snapshot.volume_24h, dec!(1000000));
    }
}
