//! Signal types

use crate::detector::{Algorithm, ChangeResult};
use crate::market::{Direction, Period};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A confirmed directional move, published once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Unique signal identifier
    pub id: Uuid,
    pub symbol: String,
    pub direction: Direction,
    /// Algorithm whose result triggered the signal
    pub algorithm: Algorithm,
    /// Signed change in percent
    pub change_percent: Decimal,
    /// Confidence in [0, 100]
    pub confidence: f64,
    /// Analysis period the move was confirmed on
    pub period: Period,
    pub data_points: usize,
    pub start_price: Decimal,
    pub end_price: Decimal,
    /// Confirmation count when the signal fired
    pub confirmations: u32,
    /// Signal generation timestamp
    pub timestamp: DateTime<Utc>,
    /// Detector measurements plus enrichment (RSI, MACD, volume delta)
    pub indicators: BTreeMap<String, f64>,
    /// Free-form labels, e.g. `volume_source:storage`
    pub tags: Vec<String>,
}

impl Signal {
    /// Build a signal from a detection result
    pub fn from_result(
        result: &ChangeResult,
        period: Period,
        confirmations: u32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: result.symbol.clone(),
            direction: result.direction,
            algorithm: result.algorithm,
            change_percent: result.change_percent,
            confidence: result.confidence,
            period,
            data_points: result.data_points,
            start_price: result.start_price,
            end_price: result.end_price,
            confirmations,
            timestamp,
            indicators: result.indicators.clone(),
            tags: vec![format!("algorithm:{}", result.algorithm)],
        }
    }

    /// Add or replace an indicator value; non-finite values are skipped
    pub fn with_indicator(mut self, name: impl Into<String>, value: f64) -> Self {
        if value.is_finite() {
            self.indicators.insert(name.into(), value);
        }
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn indicator(&self, name: &str) -> Option<f64> {
        self.indicators.get(name).copied()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
