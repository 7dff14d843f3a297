//! Derived per-symbol metric (volume delta) with provenance
//!
//! [`MetricCache`] answers from a TTL-bounded cache or walks a fixed fallback
//! chain: live API, storage-derived estimate, deterministic emulation. The
//! chain always produces a value and tags it with the tier it came from.

mod cache;
mod estimator;

pub use cache::{CacheConfig, MetricCache};
pub use estimator::{LiveEstimator, StorageVolumeEstimator, SyntheticEstimator};

use crate::feed::FeedError;
use crate::market::Direction;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Tier a metric value came from, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricSource {
    /// Exchange realtime data
    Api,
    /// Estimated from recorded history
    Storage,
    /// Synthetic estimate, no real data behind it
    Emulated,
}

impl MetricSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricSource::Api => "api",
            MetricSource::Storage => "storage",
            MetricSource::Emulated => "emulated",
        }
    }
}

impl fmt::Display for MetricSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric value with its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    pub value: Decimal,
    pub source: MetricSource,
    pub computed_at: DateTime<Utc>,
}

/// Cached value; absent once `now > expires_at`
#[derive(Debug, Clone, PartialEq)]
pub struct MetricCacheEntry {
    pub value: Decimal,
    pub source: MetricSource,
    pub computed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl MetricCacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn to_value(&self) -> MetricValue {
        MetricValue {
            value: self.value,
            source: self.source,
            computed_at: self.computed_at,
        }
    }
}

/// Errors from a single estimator tier
#[derive(Debug, Error)]
pub enum MetricError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error("Not enough history for {symbol}: {points} points")]
    InsufficientData { symbol: String, points: usize },
    #[error("Estimator timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// One tier of the fallback chain
#[async_trait]
pub trait MetricEstimator: Send + Sync {
    /// Tier this estimator represents
    fn source(&self) -> MetricSource;

    async fn estimate(&self, symbol: &str, direction: Direction) -> Result<Decimal, MetricError>;
}
