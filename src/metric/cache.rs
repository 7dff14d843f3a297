//! TTL cache over the metric fallback chain

use super::{
    MetricCacheEntry, MetricError, MetricEstimator, MetricSource, MetricValue, SyntheticEstimator,
};
use crate::clock::{saturating_add, saturating_seconds, Clock};
use crate::market::Direction;
use crate::telemetry::record_metric_source;
use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Metric cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of a cached value (seconds)
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Upper bound on each live or storage tier call (milliseconds)
    #[serde(default = "default_tier_timeout_ms")]
    pub tier_timeout_ms: u64,

    /// Base volume for emulation when no snapshot is available
    #[serde(default = "default_base_volume")]
    pub default_base_volume: Decimal,
}

fn default_ttl_secs() -> u64 {
    30
}

fn default_tier_timeout_ms() -> u64 {
    3_000
}

fn default_base_volume() -> Decimal {
    dec!(1000000)
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            tier_timeout_ms: default_tier_timeout_ms(),
            default_base_volume: default_base_volume(),
        }
    }
}

/// Cached volume-delta lookups with api → storage → emulated fallback
///
/// Lookups never hold the lock across an estimator call. Two callers missing
/// the same key concurrently may both compute; the later write wins.
pub struct MetricCache {
    entries: RwLock<HashMap<String, MetricCacheEntry>>,
    live: Option<Arc<dyn MetricEstimator>>,
    storage: Option<Arc<dyn MetricEstimator>>,
    synthetic: SyntheticEstimator,
    ttl: Duration,
    tier_timeout: std::time::Duration,
    clock: Arc<dyn Clock>,
}

impl MetricCache {
    /// Cache with only the emulated tier configured
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let synthetic = SyntheticEstimator::new(config.default_base_volume, clock.clone());
        Self {
            entries: RwLock::new(HashMap::new()),
            live: None,
            storage: None,
            synthetic,
            ttl: saturating_seconds(config.ttl_secs),
            tier_timeout: std::time::Duration::from_millis(config.tier_timeout_ms),
            clock,
        }
    }

    /// Set the live API tier
    pub fn with_live(mut self, estimator: Arc<dyn MetricEstimator>) -> Self {
        self.live = Some(estimator);
        self
    }

    /// Set the storage tier
    pub fn with_storage(mut self, estimator: Arc<dyn MetricEstimator>) -> Self {
        self.storage = Some(estimator);
        self
    }

    /// Replace the emulated tier
    pub fn with_synthetic(mut self, estimator: SyntheticEstimator) -> Self {
        self.synthetic = estimator;
        self
    }

    fn key(symbol: &str, direction: Direction) -> String {
        format!("{}:{}", symbol, direction)
    }

    /// Cached value if present and unexpired
    pub async fn get(&self, symbol: &str, direction: Direction) -> Option<MetricValue> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        entries
            .get(&Self::key(symbol, direction))
            .filter(|entry| !entry.is_expired(now))
            .map(MetricCacheEntry::to_value)
    }

    /// Cached value, or the first tier that succeeds
    ///
    /// Every tier failing still yields an emulated value.
    pub async fn get_with_fallback(&self, symbol: &str, direction: Direction) -> MetricValue {
        if let Some(cached) = self.get(symbol, direction).await {
            tracing::trace!(symbol, direction = %direction, source = %cached.source, "Metric cache hit");
            return cached;
        }

        let (value, source) = match self.resolve(symbol, direction).await {
            Some(found) => found,
            None => (
                self.synthetic.emulated(symbol, direction).await,
                MetricSource::Emulated,
            ),
        };

        let computed_at = self.clock.now();
        let entry = MetricCacheEntry {
            value,
            source,
            computed_at,
            expires_at: saturating_add(computed_at, self.ttl),
        };
        let result = entry.to_value();

        self.entries
            .write()
            .await
            .insert(Self::key(symbol, direction), entry);

        record_metric_source(source);
        if source == MetricSource::Emulated {
            tracing::info!(symbol, direction = %direction, value = %value, "Using emulated metric");
        }

        result
    }

    async fn resolve(&self, symbol: &str, direction: Direction) -> Option<(Decimal, MetricSource)> {
        for estimator in [&self.live, &self.storage].into_iter().flatten() {
            match self.try_tier(estimator.as_ref(), symbol, direction).await {
                Ok(value) => return Some((value, estimator.source())),
                Err(e) => {
                    tracing::debug!(
                        symbol,
                        source = %estimator.source(),
                        error = %e,
                        "Metric tier failed, falling back"
                    );
                }
            }
        }
        None
    }

    async fn try_tier(
        &self,
        estimator: &dyn MetricEstimator,
        symbol: &str,
        direction: Direction,
    ) -> Result<Decimal, MetricError> {
        tokio::time::timeout(self.tier_timeout, estimator.estimate(symbol, direction))
            .await
            .map_err(|_| MetricError::Timeout(self.tier_timeout))?
    }

    /// Drop a cached value
    pub async fn invalidate(&self, symbol: &str, direction: Direction) {
        self.entries
            .write()
            .await
            .remove(&Self::key(symbol, direction));
    }

    /// Remove expired entries and entries computed more than `max_age` ago
    pub async fn cleanup(&self, max_age: Duration) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now) && now - entry.computed_at <= max_age);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
