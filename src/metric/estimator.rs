//! Metric estimator tiers

use super::{MetricError, MetricEstimator, MetricSource};
use crate::clock::Clock;
use crate::feed::{LiveMetricSource, PriceHistorySource, SnapshotSource};
use crate::market::{Direction, Period};
use async_trait::async_trait;
use chrono::Timelike;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

/// Largest share of the base volume an emulated value may take
pub const MAX_EMULATED_SHARE: Decimal = dec!(0.05);

/// Tier 1: realtime metric from the exchange
pub struct LiveEstimator {
    source: Arc<dyn LiveMetricSource>,
}

impl LiveEstimator {
    pub fn new(source: Arc<dyn LiveMetricSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl MetricEstimator for LiveEstimator {
    fn source(&self) -> MetricSource {
        MetricSource::Api
    }

    async fn estimate(&self, symbol: &str, _direction: Direction) -> Result<Decimal, MetricError> {
        Ok(self.source.get_realtime_metric(symbol).await?)
    }
}

/// Window the storage tier reads its volume change from
const STORAGE_WINDOW: Period = Period::M5;

/// Tier 2: change in recorded 24h volume across the last 5m
pub struct StorageVolumeEstimator {
    history: Arc<dyn PriceHistorySource>,
}

impl StorageVolumeEstimator {
    pub fn new(history: Arc<dyn PriceHistorySource>) -> Self {
        Self { history }
    }
}

#[async_trait]
impl MetricEstimator for StorageVolumeEstimator {
    fn source(&self) -> MetricSource {
        MetricSource::Storage
    }

    async fn estimate(&self, symbol: &str, _direction: Direction) -> Result<Decimal, MetricError> {
        let series = self.history.get_series(symbol, STORAGE_WINDOW).await?;
        match (series.first(), series.last()) {
            (Some(first), Some(last)) if series.len() >= 2 => {
                Ok(last.volume_24h.saturating_sub(first.volume_24h))
            }
            _ => Err(MetricError::InsufficientData {
                symbol: symbol.to_string(),
                points: series.len(),
            }),
        }
    }
}

/// Tier 3: deterministic synthetic estimate
///
/// A fixed share (1-5%) of an estimated base volume, picked from the symbol
/// length and the current UTC hour, signed by direction and clamped to ±5% of
/// the base. Values from this tier carry no market information.
pub struct SyntheticEstimator {
    snapshots: Option<Arc<dyn SnapshotSource>>,
    default_base_volume: Decimal,
    clock: Arc<dyn Clock>,
}

impl SyntheticEstimator {
    pub fn new(default_base_volume: Decimal, clock: Arc<dyn Clock>) -> Self {
        Self {
            snapshots: None,
            default_base_volume: default_base_volume.max(Decimal::ZERO),
            clock,
        }
    }

    /// Take the base volume from current snapshots when available
    pub fn with_snapshots(mut self, snapshots: Arc<dyn SnapshotSource>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    /// Base volume the synthetic share applies to
    pub async fn base_volume(&self, symbol: &str) -> Decimal {
        if let Some(snapshots) = &self.snapshots {
            match snapshots.get_current_snapshot(symbol).await {
                Ok(Some(snapshot)) if snapshot.volume_24h > Decimal::ZERO => {
                    return snapshot.volume_24h;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(symbol, error = %e, "Snapshot unavailable for base volume");
                }
            }
        }
        self.default_base_volume
    }

    /// Pure emulation rule
    pub fn emulate(symbol: &str, direction: Direction, base_volume: Decimal, hour: u32) -> Decimal {
        let base = base_volume.max(Decimal::ZERO);
        let step = (symbol.len() as u64 * 7 + u64::from(hour)) % 5 + 1;
        let share = Decimal::from(step) / dec!(100);
        let limit = base.saturating_mul(MAX_EMULATED_SHARE);

        let value = base.saturating_mul(share) * direction.sign();
        value.clamp(-limit, limit)
    }

    /// Always succeeds
    pub async fn emulated(&self, symbol: &str, direction: Direction) -> Decimal {
        let base = self.base_volume(symbol).await;
        let hour = self.clock.now().hour();
        Self::emulate(symbol, direction, base, hour)
    }
}

#[async_trait]
impl MetricEstimator for SyntheticEstimator {
    fn source(&self) -> MetricSource {
        MetricSource::Emulated
    }

    async fn estimate(&self, symbol: &str, direction: Direction) -> Result<Decimal, MetricError> {
        Ok(self.emulated(symbol, direction).await)
    }
}
