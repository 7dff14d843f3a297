//! In-memory bounded price history
//!
//! Keeps the most recent points per symbol. Acts as the "storage" tier for the
//! analysis passes and the volume-delta estimator.

use super::{FeedError, PriceHistorySource, SnapshotSource};
use crate::market::{Period, PricePoint, Snapshot};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

/// Default number of points retained per symbol
pub const DEFAULT_MAX_POINTS: usize = 50;

/// Append-only, per-symbol price series truncated to `max_points`
pub struct PriceHistory {
    max_points: usize,
    series: RwLock<HashMap<String, VecDeque<PricePoint>>>,
}

impl PriceHistory {
    pub fn new(max_points: usize) -> Self {
        Self {
            max_points: max_points.max(2),
            series: RwLock::new(HashMap::new()),
        }
    }

    /// Record a new observation
    ///
    /// Late points are inserted at their timestamp position so the series stays
    /// ascending. The oldest points are dropped once `max_points` is exceeded.
    pub async fn record(&self, point: PricePoint) {
        let mut series = self.series.write().await;
        let points = series.entry(point.symbol.clone()).or_default();

        match points.back() {
            Some(last) if point.timestamp < last.timestamp => {
                let idx = points.partition_point(|p| p.timestamp <= point.timestamp);
                points.insert(idx, point);
            }
            _ => points.push_back(point),
        }

        while points.len() > self.max_points {
            points.pop_front();
        }
    }

    /// Every retained point for a symbol
    pub async fn all(&self, symbol: &str) -> Vec<PricePoint> {
        let series = self.series.read().await;
        series
            .get(symbol)
            .map(|points| points.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of retained points for a symbol
    pub async fn len(&self, symbol: &str) -> usize {
        let series = self.series.read().await;
        series.get(symbol).map_or(0, VecDeque::len)
    }

    pub async fn is_empty(&self, symbol: &str) -> bool {
        self.len(symbol).await == 0
    }

    /// Symbols with at least one point
    pub async fn symbols(&self) -> Vec<String> {
        let series = self.series.read().await;
        let mut symbols: Vec<String> = series.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Drop a symbol's history
    pub async fn remove(&self, symbol: &str) {
        self.series.write().await.remove(symbol);
    }
}

impl Default for PriceHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POINTS)
    }
}

#[async_trait]
impl PriceHistorySource for PriceHistory {
    async fn get_series(&self, symbol: &str, period: Period) -> Result<Vec<PricePoint>, FeedError> {
        let series = self.series.read().await;
        let Some(points) = series.get(symbol) else {
            return Ok(Vec::new());
        };
        let Some(latest) = points.back() else {
            return Ok(Vec::new());
        };

        let cutoff = latest.timestamp - period.duration();
        Ok(points
            .iter()
            .filter(|p| p.timestamp >= cutoff)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SnapshotSource for PriceHistory {
    async fn get_current_snapshot(&self, symbol: &str) -> Result<Option<Snapshot>, FeedError> {
        let series = self.series.read().await;
        Ok(series
            .get(symbol)
            .and_then(|points| points.back())
            .map(Snapshot::from))
    }
}
