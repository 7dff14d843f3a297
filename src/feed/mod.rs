//! Market data sources
//!
//! Capability traits the engine consumes, an in-memory bounded price history
//! and a Bybit REST client implementing the live collaborators.

mod bybit;
mod history;
mod types;

pub use bybit::{BybitClient, BybitConfig, BYBIT_API_URL};
pub use history::{PriceHistory, DEFAULT_MAX_POINTS};
pub use types::FeedError;

use crate::market::{Period, PricePoint, Snapshot};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Time-ordered price history for a symbol
#[async_trait]
pub trait PriceHistorySource: Send + Sync {
    /// Points for the period window, ascending by timestamp
    async fn get_series(&self, symbol: &str, period: Period) -> Result<Vec<PricePoint>, FeedError>;
}

/// Produces fresh observations to record into a [`PriceHistory`]
#[async_trait]
pub trait PointSource: Send + Sync {
    async fn fetch_point(&self, symbol: &str) -> Result<PricePoint, FeedError>;
}

/// Current market state for a symbol
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Latest snapshot, `None` if the symbol is unknown
    async fn get_current_snapshot(&self, symbol: &str) -> Result<Option<Snapshot>, FeedError>;
}

/// Realtime derived metric (volume delta) straight from the exchange
#[async_trait]
pub trait LiveMetricSource: Send + Sync {
    async fn get_realtime_metric(&self, symbol: &str) -> Result<Decimal, FeedError>;
}
