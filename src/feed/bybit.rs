//! Bybit v5 REST client
//!
//! Reads linear-perpetual tickers for snapshots and recent public trades for
//! the realtime volume delta (taker buy size minus taker sell size).

use super::{FeedError, LiveMetricSource, PointSource, SnapshotSource};
use crate::market::{PricePoint, Snapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// Bybit API base URL
pub const BYBIT_API_URL: &str = "https://api.bybit.com";

/// Configuration for the Bybit client
#[derive(Debug, Clone)]
pub struct BybitConfig {
    /// Base URL for the REST API
    pub base_url: String,
    /// Product category ("linear", "spot", ...)
    pub category: String,
    /// Request timeout
    pub timeout: Duration,
    /// Number of recent trades used for the volume delta
    pub trade_limit: u32,
}

impl Default for BybitConfig {
    fn default() -> Self {
        Self {
            base_url: BYBIT_API_URL.to_string(),
            category: "linear".to_string(),
            timeout: Duration::from_secs(10),
            trade_limit: 500,
        }
    }
}

/// Client for Bybit's public market endpoints
pub struct BybitClient {
    config: BybitConfig,
    client: Client,
}

impl BybitClient {
    /// Create a client with custom configuration
    pub fn with_config(config: BybitConfig) -> Result<Self, FeedError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Create a client with default configuration
    pub fn new() -> Result<Self, FeedError> {
        Self::with_config(BybitConfig::default())
    }

    pub fn config(&self) -> &BybitConfig {
        &self.config
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FeedError> {
        let url = format!("{}{}", self.config.base_url, path);
        tracing::debug!(url = %url, "Bybit request");

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FeedError::Api {
                code: i64::from(status.as_u16()),
                message: body,
            });
        }

        unwrap_envelope(&body)
    }

    /// Fetch the latest ticker as a price point
    pub async fn fetch_ticker(&self, symbol: &str) -> Result<PricePoint, FeedError> {
        let result: TickerList = self
            .get(
                "/v5/market/tickers",
                &[
                    ("category", self.config.category.clone()),
                    ("symbol", symbol.to_string()),
                ],
            )
            .await?;

        let ticker = result
            .list
            .into_iter()
            .next()
            .ok_or_else(|| FeedError::NotFound(symbol.to_string()))?;

        ticker.into_point(Utc::now())
    }

    /// Taker buy size minus taker sell size over the most recent trades
    pub async fn fetch_volume_delta(&self, symbol: &str) -> Result<Decimal, FeedError> {
        let result: TradeList = self
            .get(
                "/v5/market/recent-trade",
                &[
                    ("category", self.config.category.clone()),
                    ("symbol", symbol.to_string()),
                    ("limit", self.config.trade_limit.to_string()),
                ],
            )
            .await?;

        volume_delta(&result.list)
    }
}

#[async_trait]
impl PointSource for BybitClient {
    async fn fetch_point(&self, symbol: &str) -> Result<PricePoint, FeedError> {
        self.fetch_ticker(symbol).await
    }
}

#[async_trait]
impl SnapshotSource for BybitClient {
    async fn get_current_snapshot(&self, symbol: &str) -> Result<Option<Snapshot>, FeedError> {
        match self.fetch_ticker(symbol).await {
            Ok(point) => Ok(Some(Snapshot::from(&point))),
            Err(FeedError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl LiveMetricSource for BybitClient {
    async fn get_realtime_metric(&self, symbol: &str) -> Result<Decimal, FeedError> {
        self.fetch_volume_delta(symbol).await
    }
}

/// Standard Bybit v5 response wrapper
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
    #[serde(default)]
    result: serde_json::Value,
}

/// Check the return code before touching the payload; error bodies carry `{}`
fn unwrap_envelope<T: DeserializeOwned>(body: &str) -> Result<T, FeedError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| FeedError::Parse(e.to_string()))?;

    if envelope.ret_code != 0 {
        return Err(FeedError::Api {
            code: envelope.ret_code,
            message: envelope.ret_msg,
        });
    }

    serde_json::from_value(envelope.result).map_err(|e| FeedError::Parse(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct TickerList {
    list: Vec<BybitTicker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitTicker {
    symbol: String,
    last_price: String,
    #[serde(default)]
    high_price24h: String,
    #[serde(default)]
    low_price24h: String,
    #[serde(default)]
    volume24h: String,
    #[serde(default)]
    open_interest: String,
    #[serde(default)]
    funding_rate: String,
}

impl BybitTicker {
    fn into_point(self, timestamp: DateTime<Utc>) -> Result<PricePoint, FeedError> {
        Ok(PricePoint {
            price: parse_decimal(&self.last_price)?,
            volume_24h: parse_decimal(&self.volume24h)?,
            open_interest: parse_decimal(&self.open_interest)?,
            funding_rate: parse_decimal(&self.funding_rate)?,
            high_24h: parse_decimal(&self.high_price24h)?,
            low_24h: parse_decimal(&self.low_price24h)?,
            timestamp,
            symbol: self.symbol,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TradeList {
    list: Vec<BybitTrade>,
}

#[derive(Debug, Deserialize)]
struct BybitTrade {
    size: String,
    side: String,
}

fn volume_delta(trades: &[BybitTrade]) -> Result<Decimal, FeedError> {
    let mut delta = Decimal::ZERO;
    for trade in trades {
        let size = parse_decimal(&trade.size)?;
        let next = match trade.side.as_str() {
            "Buy" => delta.checked_add(size),
            "Sell" => delta.checked_sub(size),
            other => return Err(FeedError::Parse(format!("unknown trade side: {other}"))),
        };
        delta = next.ok_or_else(|| FeedError::Parse("volume delta overflow".to_string()))?;
    }
    Ok(delta)
}

/// Bybit sends empty strings for fields that do not apply to a category
fn parse_decimal(value: &str) -> Result<Decimal, FeedError> {
    if value.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(value).map_err(|e| FeedError::Parse(format!("{value}: {e}")))
}
