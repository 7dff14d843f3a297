//! Metric cache fallback integration tests

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use move_screener::clock::{Clock, ManualClock};
use move_screener::feed::{FeedError, LiveMetricSource, PriceHistory};
use move_screener::market::{Direction, PricePoint};
use move_screener::metric::{
    CacheConfig, LiveEstimator, MetricCache, MetricSource, StorageVolumeEstimator,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

struct DownExchange;

#[async_trait]
impl LiveMetricSource for DownExchange {
    async fn get_realtime_metric(&self, symbol: &str) -> Result<Decimal, FeedError> {
        Err(FeedError::Unavailable(format!("{} feed down", symbol)))
    }
}

struct HangingExchange;

#[async_trait]
impl LiveMetricSource for HangingExchange {
    async fn get_realtime_metric(&self, _symbol: &str) -> Result<Decimal, FeedError> {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        Ok(dec!(1))
    }
}

struct UpExchange;

#[async_trait]
impl LiveMetricSource for UpExchange {
    async fn get_realtime_metric(&self, _symbol: &str) -> Result<Decimal, FeedError> {
        Ok(dec!(-1250.5))
    }
}

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    ))
}

async fn history_with_volume(clock: &ManualClock) -> Arc<PriceHistory> {
    let history = Arc::new(PriceHistory::default());
    let now = clock.now();
    for (minutes_ago, volume) in [(4, dec!(10000)), (2, dec!(10400)), (0, dec!(11000))] {
        history
            .record(PricePoint::new(
                "BTCUSDT",
                dec!(65000),
                volume,
                now - Duration::minutes(minutes_ago),
            ))
            .await;
    }
    history
}

#[tokio::test]
async fn test_live_value_tagged_api() {
    let clock = clock();
    let cache = MetricCache::new(&CacheConfig::default(), clock)
        .with_live(Arc::new(LiveEstimator::new(Arc::new(UpExchange))));

    let value = cache.get_with_fallback("BTCUSDT", Direction::Fall).await;
    assert_eq!(value.source, MetricSource::Api);
    assert_eq!(value.value, dec!(-1250.5));
}

#[tokio::test]
async fn test_failing_live_falls_to_storage() {
    let clock = clock();
    let history = history_with_volume(&clock).await;
    let cache = MetricCache::new(&CacheConfig::default(), clock)
        .with_live(Arc::new(LiveEstimator::new(Arc::new(DownExchange))))
        .with_storage(Arc::new(StorageVolumeEstimator::new(history)));

    let value = cache.get_with_fallback("BTCUSDT", Direction::Growth).await;
    assert_eq!(value.source, MetricSource::Storage);
    assert_eq!(value.value, dec!(1000));
}

#[tokio::test]
async fn test_hanging_live_is_bounded() {
    let clock = clock();
    let history = history_with_volume(&clock).await;
    let config = CacheConfig {
        tier_timeout_ms: 50,
        ..CacheConfig::default()
    };
    let cache = MetricCache::new(&config, clock)
        .with_live(Arc::new(LiveEstimator::new(Arc::new(HangingExchange))))
        .with_storage(Arc::new(StorageVolumeEstimator::new(history)));

    let value = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        cache.get_with_fallback("BTCUSDT", Direction::Growth),
    )
    .await
    .unwrap();
    assert_eq!(value.source, MetricSource::Storage);
}

#[tokio::test]
async fn test_everything_down_is_emulated_and_bounded() {
    let clock = clock();
    let empty = Arc::new(PriceHistory::default());
    let cache = MetricCache::new(&CacheConfig::default(), clock)
        .with_live(Arc::new(LiveEstimator::new(Arc::new(DownExchange))))
        .with_storage(Arc::new(StorageVolumeEstimator::new(empty)));

    for direction in [Direction::Growth, Direction::Fall] {
        let value = cache.get_with_fallback("DOGEUSDT", direction).await;
        assert_eq!(value.source, MetricSource::Emulated);
        assert!(value.value.abs() <= dec!(0.05) * dec!(1000000));
        assert_eq!(value.value.is_sign_negative(), direction == Direction::Fall);
    }
}

#[tokio::test]
async fn test_entries_expire_after_ttl() {
    let clock = clock();
    let cache = MetricCache::new(&CacheConfig::default(), clock.clone())
        .with_live(Arc::new(LiveEstimator::new(Arc::new(UpExchange))));

    let first = cache.get_with_fallback("BTCUSDT", Direction::Growth).await;
    clock.advance(Duration::seconds(45));
    assert!(cache.get("BTCUSDT", Direction::Growth).await.is_none());

    let second = cache.get_with_fallback("BTCUSDT", Direction::Growth).await;
    assert!(second.computed_at > first.computed_at);
}
