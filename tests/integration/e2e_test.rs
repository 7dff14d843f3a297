//! End-to-end integration tests

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use move_screener::clock::{Clock, ManualClock};
use move_screener::config::Config;
use move_screener::confirmation::ConfirmationManager;
use move_screener::detector::{Algorithm, ChangeDetector, DetectorConfig};
use move_screener::engine::{Analyzer, Scanner, ScannerConfig};
use move_screener::feed::{FeedError, PointSource, PriceHistory};
use move_screener::market::{Direction, Period, PricePoint};
use move_screener::metric::{MetricCache, StorageVolumeEstimator};
use move_screener::signal::{ChannelSink, PublisherConfig, SignalPublisher};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

#[test]
fn test_config_example_loads() {
    let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();
    assert_eq!(config.scanner.symbols, vec!["BTCUSDT", "ETHUSDT"]);
    assert_eq!(config.confirmation.signal_threshold, 3);
}

fn t(minute: i64) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::minutes(minute)
}

fn series(prices: &[Decimal]) -> Vec<PricePoint> {
    prices
        .iter()
        .enumerate()
        .map(|(i, price)| PricePoint::new("BTCUSDT", *price, dec!(750000), t(i as i64)))
        .collect()
}

#[test]
fn test_two_point_spike_is_single_growth() {
    let detector = ChangeDetector::new(DetectorConfig {
        min_confidence: 0.0,
        min_change_percent: dec!(0.1),
        ..DetectorConfig::default()
    });
    let results = detector.detect_single(&series(&[dec!(100), dec!(102)]));

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].change_percent, dec!(2));
    assert_eq!(results[0].direction, Direction::Growth);
}

#[test]
fn test_steady_rise_is_one_continuous_run() {
    let detector = ChangeDetector::new(DetectorConfig {
        min_confidence: 0.0,
        min_change_percent: dec!(0.5),
        continuity_threshold: 0.7,
        ..DetectorConfig::default()
    });
    let results = detector.detect(&series(&[dec!(100), dec!(101), dec!(102), dec!(103)]));

    let continuous: Vec<_> = results
        .iter()
        .filter(|r| r.algorithm == Algorithm::Continuous)
        .collect();
    assert_eq!(continuous.len(), 1);
    assert_eq!(continuous[0].data_points, 4);
    assert_eq!(continuous[0].continuity_ratio(), Some(1.0));

    let intervals: Vec<_> = results
        .iter()
        .filter(|r| r.algorithm == Algorithm::Interval)
        .collect();
    assert_eq!(intervals.len(), 1);
    assert_eq!(intervals[0].data_points, 4);
}

#[test]
fn test_confidence_always_bounded() {
    let detector = ChangeDetector::new(DetectorConfig {
        min_confidence: 0.0,
        min_change_percent: dec!(0.01),
        ..DetectorConfig::default()
    });
    let wild = series(&[
        dec!(1),
        dec!(1000),
        dec!(0.5),
        dec!(2500),
        dec!(2500),
        dec!(0.01),
    ]);
    for result in detector.detect(&wild) {
        assert!((0.0..=100.0).contains(&result.confidence));
    }
}

/// Scripted ticker: one price per poll, clock moves a minute per poll
struct ScriptedTicker {
    clock: Arc<ManualClock>,
    prices: Mutex<Vec<Decimal>>,
    polls: AtomicU32,
}

#[async_trait]
impl PointSource for ScriptedTicker {
    async fn fetch_point(&self, symbol: &str) -> Result<PricePoint, FeedError> {
        let mut prices = self.prices.lock().await;
        if prices.is_empty() {
            return Err(FeedError::Unavailable(symbol.to_string()));
        }
        let price = prices.remove(0);
        let n = self.polls.fetch_add(1, Ordering::SeqCst);
        self.clock.set(t(i64::from(n)));
        Ok(PricePoint::new(symbol, price, dec!(900000) + Decimal::from(n) * dec!(1000), self.clock.now()))
    }
}

struct Pipeline {
    scanner: Arc<Scanner>,
    signals: tokio::sync::mpsc::Receiver<move_screener::signal::Signal>,
    worker: tokio::task::JoinHandle<()>,
}

fn pipeline(prices: Vec<Decimal>) -> Pipeline {
    let clock = Arc::new(ManualClock::new(t(0)));
    let shared: Arc<dyn Clock> = clock.clone();
    let history = Arc::new(PriceHistory::default());
    let metrics = Arc::new(
        MetricCache::new(&Default::default(), shared.clone())
            .with_storage(Arc::new(StorageVolumeEstimator::new(history.clone()))),
    );
    let confirmations = Arc::new(ConfirmationManager::new(&Default::default(), shared.clone()));
    let (sink, signals) = ChannelSink::channel(64);
    let (publisher, worker) = SignalPublisher::spawn(Arc::new(sink), &PublisherConfig::default());
    let detector = ChangeDetector::new(DetectorConfig {
        min_confidence: 0.0,
        min_change_percent: dec!(0.5),
        ..DetectorConfig::default()
    });
    let analyzer = Arc::new(Analyzer::new(
        history.clone(),
        detector,
        confirmations,
        metrics,
        publisher,
        shared,
    ));
    let ticker = Arc::new(ScriptedTicker {
        clock,
        prices: Mutex::new(prices),
        polls: AtomicU32::new(0),
    });
    let config = ScannerConfig {
        symbols: vec!["BTCUSDT".to_string()],
        periods: vec![Period::M5],
        ..ScannerConfig::default()
    };

    Pipeline {
        scanner: Arc::new(Scanner::new(config, ticker, history, analyzer)),
        signals,
        worker,
    }
}

#[tokio::test]
async fn test_rising_market_publishes_growth_signal() {
    let Pipeline {
        scanner,
        mut signals,
        worker,
    } = pipeline(vec![dec!(100), dec!(101), dec!(102), dec!(103), dec!(104)]);

    let mut published = 0;
    for _ in 0..5 {
        published += scanner.run_cycle().await.signals;
    }
    assert!(published > 0);

    drop(scanner);
    worker.await.unwrap();

    let mut received = Vec::new();
    while let Ok(signal) = signals.try_recv() {
        received.push(signal);
    }
    assert_eq!(received.len(), published);

    let signal = &received[0];
    assert_eq!(signal.symbol, "BTCUSDT");
    assert_eq!(signal.direction, Direction::Growth);
    assert_eq!(signal.period, Period::M5);
    assert_eq!(signal.confirmations % 3, 0);
    assert!(signal.has_tag("volume_source:storage"));
    assert!(signal.indicator("rsi").is_some());
    assert!(signal.indicator("volume_delta").unwrap() > 0.0);
}

#[tokio::test]
async fn test_flat_market_is_silent() {
    let Pipeline {
        scanner,
        mut signals,
        worker,
    } = pipeline(vec![dec!(100); 6]);

    for _ in 0..6 {
        assert_eq!(scanner.run_cycle().await.signals, 0);
    }
    drop(scanner);
    worker.await.unwrap();
    assert!(signals.try_recv().is_err());
}

#[tokio::test]
async fn test_scanner_shuts_down_cleanly() {
    let Pipeline {
        scanner, worker, ..
    } = pipeline(vec![dec!(100), dec!(99)]);
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(Arc::clone(&scanner).run(rx));

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    tx.send(true).unwrap();
    handle.await.unwrap();

    drop(scanner);
    tokio::time::timeout(std::time::Duration::from_secs(5), worker)
        .await
        .unwrap()
        .unwrap();
}
