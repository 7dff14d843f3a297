//! Polling scanner
//!
//! Each cycle records one fresh point per symbol into the price history and runs
//! an analysis pass for every configured period. Symbols run concurrently; the
//! periods of one symbol run in order. State sweeps run on their own interval.

use super::Analyzer;
use crate::clock::saturating_seconds;
use crate::feed::{PointSource, PriceHistory, DEFAULT_MAX_POINTS};
use crate::market::Period;
use crate::telemetry::{record_latency, set_gauge, GaugeMetric, LatencyMetric};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinSet;

/// Scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Symbols to screen
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Periods analysed for every symbol
    #[serde(default = "default_periods")]
    pub periods: Vec<Period>,

    /// Seconds between scan cycles
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds between state sweeps
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,

    /// State untouched for this long is swept (seconds)
    #[serde(default = "default_cleanup_max_age_secs")]
    pub cleanup_max_age_secs: u64,

    /// Upper bound on one history fetch (milliseconds)
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Points retained per symbol
    #[serde(default = "default_history_max_points")]
    pub history_max_points: usize,
}

fn default_symbols() -> Vec<String> {
    vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]
}

fn default_periods() -> Vec<Period> {
    vec![Period::M5, Period::M15, Period::H1]
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_cleanup_interval_secs() -> u64 {
    300
}

fn default_cleanup_max_age_secs() -> u64 {
    3_600
}

fn default_fetch_timeout_ms() -> u64 {
    5_000
}

fn default_history_max_points() -> usize {
    DEFAULT_MAX_POINTS
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            periods: default_periods(),
            poll_interval_secs: default_poll_interval_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            cleanup_max_age_secs: default_cleanup_max_age_secs(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            history_max_points: default_history_max_points(),
        }
    }
}

impl ScannerConfig {
    pub fn cleanup_max_age(&self) -> chrono::Duration {
        saturating_seconds(self.cleanup_max_age_secs)
    }
}

/// Totals for one scan cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub points_recorded: usize,
    pub passes: usize,
    pub failed_passes: usize,
    pub signals: usize,
}

/// Drives the analyzer over the configured symbols and periods
pub struct Scanner {
    config: ScannerConfig,
    points: Arc<dyn PointSource>,
    history: Arc<PriceHistory>,
    analyzer: Arc<Analyzer>,
}

impl Scanner {
    pub fn new(
        config: ScannerConfig,
        points: Arc<dyn PointSource>,
        history: Arc<PriceHistory>,
        analyzer: Arc<Analyzer>,
    ) -> Self {
        Self {
            config,
            points,
            history,
            analyzer,
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Fetch and record one point per symbol; returns how many were recorded
    pub async fn poll(&self) -> usize {
        let started = Instant::now();
        let mut tasks = JoinSet::new();
        for symbol in &self.config.symbols {
            let source = Arc::clone(&self.points);
            let symbol = symbol.clone();
            tasks.spawn(async move {
                let fetched = source.fetch_point(&symbol).await;
                (symbol, fetched)
            });
        }

        let mut recorded = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(point))) => {
                    self.history.record(point).await;
                    recorded += 1;
                }
                Ok((symbol, Err(e))) => {
                    tracing::warn!(symbol = %symbol, error = %e, "Price poll failed");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Price poll task panicked");
                }
            }
        }

        record_latency(LatencyMetric::PricePoll, started.elapsed());
        set_gauge(GaugeMetric::TrackedSymbols, self.history.symbols().await.len() as f64);
        recorded
    }

    /// Run every (symbol, period) pass once
    pub async fn analyze_all(&self) -> CycleStats {
        let mut tasks = JoinSet::new();
        for symbol in &self.config.symbols {
            let analyzer = Arc::clone(&self.analyzer);
            let periods = self.config.periods.clone();
            let symbol = symbol.clone();
            tasks.spawn(async move {
                let mut stats = CycleStats::default();
                for period in periods {
                    match analyzer.analyze(&symbol, period).await {
                        Ok(report) => {
                            stats.passes += 1;
                            stats.signals += report.signals.len();
                        }
                        Err(e) => {
                            stats.failed_passes += 1;
                            tracing::warn!(symbol = %symbol, period = %period, error = %e, "Analysis pass skipped");
                        }
                    }
                }
                stats
            });
        }

        let mut totals = CycleStats::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(stats) => {
                    totals.passes += stats.passes;
                    totals.failed_passes += stats.failed_passes;
                    totals.signals += stats.signals;
                }
                Err(e) => tracing::error!(error = %e, "Analysis task panicked"),
            }
        }
        totals
    }

    /// One poll followed by one round of analysis
    pub async fn run_cycle(&self) -> CycleStats {
        let points_recorded = self.poll().await;
        let stats = self.analyze_all().await;
        let stats = CycleStats {
            points_recorded,
            ..stats
        };

        tracing::info!(
            points = stats.points_recorded,
            passes = stats.passes,
            failed = stats.failed_passes,
            signals = stats.signals,
            "Scan cycle complete"
        );
        stats
    }

    /// Sweep stale confirmation counters and cache entries
    pub async fn sweep(&self) {
        let max_age = self.config.cleanup_max_age();
        let counters = self.analyzer.confirmations().cleanup(max_age).await;
        let entries = self.analyzer.metrics().cleanup(max_age).await;

        set_gauge(
            GaugeMetric::ConfirmationCounters,
            self.analyzer.confirmations().len().await as f64,
        );
        set_gauge(GaugeMetric::CacheEntries, self.analyzer.metrics().len().await as f64);
        tracing::debug!(counters, entries, "State sweep complete");
    }

    /// Run until `shutdown` flips to true or its sender is dropped
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut scan = tokio::time::interval(Duration::from_secs(self.config.poll_interval_secs.max(1)));
        let mut cleanup =
            tokio::time::interval(Duration::from_secs(self.config.cleanup_interval_secs.max(1)));
        // First cleanup tick fires immediately; nothing to sweep yet
        cleanup.tick().await;

        tracing::info!(
            symbols = ?self.config.symbols,
            periods = ?self.config.periods,
            poll_secs = self.config.poll_interval_secs,
            "Scanner started"
        );

        loop {
            tokio::select! {
                _ = scan.tick() => {
                    self.run_cycle().await;
                }
                _ = cleanup.tick() => {
                    self.sweep().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Scanner stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::confirmation::{ConfirmationConfig, ConfirmationManager};
    use crate::detector::{ChangeDetector, DetectorConfig};
    use crate::feed::FeedError;
    use crate::market::PricePoint;
    use crate::metric::{CacheConfig, MetricCache};
    use crate::signal::{ChannelSink, PublisherConfig, SignalPublisher};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Price rises 1% per poll; unknown symbols fail
    struct Ticker {
        clock: Arc<ManualClock>,
        polls: AtomicU32,
    }

    #[async_trait]
    impl PointSource for Ticker {
        async fn fetch_point(&self, symbol: &str) -> Result<PricePoint, FeedError> {
            if symbol != "BTCUSDT" {
                return Err(FeedError::NotFound(symbol.to_string()));
            }
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            let price = dec!(100) + Decimal::from(n);
            self.clock.advance(chrono::Duration::seconds(30));
            Ok(PricePoint::new(symbol, price, dec!(2000000), self.clock.now()))
        }
    }

    fn scanner(symbols: &[&str]) -> (Arc<Scanner>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        let history = Arc::new(PriceHistory::default());
        let confirmations = Arc::new(ConfirmationManager::new(
            &ConfirmationConfig::default(),
            clock.clone(),
        ));
        let metrics = Arc::new(MetricCache::new(&CacheConfig::default(), clock.clone()));
        let (sink, _rx) = ChannelSink::channel(64);
        let (publisher, _handle) = SignalPublisher::spawn(Arc::new(sink), &PublisherConfig::default());
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
            clock.clone(),
        ));
        let config = ScannerConfig {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            periods: vec![Period::M5],
            ..ScannerConfig::default()
        };
        let ticker = Arc::new(Ticker {
            clock: clock.clone(),
            polls: AtomicU32::new(0),
        });
        (Arc::new(Scanner::new(config, ticker, history, analyzer)), clock)
    }

    #[tokio::test]
    async fn test_poll_records_points_and_skips_failures() {
        let (scanner, _) = scanner(&["BTCUSDT", "DOGEUSDT"]);
        assert_eq!(scanner.poll().await, 1);
        assert_eq!(scanner.history.len("BTCUSDT").await, 1);
        assert_eq!(scanner.history.len("DOGEUSDT").await, 0);
    }

    #[tokio::test]
    async fn test_cycles_build_history_and_confirm() {
        let (scanner, _) = scanner(&["BTCUSDT"]);
        let mut stats = CycleStats::default();
        for _ in 0..4 {
            stats = scanner.run_cycle().await;
        }
        assert_eq!(stats.points_recorded, 1);
        assert_eq!(stats.passes, 1);
        assert_eq!(scanner.history.len("BTCUSDT").await, 4);

        let progress = scanner
            .analyzer
            .confirmations()
            .progress("BTCUSDT", Period::M5)
            .await
            .unwrap();
        assert!(progress.count > 0);
    }

    #[tokio::test]
    async fn test_sweep_clears_stale_state() {
        let (scanner, clock) = scanner(&["BTCUSDT"]);
        for _ in 0..3 {
            scanner.run_cycle().await;
        }
        assert!(!scanner.analyzer.confirmations().is_empty().await);

        clock.advance(chrono::Duration::hours(2));
        scanner.sweep().await;
        assert!(scanner.analyzer.confirmations().is_empty().await);
        assert!(scanner.analyzer.metrics().is_empty().await);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (scanner, _) = scanner(&["BTCUSDT"]);
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(Arc::clone(&scanner).run(rx));

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_cleanup_max_age_saturates() {
        let config = ScannerConfig {
            cleanup_max_age_secs: u64::MAX,
            ..ScannerConfig::default()
        };
        assert_eq!(config.cleanup_max_age(), chrono::Duration::MAX);
        assert_eq!(
            ScannerConfig::default().cleanup_max_age(),
            chrono::Duration::hours(1)
        );
    }
}
