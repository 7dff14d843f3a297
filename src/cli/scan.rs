//! Scan command implementation
//!
//! Offline analysis of a JSON array of price points.

use crate::clock::{Clock, ManualClock};
use crate::config::Config;
use crate::confirmation::ConfirmationManager;
use crate::detector::{ChangeDetector, ChangeResult};
use crate::engine::Analyzer;
use crate::feed::PriceHistory;
use crate::market::{Period, PricePoint};
use crate::metric::{MetricCache, StorageVolumeEstimator, SyntheticEstimator};
use crate::signal::{ChannelSink, Signal, SignalPublisher};
use clap::{Args, ValueEnum};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// JSON file holding an array of price points
    #[arg(short, long)]
    pub input: PathBuf,

    /// Replay points one by one through confirmation and print signals
    #[arg(long)]
    pub replay: bool,

    /// Period used for replay passes
    #[arg(long, default_value = "5m")]
    pub period: Period,

    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Points grouped per symbol, each series ascending by timestamp
pub fn load_points(path: &std::path::Path) -> anyhow::Result<BTreeMap<String, Vec<PricePoint>>> {
    let content = std::fs::read_to_string(path)?;
    let points: Vec<PricePoint> = serde_json::from_str(&content)?;

    let mut grouped: BTreeMap<String, Vec<PricePoint>> = BTreeMap::new();
    for point in points {
        grouped.entry(point.symbol.clone()).or_default().push(point);
    }
    for series in grouped.values_mut() {
        series.sort_by_key(|p| p.timestamp);
    }
    Ok(grouped)
}

impl ScanArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let grouped = load_points(&self.input)?;
        tracing::info!(
            input = %self.input.display(),
            symbols = grouped.len(),
            "Loaded price points"
        );

        if self.replay {
            let signals = self.replay(config, &grouped).await?;
            for signal in &signals {
                self.print_signal(signal)?;
            }
            tracing::info!(signals = signals.len(), "Replay complete");
        } else {
            let detector = ChangeDetector::new(config.detector.clone());
            for series in grouped.values() {
                for result in detector.detect(series) {
                    self.print_result(&result)?;
                }
            }
        }
        Ok(())
    }

    async fn replay(
        &self,
        config: &Config,
        grouped: &BTreeMap<String, Vec<PricePoint>>,
    ) -> anyhow::Result<Vec<Signal>> {
        let mut timeline: Vec<&PricePoint> = grouped.values().flatten().collect();
        timeline.sort_by_key(|p| p.timestamp);
        let start = timeline.first().map(|p| p.timestamp).unwrap_or_default();

        let clock = Arc::new(ManualClock::new(start));
        let shared: Arc<dyn Clock> = clock.clone();
        let capacity = timeline.len().max(config.scanner.history_max_points);
        let history = Arc::new(PriceHistory::new(capacity));

        let metrics = Arc::new(
            MetricCache::new(&config.cache, shared.clone())
                .with_storage(Arc::new(StorageVolumeEstimator::new(history.clone())))
                .with_synthetic(
                    SyntheticEstimator::new(config.cache.default_base_volume, shared.clone())
                        .with_snapshots(history.clone()),
                ),
        );
        let confirmations = Arc::new(ConfirmationManager::new(&config.confirmation, shared.clone()));

        let (sink, mut rx) = ChannelSink::channel(config.publisher.queue_capacity);
        let collector = tokio::spawn(async move {
            let mut signals = Vec::new();
            while let Some(signal) = rx.recv().await {
                signals.push(signal);
            }
            signals
        });
        let (publisher, worker) = SignalPublisher::spawn(Arc::new(sink), &config.publisher);

        let analyzer = Analyzer::new(
            history.clone(),
            ChangeDetector::new(config.detector.clone()),
            confirmations,
            metrics,
            publisher,
            shared,
        );

        for point in timeline {
            clock.set(point.timestamp);
            history.record(point.clone()).await;
            if let Err(e) = analyzer.analyze(&point.symbol, self.period).await {
                tracing::warn!(symbol = %point.symbol, error = %e, "Replay pass failed");
            }
        }

        drop(analyzer);
        worker.await?;
        Ok(collector.await?)
    }

    fn print_result(&self, result: &ChangeResult) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(result)?),
            OutputFormat::Table => println!(
                "{:<12} {:<10} {:<6} {:>8}% conf={:>5.1} pts={:<3} {} -> {}",
                result.symbol,
                result.algorithm.as_str(),
                result.direction.as_str(),
                result.change_percent.round_dp(2).to_string(),
                result.confidence,
                result.data_points,
                result.start_time.format("%Y-%m-%d %H:%M:%S"),
                result.end_time.format("%H:%M:%S"),
            ),
        }
        Ok(())
    }

    fn print_signal(&self, signal: &Signal) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(signal)?),
            OutputFormat::Table => println!(
                "{} {:<12} {:<6} {:>8}% conf={:>5.1} confirmations={} [{}]",
                signal.timestamp.format("%Y-%m-%d %H:%M:%S"),
                signal.symbol,
                signal.direction.as_str(),
                signal.change_percent.round_dp(2).to_string(),
                signal.confidence,
                signal.confirmations,
                signal.tags.join(", "),
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn write_points(points: &[PricePoint]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(points).unwrap()).unwrap();
        file
    }

    fn rising(symbol: &str, n: usize) -> Vec<PricePoint> {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                PricePoint::new(
                    symbol,
                    dec!(100) + rust_decimal::Decimal::from(i),
                    dec!(2000000),
                    t0 + Duration::minutes(i as i64),
                )
            })
            .collect()
    }

    #[test]
    fn test_load_points_groups_and_sorts() {
        let mut points = rising("BTCUSDT", 3);
        points.reverse();
        points.extend(rising("ETHUSDT", 2));
        let file = write_points(&points);

        let grouped = load_points(file.path()).unwrap();
        assert_eq!(grouped.len(), 2);
        let btc = &grouped["BTCUSDT"];
        assert!(btc.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_replay_emits_signals() {
        let file = write_points(&rising("BTCUSDT", 6));
        let args = ScanArgs {
            input: file.path().to_path_buf(),
            replay: true,
            period: Period::M5,
            format: OutputFormat::Json,
        };
        let mut config = Config::default();
        config.detector.min_confidence = 0.0;
        config.detector.min_change_percent = dec!(0.5);

        let grouped = load_points(file.path()).unwrap();
        let signals = args.replay(&config, &grouped).await.unwrap();
        assert!(!signals.is_empty());
        assert!(signals.iter().all(|s| s.confirmations % 3 == 0));
        assert!(signals
            .iter()
            .all(|s| s.has_tag("volume_source:storage") || s.has_tag("volume_source:emulated")));
    }
}
