//! One analysis pass for a (symbol, period)

use crate::clock::Clock;
use crate::confirmation::ConfirmationManager;
use crate::detector::{ChangeDetector, ChangeResult};
use crate::feed::{FeedError, PriceHistorySource};
use crate::indicators;
use crate::market::{Period, PricePoint};
use crate::metric::MetricCache;
use crate::signal::{Signal, SignalPublisher};
use crate::telemetry::{increment, record_latency, CounterMetric, LatencyMetric};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

/// Default bound on a history fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// A pass that could not run; no state was touched
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("History fetch failed for {symbol}: {source}")]
    History {
        symbol: String,
        #[source]
        source: FeedError,
    },
    #[error("History fetch for {symbol} timed out after {timeout:?}")]
    Timeout { symbol: String, timeout: Duration },
}

/// Outcome of one pass
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub symbol: String,
    pub period: Period,
    pub points: usize,
    /// Everything the detector found in the series
    pub results: Vec<ChangeResult>,
    /// The move counted as this pass's confirmation, if any was new
    pub confirmed: Option<ChangeResult>,
    /// Confirmation count after this pass
    pub confirmations: Option<u32>,
    /// Signals handed to the publisher
    pub signals: Vec<Signal>,
}

/// Detect, confirm, enrich and publish
pub struct Analyzer {
    history: Arc<dyn PriceHistorySource>,
    detector: ChangeDetector,
    confirmations: Arc<ConfirmationManager>,
    metrics: Arc<MetricCache>,
    publisher: SignalPublisher,
    clock: Arc<dyn Clock>,
    fetch_timeout: Duration,
    /// End of the latest move already seen, per `symbol:period`
    seen_until: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl Analyzer {
    pub fn new(
        history: Arc<dyn PriceHistorySource>,
        detector: ChangeDetector,
        confirmations: Arc<ConfirmationManager>,
        metrics: Arc<MetricCache>,
        publisher: SignalPublisher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            history,
            detector,
            confirmations,
            metrics,
            publisher,
            clock,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            seen_until: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn confirmations(&self) -> &Arc<ConfirmationManager> {
        &self.confirmations
    }

    pub fn metrics(&self) -> &Arc<MetricCache> {
        &self.metrics
    }

    async fn fetch(&self, symbol: &str, period: Period) -> Result<Vec<PricePoint>, AnalyzeError> {
        let started = Instant::now();
        let fetched = tokio::time::timeout(self.fetch_timeout, self.history.get_series(symbol, period))
            .await
            .map_err(|_| AnalyzeError::Timeout {
                symbol: symbol.to_string(),
                timeout: self.fetch_timeout,
            })?
            .map_err(|source| AnalyzeError::History {
                symbol: symbol.to_string(),
                source,
            });
        record_latency(LatencyMetric::HistoryFetch, started.elapsed());
        fetched
    }

    /// Strongest move ending after anything seen on an earlier pass
    ///
    /// Marks every result of this pass as seen, so re-reading an unchanged
    /// series yields nothing.
    async fn fresh_move(
        &self,
        symbol: &str,
        period: Period,
        results: &[ChangeResult],
    ) -> Option<ChangeResult> {
        let latest = results.iter().map(|r| r.end_time).max()?;
        let key = format!("{}:{}", symbol, period);

        let mut seen_until = self.seen_until.write().await;
        let since = seen_until.get(&key).copied();
        let fresh = results
            .iter()
            .filter(|r| since.map_or(true, |seen| r.end_time > seen))
            .max_by(|a, b| {
                a.abs_change()
                    .cmp(&b.abs_change())
                    .then(a.end_time.cmp(&b.end_time))
            })
            .cloned();
        if since.map_or(true, |seen| latest > seen) {
            seen_until.insert(key, latest);
        }
        fresh
    }

    /// Run one pass
    ///
    /// A pass counts at most one confirmation: the strongest detected move
    /// that ends after every move seen on earlier passes. A signal is
    /// assembled and queued when that confirmation reaches the threshold.
    pub async fn analyze(&self, symbol: &str, period: Period) -> Result<AnalysisReport, AnalyzeError> {
        let started = Instant::now();
        let series = match self.fetch(symbol, period).await {
            Ok(series) => series,
            Err(e) => {
                increment(CounterMetric::AnalysisFailures);
                return Err(e);
            }
        };

        let results = self.detector.detect(&series);
        let confirmed = self.fresh_move(symbol, period, &results).await;
        let mut confirmations = None;
        let mut signals = Vec::new();

        if let Some(result) = &confirmed {
            let outcome = self
                .confirmations
                .add_confirmation(symbol, period, result.direction)
                .await;
            confirmations = Some(outcome.count);

            tracing::debug!(
                symbol,
                period = %period,
                algorithm = %result.algorithm,
                direction = %result.direction,
                change_pct = %result.change_percent,
                confidence = result.confidence,
                confirmations = outcome.count,
                "Move confirmed"
            );

            if outcome.threshold_reached {
                let signal = self.assemble(result, period, outcome.count, &series).await;
                if self.publisher.submit(signal.clone()).is_ok() {
                    signals.push(signal);
                }
            }
        } else if !results.is_empty() {
            tracing::debug!(symbol, period = %period, "No new move since last pass");
        }

        increment(CounterMetric::AnalysisPasses);
        record_latency(LatencyMetric::Analysis, started.elapsed());

        Ok(AnalysisReport {
            symbol: symbol.to_string(),
            period,
            points: series.len(),
            results,
            confirmed,
            confirmations,
            signals,
        })
    }

    async fn assemble(
        &self,
        result: &ChangeResult,
        period: Period,
        confirmations: u32,
        series: &[PricePoint],
    ) -> Signal {
        let volume = self
            .metrics
            .get_with_fallback(&result.symbol, result.direction)
            .await;

        let mut signal = Signal::from_result(result, period, confirmations, self.clock.now())
            .with_indicator("volume_delta", f64::try_from(volume.value).unwrap_or(0.0))
            .with_tag(format!("volume_source:{}", volume.source))
            .with_tag(format!("period:{}", period));

        if let Some(snapshot) = indicators::from_points(series) {
            for (name, value) in snapshot.entries() {
                signal = signal.with_indicator(name, value);
            }
        }

        signal
    }
}
