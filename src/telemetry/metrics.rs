//! Prometheus metrics

use crate::metric::MetricSource;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// One full analysis pass for a (symbol, period)
    Analysis,
    /// Price history fetch
    HistoryFetch,
    /// Exchange ticker poll
    PricePoll,
}

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Completed analysis passes
    AnalysisPasses,
    /// Analysis passes that failed on history fetch
    AnalysisFailures,
    /// Signals the sink accepted
    SignalsPublished,
    /// Signals dropped because the queue was full or closed
    SignalsDropped,
    /// Sink deliveries that returned an error
    SinkFailures,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Symbols with recorded history
    TrackedSymbols,
    /// Live confirmation counters
    ConfirmationCounters,
    /// Live metric cache entries
    CacheEntries,
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::Analysis => "screener_analysis_duration_ms",
        LatencyMetric::HistoryFetch => "screener_history_fetch_duration_ms",
        LatencyMetric::PricePoll => "screener_price_poll_duration_ms",
    };

    metrics::histogram!(metric_name).record(duration.as_secs_f64() * 1000.0);
}

/// Increment a counter by one
pub fn increment(metric: CounterMetric) {
    let metric_name = match metric {
        CounterMetric::AnalysisPasses => "screener_analysis_passes_total",
        CounterMetric::AnalysisFailures => "screener_analysis_failures_total",
        CounterMetric::SignalsPublished => "screener_signals_published_total",
        CounterMetric::SignalsDropped => "screener_signals_dropped_total",
        CounterMetric::SinkFailures => "screener_sink_failures_total",
    };

    metrics::counter!(metric_name).increment(1);
}

/// Count a metric value by the tier that produced it
pub fn record_metric_source(source: MetricSource) {
    metrics::counter!("screener_metric_source_total", "source" => source.as_str()).increment(1);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let metric_name = match metric {
        GaugeMetric::TrackedSymbols => "screener_tracked_symbols",
        GaugeMetric::ConfirmationCounters => "screener_confirmation_counters",
        GaugeMetric::CacheEntries => "screener_metric_cache_entries",
    };

    metrics::gauge!(metric_name).set(value);
}

/// Install the Prometheus recorder with an HTTP scrape endpoint
pub fn install_exporter(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}
