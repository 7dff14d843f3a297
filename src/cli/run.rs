//! Run command implementation

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::confirmation::ConfirmationManager;
use crate::detector::ChangeDetector;
use crate::engine::{Analyzer, Scanner};
use crate::feed::{BybitClient, PriceHistory};
use crate::metric::{LiveEstimator, MetricCache, StorageVolumeEstimator, SyntheticEstimator};
use crate::signal::{LogSink, SignalPublisher};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// How long to wait for queued signals after the scanner stops
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Symbols to screen, overriding the config file
    #[arg(short, long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Run a single scan cycle and exit
    #[arg(long)]
    pub once: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut scanner_config = config.scanner.clone();
        if !self.symbols.is_empty() {
            scanner_config.symbols = self.symbols.clone();
        }

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let bybit = Arc::new(BybitClient::with_config(config.exchange.to_bybit())?);
        let history = Arc::new(PriceHistory::new(scanner_config.history_max_points));

        let synthetic = SyntheticEstimator::new(config.cache.default_base_volume, clock.clone())
            .with_snapshots(bybit.clone());
        let metrics = Arc::new(
            MetricCache::new(&config.cache, clock.clone())
                .with_live(Arc::new(LiveEstimator::new(bybit.clone())))
                .with_storage(Arc::new(StorageVolumeEstimator::new(history.clone())))
                .with_synthetic(synthetic),
        );
        let confirmations = Arc::new(ConfirmationManager::new(&config.confirmation, clock.clone()));
        let (publisher, worker) = SignalPublisher::spawn(Arc::new(LogSink), &config.publisher);

        let analyzer = Arc::new(
            Analyzer::new(
                history.clone(),
                ChangeDetector::new(config.detector.clone()),
                confirmations,
                metrics,
                publisher,
                clock,
            )
            .with_fetch_timeout(Duration::from_millis(scanner_config.fetch_timeout_ms)),
        );
        let scanner = Arc::new(Scanner::new(scanner_config, bybit, history, analyzer));

        if self.once {
            scanner.run_cycle().await;
        } else {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let handle = tokio::spawn(Arc::clone(&scanner).run(shutdown_rx));

            tokio::signal::ctrl_c().await?;
            tracing::info!("Shutdown requested");
            shutdown_tx.send(true)?;
            handle.await?;
        }

        // Dropping the scanner releases the last publisher handle
        drop(scanner);
        if tokio::time::timeout(DRAIN_TIMEOUT, worker).await.is_err() {
            tracing::warn!("Signal queue not drained before exit");
        }
        Ok(())
    }
}
