//! Bounded, non-blocking signal publishing

use super::{EventSink, PublishError, Signal};
use crate::telemetry::{increment, CounterMetric};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Publisher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Signals buffered between analysis and the sink
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    256
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Hands signals to a background worker that delivers them to an [`EventSink`]
///
/// `submit` never waits. A full queue drops the signal. The worker exits once
/// every publisher clone is dropped and the queue has drained.
#[derive(Clone)]
pub struct SignalPublisher {
    tx: mpsc::Sender<Signal>,
}

impl SignalPublisher {
    /// Spawn the delivery worker
    pub fn spawn(sink: Arc<dyn EventSink>, config: &PublisherConfig) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Signal>(config.queue_capacity.max(1));

        let handle = tokio::spawn(async move {
            while let Some(signal) = rx.recv().await {
                deliver(sink.as_ref(), &signal).await;
            }
            tracing::debug!("Signal publisher worker stopped");
        });

        (Self { tx }, handle)
    }

    /// Queue a signal without waiting
    pub fn submit(&self, signal: Signal) -> Result<(), PublishError> {
        match self.tx.try_send(signal) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(signal)) => {
                increment(CounterMetric::SignalsDropped);
                tracing::warn!(
                    id = %signal.id,
                    symbol = %signal.symbol,
                    "Signal queue full, dropping signal"
                );
                Err(PublishError::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(signal)) => {
                increment(CounterMetric::SignalsDropped);
                tracing::warn!(
                    id = %signal.id,
                    symbol = %signal.symbol,
                    "Signal worker gone, dropping signal"
                );
                Err(PublishError::Closed)
            }
        }
    }
}

/// Hand one signal to the sink; true when the sink accepted it
async fn deliver(sink: &dyn EventSink, signal: &Signal) -> bool {
    match sink.publish(signal).await {
        Ok(()) => {
            increment(CounterMetric::SignalsPublished);
            tracing::info!(
                id = %signal.id,
                symbol = %signal.symbol,
                direction = %signal.direction,
                change_pct = %signal.change_percent,
                confidence = signal.confidence,
                "Signal published"
            );
            true
        }
        Err(e) => {
            increment(CounterMetric::SinkFailures);
            tracing::error!(
                id = %signal.id,
                symbol = %signal.symbol,
                error = %e,
                "Signal delivery failed"
            );
            false
        }
    }
}
