//! Signal sinks

use super::Signal;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Publishing errors
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Signal queue full")]
    QueueFull,
    #[error("Signal queue closed")]
    Closed,
    #[error("Failed to encode signal: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Sink error: {0}")]
    Sink(String),
}

/// Downstream consumer of signals
///
/// Delivery is at-most-once; a failed publish is logged and not retried.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, signal: &Signal) -> Result<(), PublishError>;
}

/// Writes each signal as one JSON log line
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl EventSink for LogSink {
    async fn publish(&self, signal: &Signal) -> Result<(), PublishError> {
        let payload = serde_json::to_string(signal)?;
        tracing::info!(
            target: "signals",
            symbol = %signal.symbol,
            direction = %signal.direction,
            period = %signal.period,
            signal = %payload,
            "Signal"
        );
        Ok(())
    }
}

/// Forwards signals to an in-process consumer
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<Signal>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Signal>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving end
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Signal>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn publish(&self, signal: &Signal) -> Result<(), PublishError> {
        self.tx
            .send(signal.clone())
            .await
            .map_err(|_| PublishError::Closed)
    }
}
