//! Confirmation state machine

use super::{ConfirmationConfig, ConfirmationCounter, ConfirmationOutcome, ConfirmationProgress};
use crate::clock::{saturating_minutes, Clock};
use crate::market::{Direction, Period, PeriodDurations};
use chrono::Duration;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Counts consecutive same-direction observations per (symbol, period)
///
/// A counter restarts when its period window has elapsed since the last reset
/// or when the observed direction flips. The observation that triggers the
/// restart is the first one of the new window.
pub struct ConfirmationManager {
    counters: RwLock<HashMap<String, ConfirmationCounter>>,
    signal_threshold: u32,
    durations: PeriodDurations,
    clock: Arc<dyn Clock>,
}

impl ConfirmationManager {
    /// Create a manager from configuration
    pub fn new(config: &ConfirmationConfig, clock: Arc<dyn Clock>) -> Self {
        let mut durations = PeriodDurations::nominal();
        for (label, minutes) in &config.period_minutes {
            match label.parse::<Period>() {
                Ok(period) if *minutes > 0 => {
                    durations = durations.with_override(period, saturating_minutes(*minutes));
                }
                Ok(_) => tracing::warn!(period = %label, "Ignoring non-positive period override"),
                Err(e) => tracing::warn!(error = %e, "Ignoring period override"),
            }
        }

        Self::with_durations(config.signal_threshold, durations, clock)
    }

    /// Create a manager with an explicit duration table
    pub fn with_durations(
        signal_threshold: u32,
        durations: PeriodDurations,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            signal_threshold: signal_threshold.max(1),
            durations,
            clock,
        }
    }

    fn key(symbol: &str, period: Period) -> String {
        format!("{}:{}", symbol, period)
    }

    pub fn signal_threshold(&self) -> u32 {
        self.signal_threshold
    }

    /// Record one observation and report whether a signal is due
    pub async fn add_confirmation(
        &self,
        symbol: &str,
        period: Period,
        direction: Direction,
    ) -> ConfirmationOutcome {
        let now = self.clock.now();
        let window = self.durations.get(period);
        let key = Self::key(symbol, period);

        let mut counters = self.counters.write().await;
        let counter = counters.entry(key).or_insert_with(|| ConfirmationCounter {
            direction,
            count: 0,
            last_update: now,
            last_reset: now,
        });

        if now - counter.last_reset > window {
            tracing::debug!(
                symbol,
                period = %period,
                previous = counter.count,
                "Confirmation window expired"
            );
            counter.count = 0;
            counter.last_reset = now;
            counter.direction = direction;
        } else if counter.direction != direction {
            tracing::debug!(
                symbol,
                period = %period,
                from = %counter.direction,
                to = %direction,
                previous = counter.count,
                "Direction flipped, confirmations reset"
            );
            counter.count = 0;
            counter.last_reset = now;
            counter.direction = direction;
        }

        counter.count = counter.count.saturating_add(1);
        counter.last_update = now;

        let count = counter.count;
        ConfirmationOutcome {
            threshold_reached: count > 0 && count % self.signal_threshold == 0,
            count,
        }
    }

    /// Zero a counter and restart its window, keeping its direction
    pub async fn reset(&self, symbol: &str, period: Period) {
        let now = self.clock.now();
        let mut counters = self.counters.write().await;
        if let Some(counter) = counters.get_mut(&Self::key(symbol, period)) {
            counter.count = 0;
            counter.last_reset = now;
            counter.last_update = now;
        }
    }

    /// Current state of a counter
    pub async fn progress(&self, symbol: &str, period: Period) -> Option<ConfirmationProgress> {
        let counters = self.counters.read().await;
        counters
            .get(&Self::key(symbol, period))
            .map(|counter| ConfirmationProgress {
                direction: counter.direction,
                count: counter.count,
                threshold: self.signal_threshold,
                remaining: self.signal_threshold - counter.count % self.signal_threshold,
                last_update: counter.last_update,
            })
    }

    /// Remove counters not updated within `max_age`; returns how many were removed
    pub async fn cleanup(&self, max_age: Duration) -> usize {
        let now = self.clock.now();
        let mut counters = self.counters.write().await;
        let before = counters.len();
        counters.retain(|_, counter| now - counter.last_update <= max_age);
        let removed = before - counters.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = counters.len(), "Swept stale confirmation counters");
        }
        removed
    }

    /// Number of tracked counters
    pub async fn len(&self) -> usize {
        self.counters.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
