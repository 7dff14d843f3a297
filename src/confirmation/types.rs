//! Confirmation tracking types

use crate::market::Direction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Confirmation state machine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    /// A signal is due every `signal_threshold` confirmations (3, 6, 9, ...)
    #[serde(default = "default_signal_threshold")]
    pub signal_threshold: u32,

    /// Period window overrides in minutes, keyed by period label ("5m", "1h", ...)
    #[serde(default)]
    pub period_minutes: BTreeMap<String, i64>,
}

fn default_signal_threshold() -> u32 {
    3
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            signal_threshold: 3,
            period_minutes: BTreeMap::new(),
        }
    }
}

/// Per-(symbol, period) counter of consecutive same-direction observations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationCounter {
    pub direction: Direction,
    pub count: u32,
    pub last_update: DateTime<Utc>,
    pub last_reset: DateTime<Utc>,
}

/// Result of recording one observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationOutcome {
    /// `count` is a positive multiple of the signal threshold
    pub threshold_reached: bool,
    /// Count after this observation
    pub count: u32,
}

/// Read-only view of a counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationProgress {
    pub direction: Direction,
    pub count: u32,
    pub threshold: u32,
    /// Observations left until the next signal is due
    pub remaining: u32,
    pub last_update: DateTime<Utc>,
}
