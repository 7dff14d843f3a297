//! Price change detection
//!
//! Scans one symbol's series with three independent algorithms:
//! - single-step: spikes between adjacent points
//! - interval: the tightest window explaining a move
//! - continuous: sustained runs of same-direction steps
//!
//! Results of all three are concatenated; a scan may yield several results of
//! different kinds for the same move.

mod continuous;
mod interval;
mod single;
mod types;
mod window;

pub use continuous::MIN_RUN_POINTS;
pub use types::{Algorithm, ChangeResult, DetectorConfig};

use crate::confidence::ConfidenceScorer;
use crate::market::PricePoint;
use window::Series;

/// Runs the detection algorithms over price series
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    config: DetectorConfig,
    scorer: ConfidenceScorer,
}

impl ChangeDetector {
    /// Create a detector with the given thresholds
    pub fn new(mut config: DetectorConfig) -> Self {
        config.continuity_threshold = config.continuity_threshold.clamp(0.0, 1.0);
        let scorer = ConfidenceScorer::new(config.volume_weight);
        Self { config, scorer }
    }

    pub fn with_defaults() -> Self {
        Self::new(DetectorConfig::default())
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Run all three algorithms; results ordered single, interval, continuous
    pub fn detect(&self, series: &[PricePoint]) -> Vec<ChangeResult> {
        if series.len() < 2 {
            tracing::debug!(points = series.len(), "Series too short for detection");
            return Vec::new();
        }

        let prepared = Series::new(series);
        let mut results = single::detect(&prepared, &self.config, &self.scorer);
        results.extend(interval::detect(&prepared, &self.config, &self.scorer));
        results.extend(continuous::detect(&prepared, &self.config, &self.scorer));

        tracing::trace!(
            symbol = %series[0].symbol,
            points = series.len(),
            results = results.len(),
            "Detection scan complete"
        );

        results
    }

    /// Adjacent-pair spikes only
    pub fn detect_single(&self, series: &[PricePoint]) -> Vec<ChangeResult> {
        if series.len() < 2 {
            return Vec::new();
        }
        single::detect(&Series::new(series), &self.config, &self.scorer)
    }

    /// Deduplicated intervals only
    pub fn detect_interval(&self, series: &[PricePoint]) -> Vec<ChangeResult> {
        if series.len() < 2 {
            return Vec::new();
        }
        interval::detect(&Series::new(series), &self.config, &self.scorer)
    }

    /// Continuous runs only
    pub fn detect_continuous(&self, series: &[PricePoint]) -> Vec<ChangeResult> {
        if series.len() < MIN_RUN_POINTS {
            return Vec::new();
        }
        continuous::detect(&Series::new(series), &self.config, &self.scorer)
    }
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::with_defaults()
    }
}
