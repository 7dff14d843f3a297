//! Confidence scoring
//!
//! Composes independently capped sub-scores (magnitude, volume, duration,
//! volatility, data points, continuity, trend strength) into a value in
//! [0, 100]. Deterministic: the same inputs always produce the same score.

mod scorer;
pub mod stats;

pub use scorer::{ConfidenceScorer, ScoreInputs, MAX_CONFIDENCE};
