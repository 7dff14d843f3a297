//! Additive confidence scorer

use crate::detector::Algorithm;

/// Upper bound of every confidence value
pub const MAX_CONFIDENCE: f64 = 100.0;

/// Raw measurements of one candidate move
#[derive(Debug, Clone, Default)]
pub struct ScoreInputs {
    /// Signed change across the move, in percent
    pub change_percent: f64,
    /// Average 24h volume over the points of the move
    pub avg_volume: f64,
    /// Wall time covered by the move
    pub elapsed_minutes: f64,
    /// Price dispersion relative to the mean, in percent
    pub volatility_pct: f64,
    /// Number of observations in the move
    pub data_points: usize,
    /// Fraction of steps in the move's direction (interval/continuous only)
    pub continuity_ratio: f64,
    /// Regression-derived trend strength, 0..=10 (interval/continuous only)
    pub trend_strength: f64,
}

impl ScoreInputs {
    fn is_finite(&self) -> bool {
        [
            self.change_percent,
            self.avg_volume,
            self.elapsed_minutes,
            self.volatility_pct,
            self.continuity_ratio,
            self.trend_strength,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Scores candidate moves for each detection algorithm
#[derive(Debug, Clone)]
pub struct ConfidenceScorer {
    volume_weight: f64,
}

impl ConfidenceScorer {
    /// Create a scorer; `volume_weight` scales the volume term
    pub fn new(volume_weight: f64) -> Self {
        let volume_weight = if volume_weight.is_finite() {
            volume_weight.max(0.0)
        } else {
            1.0
        };
        Self { volume_weight }
    }

    /// Total confidence for a candidate found by `algorithm`
    pub fn score(&self, algorithm: Algorithm, inputs: &ScoreInputs) -> f64 {
        if !inputs.is_finite() {
            return 0.0;
        }

        let mut total = Self::magnitude_term(algorithm, inputs.change_percent)
            + self.volume_term(inputs.avg_volume)
            + Self::duration_term(inputs.elapsed_minutes)
            + Self::volatility_term(inputs.volatility_pct)
            + Self::data_point_term(inputs.data_points);

        if algorithm != Algorithm::Single {
            total += Self::continuity_term(algorithm, inputs.continuity_ratio)
                + Self::trend_term(inputs.trend_strength);
        }

        if !total.is_finite() {
            return 0.0;
        }
        total.clamp(0.0, MAX_CONFIDENCE)
    }

    /// `min(|change| * k, cap)` with per-algorithm k and cap
    pub fn magnitude_term(algorithm: Algorithm, change_percent: f64) -> f64 {
        let (k, cap) = match algorithm {
            Algorithm::Single => (10.0, 70.0),
            Algorithm::Interval => (8.0, 80.0),
            Algorithm::Continuous => (12.0, 90.0),
        };
        if !change_percent.is_finite() {
            return 0.0;
        }
        (change_percent.abs() * k).min(cap)
    }

    /// Liquidity term, thin books are penalised
    pub fn volume_term(&self, avg_volume: f64) -> f64 {
        let base = if avg_volume > 1_000_000.0 {
            10.0
        } else if avg_volume > 500_000.0 {
            7.0
        } else if avg_volume > 100_000.0 {
            5.0
        } else if avg_volume >= 50_000.0 {
            3.0
        } else {
            -5.0
        };
        base * self.volume_weight
    }

    /// Fast moves score higher than slow drifts
    pub fn duration_term(elapsed_minutes: f64) -> f64 {
        if elapsed_minutes < 5.0 {
            15.0
        } else if elapsed_minutes < 15.0 {
            10.0
        } else if elapsed_minutes < 30.0 {
            5.0
        } else if elapsed_minutes <= 60.0 {
            0.0
        } else {
            -10.0
        }
    }

    /// Noisy series lower confidence
    pub fn volatility_term(volatility_pct: f64) -> f64 {
        if volatility_pct < 2.0 {
            10.0
        } else if volatility_pct < 5.0 {
            5.0
        } else if volatility_pct <= 10.0 {
            0.0
        } else {
            -10.0
        }
    }

    /// 1.5 per observation, max 15 at ten or more
    pub fn data_point_term(data_points: usize) -> f64 {
        data_points.min(10) as f64 * 1.5
    }

    pub fn continuity_term(algorithm: Algorithm, continuity_ratio: f64) -> f64 {
        let ratio = continuity_ratio.clamp(0.0, 1.0);
        match algorithm {
            Algorithm::Single => 0.0,
            Algorithm::Interval => ratio * 10.0,
            Algorithm::Continuous => ratio * 15.0,
        }
    }

    pub fn trend_term(trend_strength: f64) -> f64 {
        trend_strength.clamp(0.0, 10.0)
    }
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new(1.0)
    }
}
