//! Series statistics used by the confidence terms

/// Arithmetic mean, `0.0` for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Dispersion of prices relative to their mean, in percent
pub fn volatility_pct(prices: &[f64]) -> f64 {
    let m = mean(prices);
    if m <= 0.0 {
        return 0.0;
    }
    std_dev(prices) / m * 100.0
}

/// Fraction of adjacent steps moving in the direction of `sign`
///
/// Flat steps count against continuity.
pub fn continuity_ratio(prices: &[f64], sign: f64) -> f64 {
    if prices.len() < 2 || sign == 0.0 {
        return 0.0;
    }
    let steps = prices.len() - 1;
    let aligned = prices
        .windows(2)
        .filter(|w| (w[1] - w[0]) * sign > 0.0)
        .count();
    aligned as f64 / steps as f64
}

/// Least-squares slope of `prices` against their index
pub fn regression_slope(prices: &[f64]) -> f64 {
    let n = prices.len();
    if n < 2 {
        return 0.0;
    }
    let n_f = n as f64;
    let x_mean = (n_f - 1.0) / 2.0;
    let y_mean = mean(prices);

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in prices.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }

    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Regression slope per step as a percent of the mean price, scaled by 10, capped at 10
pub fn trend_strength(prices: &[f64]) -> f64 {
    let m = mean(prices);
    if m <= 0.0 {
        return 0.0;
    }
    let slope_pct = regression_slope(prices).abs() / m * 100.0;
    (slope_pct * 10.0).min(10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std_dev() {
        assert_eq!(mean(&[]), 0.0);
        assert!((mean(&[1.0, 2.0, 3.0]) - 2.0).abs() < 1e-12);
        assert!((std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.0).abs() < 1e-12);
        assert_eq!(std_dev(&[5.0]), 0.0);
    }

    #[test]
    fn test_volatility_pct() {
        let v = volatility_pct(&[100.0, 102.0]);
        assert!((v - 1.0 / 101.0 * 100.0).abs() < 1e-9);
        assert_eq!(volatility_pct(&[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_continuity_ratio() {
        assert_eq!(continuity_ratio(&[100.0, 101.0, 102.0, 103.0], 1.0), 1.0);
        assert_eq!(continuity_ratio(&[100.0, 101.0, 100.5, 102.0, 103.0], 1.0), 0.75);
        // flat step does not count
        assert_eq!(continuity_ratio(&[100.0, 100.0, 101.0], 1.0), 0.5);
        assert_eq!(continuity_ratio(&[103.0, 102.0, 101.0], -1.0), 1.0);
        assert_eq!(continuity_ratio(&[100.0], 1.0), 0.0);
    }

    #[test]
    fn test_regression_slope() {
        assert!((regression_slope(&[100.0, 101.0, 102.0, 103.0]) - 1.0).abs() < 1e-12);
        assert!((regression_slope(&[10.0, 8.0, 6.0]) + 2.0).abs() < 1e-12);
        assert_eq!(regression_slope(&[5.0]), 0.0);
    }

    #[test]
    fn test_trend_strength_capped() {
        // 1 per step on a ~101.5 mean is just under 1% per step → ~9.85
        let t = trend_strength(&[100.0, 101.0, 102.0, 103.0]);
        assert!(t > 9.0 && t < 10.0);
        // 10% per step saturates
        assert_eq!(trend_strength(&[100.0, 110.0, 121.0]), 10.0);
        assert_eq!(trend_strength(&[100.0, 100.0, 100.0]), 0.0);
    }
}
