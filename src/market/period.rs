//! Analysis periods and their nominal durations

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Analysis window a confirmation counter and a signal belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

/// Returned when a period label is not recognised
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown period: {0}")]
pub struct UnknownPeriod(pub String);

impl Period {
    pub const ALL: [Period; 6] = [
        Period::M5,
        Period::M15,
        Period::M30,
        Period::H1,
        Period::H4,
        Period::D1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::M5 => "5m",
            Period::M15 => "15m",
            Period::M30 => "30m",
            Period::H1 => "1h",
            Period::H4 => "4h",
            Period::D1 => "1d",
        }
    }

    pub fn minutes(&self) -> i64 {
        match self {
            Period::M5 => 5,
            Period::M15 => 15,
            Period::M30 => 30,
            Period::H1 => 60,
            Period::H4 => 240,
            Period::D1 => 1440,
        }
    }

    /// Nominal duration of the period
    pub fn duration(&self) -> Duration {
        Duration::minutes(self.minutes())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "5m" => Ok(Period::M5),
            "15m" => Ok(Period::M15),
            "30m" => Ok(Period::M30),
            "1h" | "60m" => Ok(Period::H1),
            "4h" | "240m" => Ok(Period::H4),
            "1d" | "24h" => Ok(Period::D1),
            other => Err(UnknownPeriod(other.to_string())),
        }
    }
}

/// Period → duration table, nominal by default with optional overrides
#[derive(Debug, Clone, Default)]
pub struct PeriodDurations {
    overrides: HashMap<Period, Duration>,
}

impl PeriodDurations {
    /// Table with nominal durations only
    pub fn nominal() -> Self {
        Self::default()
    }

    /// Override the duration of one period
    pub fn with_override(mut self, period: Period, duration: Duration) -> Self {
        self.overrides.insert(period, duration);
        self
    }

    pub fn get(&self, period: Period) -> Duration {
        self.overrides
            .get(&period)
            .copied()
            .unwrap_or_else(|| period.duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_parse_roundtrip() {
        for period in Period::ALL {
            assert_eq!(period.as_str().parse::<Period>().unwrap(), period);
        }
    }

    #[test]
    fn test_period_aliases() {
        assert_eq!("60m".parse::<Period>().unwrap(), Period::H1);
        assert_eq!(" 1D ".parse::<Period>().unwrap(), Period::D1);
    }

    #[test]
    fn test_unknown_period() {
        let err = "2h".parse::<Period>().unwrap_err();
        assert_eq!(err, UnknownPeriod("2h".to_string()));
    }

    #[test]
    fn test_period_durations() {
        assert_eq!(Period::M5.duration(), Duration::minutes(5));
        assert_eq!(Period::H4.duration(), Duration::hours(4));
        assert_eq!(Period::D1.duration(), Duration::days(1));
    }

    #[test]
    fn test_duration_table_override() {
        let table = PeriodDurations::nominal().with_override(Period::M5, Duration::minutes(7));
        assert_eq!(table.get(Period::M5), Duration::minutes(7));
        assert_eq!(table.get(Period::M15), Duration::minutes(15));
    }

    #[test]
    fn test_period_serde() {
        let json = serde_json::to_string(&Period::M15).unwrap();
        assert_eq!(json, "\"15m\"");
    }
}
