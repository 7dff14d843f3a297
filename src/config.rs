//! Configuration types for move-screener

use crate::confirmation::ConfirmationConfig;
use crate::detector::DetectorConfig;
use crate::engine::ScannerConfig;
use crate::feed::{BybitConfig, BYBIT_API_URL};
use crate::metric::CacheConfig;
use crate::signal::PublisherConfig;
use crate::telemetry::LogFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Root configuration structure
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    /// Pass-through settings not interpreted by the engine
    #[serde(default)]
    pub extra: BTreeMap<String, toml::Value>,
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Prometheus scrape port; no exporter when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

/// Exchange REST configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Product category ("linear", "spot", ...)
    #[serde(default = "default_category")]
    pub category: String,

    /// Request timeout (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Recent trades considered for the live volume delta
    #[serde(default = "default_trade_limit")]
    pub trade_limit: u32,
}

fn default_base_url() -> String {
    BYBIT_API_URL.to_string()
}
fn default_category() -> String {
    "linear".to_string()
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_trade_limit() -> u32 {
    500
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            category: default_category(),
            request_timeout_secs: default_request_timeout_secs(),
            trade_limit: default_trade_limit(),
        }
    }
}

impl ExchangeConfig {
    pub fn to_bybit(&self) -> BybitConfig {
        BybitConfig {
            base_url: self.base_url.clone(),
            category: self.category.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            trade_limit: self.trade_limit.max(1),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise defaults
    pub fn load_or_default(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Render as TOML
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
