//! move-screener: crypto price move screener
//!
//! This library provides the core components for:
//! - Bounded per-symbol price history and a Bybit REST feed
//! - Change detection with single, interval and continuous algorithms
//! - Weighted confidence scoring
//! - Per-(symbol, period) confirmation tracking
//! - Volume-delta metric cache with api/storage/emulated fallback
//! - Signal assembly and bounded, non-blocking publishing
//! - Polling scanner and offline replay
//! - Structured logging and Prometheus metrics

pub mod cli;
pub mod clock;
pub mod confidence;
pub mod config;
pub mod confirmation;
pub mod detector;
pub mod engine;
pub mod feed;
pub mod indicators;
pub mod market;
pub mod metric;
pub mod signal;
pub mod telemetry;
