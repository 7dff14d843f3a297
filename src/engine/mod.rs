//! Screening engine
//!
//! [`Analyzer`] runs the history → detect → confirm → publish pipeline for one
//! (symbol, period). [`Scanner`] drives it on a polling schedule.

mod analyzer;
mod scanner;

pub use analyzer::{AnalysisReport, AnalyzeError, Analyzer, DEFAULT_FETCH_TIMEOUT};
pub use scanner::{CycleStats, Scanner, ScannerConfig};
