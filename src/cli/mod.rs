//! CLI interface for move-screener
//!
//! Provides subcommands for:
//! - `run`: Live scanning against the exchange
//! - `scan`: Offline analysis of recorded price points
//! - `config`: Show the effective configuration

mod run;
mod scan;

pub use run::RunArgs;
pub use scan::{load_points, OutputFormat, ScanArgs};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "move-screener")]
#[command(about = "Detects, scores and confirms crypto growth/fall moves")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Screen live market data
    Run(RunArgs),
    /// Analyse a JSON file of price points
    Scan(ScanArgs),
    /// Show configuration
    Config,
}
