use clap::Parser;
use move_screener::cli::{Cli, Commands};
use move_screener::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize telemetry
    move_screener::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting live screening");
            args.execute(&config).await?;
        }
        Commands::Scan(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("# Effective configuration ({})", cli.config);
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
