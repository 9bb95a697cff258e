//! lagscreen - Lead-lag correlation screener
//!
//! Entry point for the CLI application. Parses arguments and dispatches
//! to the appropriate command handler.

use clap::Parser;
use dotenv::dotenv;

use lagscreen::cli::{Cli, Commands, ScreenCliConfig, SignalsCliConfig};
use lagscreen::commands::{run_screen, run_signals, run_symbols};
use lagscreen::observability::init_tracing;

// Requests are awaited strictly one after another
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from the .env file
    dotenv().ok();

    let cli = Cli::parse();

    init_tracing(&cli.verbose)?;

    match cli.command {
        Commands::Screen {
            config,
            anchors,
            symbols,
            quote_asset,
            status,
            interval,
            lookback_days,
            max_lag,
            min_volume,
            min_correlation,
            throttle_ms,
            max_points_per_request,
            output,
        } => {
            let args = ScreenCliConfig {
                config_path: config,
                anchors,
                symbols,
                quote_asset,
                status,
                interval,
                lookback_days,
                max_lag,
                min_volume,
                min_correlation,
                throttle_ms,
                max_points_per_request,
                output,
            };
            run_screen(&args).await?;
        }
        Commands::Signals {
            target,
            anchor,
            interval,
            lookback_days,
            pump_threshold,
            output,
        } => {
            let args = SignalsCliConfig {
                target,
                anchor,
                interval,
                lookback_days,
                pump_threshold,
                output,
            };
            run_signals(&args).await?;
        }
        Commands::Symbols { quote_asset, status } => {
            run_symbols(&quote_asset, &status).await?;
        }
    }

    Ok(())
}
