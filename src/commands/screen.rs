//! Screen command handler.
//!
//! Implements the `screen` subcommand: lead-lag screening of the universe
//! against the anchors, a results table and a file export.

use crate::cli::ScreenCliConfig;
use crate::exchange::{BinanceClient, MarketDataProvider};
use crate::export::write_records;
use crate::screener::{ScreenReport, TargetOutcome, UniverseScreener};
use crate::types::{Clock, SystemClock};

use tracing::{info, warn};

/// Run the screen against Binance and export the ranked records.
///
/// # Errors
/// Returns error on invalid configuration, a failed universe listing or a
/// failed export. Per-symbol fetch failures are reported, not raised.
pub async fn run_screen(args: &ScreenCliConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("--- lagscreen: Lead-Lag Screen (Binance) ---");

    let client = BinanceClient::new()?;
    let clock = SystemClock;

    let report = execute_screen(&client, &clock, args).await?;
    print_report(&report);

    let written = write_records(&args.output, &report.records)?;
    println!("\n✓ Saved {} records to {}", written, args.output);

    Ok(())
}

/// Resolve configuration and run the screener against any provider.
pub async fn execute_screen<P: MarketDataProvider + ?Sized>(
    provider: &P,
    clock: &dyn Clock,
    args: &ScreenCliConfig,
) -> Result<ScreenReport, Box<dyn std::error::Error>> {
    let config = args.to_screener_config()?;
    let universe = args.universe()?;

    info!(
        anchors = ?config.anchors,
        interval = %config.interval,
        lookback = config.lookback_days,
        max_lag = config.max_lag,
        min_volume = %config.min_liquidity,
        min_corr = config.min_abs_correlation,
        explicit_universe = universe.is_some(),
        "Configuration loaded"
    );

    let screener = UniverseScreener::new(provider, clock, config)?;
    let report = match universe {
        Some(symbols) => screener.screen(&symbols).await,
        None => screener.run().await?,
    };

    Ok(report)
}

fn print_report(report: &ScreenReport) {
    for failure in &report.failed_anchors {
        warn!(anchor = %failure.anchor, reason = %failure.reason, "Anchor skipped");
    }

    if report.records.is_empty() {
        warn!("No targets matched the screening criteria");
    } else {
        println!(
            "\n{:<12} | {:<16} | {:>6} | {:>11} | {:>18}",
            "Anchor", "Target", "Lag", "Correlation", "24h Volume (USDT)"
        );
        println!("{}", "-".repeat(75));

        for record in &report.records {
            println!(
                "{:<12} | {:<16} | {:>6} | {:>11.5} | {:>18.2}",
                record.anchor, record.target, record.lag, record.correlation, record.volume
            );
        }
    }

    let failed: Vec<&str> = report
        .attempts
        .iter()
        .filter(|a| matches!(a.outcome, TargetOutcome::FailedFetch { .. }))
        .map(|a| a.target.as_str())
        .collect();

    println!(
        "\nScreened {} targets: {} qualified, {} below threshold, {} illiquid, {} failed",
        report.attempts.len(),
        report.count("qualified"),
        report.count("below_threshold"),
        report.count("skipped_liquidity"),
        failed.len()
    );
    if !failed.is_empty() {
        println!("  Failed: {}", failed.join(", "));
    }
}
