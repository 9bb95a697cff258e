//! Signals command handler.
//!
//! Assembles target and anchor history and runs the pump-follow rule.

use crate::cli::SignalsCliConfig;
use crate::exchange::binance::client::MAX_KLINES_PER_REQUEST;
use crate::exchange::{BinanceClient, MarketDataProvider};
use crate::export::write_signals_csv;
use crate::history::HistoryAssembler;
use crate::strategy::{Signal, SignalRule, TimedSignal};
use crate::types::{Clock, SystemClock};

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::info;

/// Pause between chunk requests when assembling the two series
const CHUNK_THROTTLE: Duration = Duration::from_millis(300);

/// Evaluate the rule on live Binance history, print the schedule and
/// optionally export it.
///
/// # Errors
/// Returns error if either history cannot be assembled or the rule fails.
pub async fn run_signals(args: &SignalsCliConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("--- lagscreen: Pump-Follow Signals (Binance) ---");

    let client = BinanceClient::new()?;
    let clock = SystemClock;

    let rule = args.to_rule()?;
    println!("Strategy coins: {}", serde_json::to_string(&rule.metadata())?);

    let signals = execute_signals(&client, &clock, args).await?;

    let actions: Vec<&TimedSignal> = signals.iter().filter(|s| s.signal != Signal::Hold).collect();
    if actions.is_empty() {
        println!("\nNo pumps detected in {} candles", signals.len());
    } else {
        println!("\n{:<25} | {:>6}", "Timestamp", "Signal");
        println!("{}", "-".repeat(34));
        for row in &actions {
            println!("{:<25} | {:>6}", row.timestamp.format("%Y-%m-%d %H:%M UTC"), row.signal);
        }
    }

    println!(
        "\n{} candles: {} BUY, {} SELL",
        signals.len(),
        signals.iter().filter(|s| s.signal == Signal::Buy).count(),
        signals.iter().filter(|s| s.signal == Signal::Sell).count()
    );

    if let Some(path) = &args.output {
        let written = write_signals_csv(path, &signals)?;
        println!("\n✓ Saved {} signals to {}", written, path);
    }

    Ok(())
}

/// Assemble both legs from `provider` and evaluate the rule.
pub async fn execute_signals<P: MarketDataProvider + ?Sized>(
    provider: &P,
    clock: &dyn Clock,
    args: &SignalsCliConfig,
) -> Result<Vec<TimedSignal>, Box<dyn std::error::Error>> {
    let rule = args.to_rule()?;
    let interval = args.interval()?;
    let assembler = HistoryAssembler::new(provider, clock, MAX_KLINES_PER_REQUEST, CHUNK_THROTTLE);

    let target = assembler
        .assemble(&args.target.to_uppercase(), interval, args.lookback_days)
        .await?;
    let anchor = assembler
        .assemble(&args.anchor.to_uppercase(), interval, args.lookback_days)
        .await?;

    let timestamps: Vec<DateTime<Utc>> = target.timestamps().collect();
    let signals = rule.evaluate(&timestamps, &anchor)?;

    info!(
        target = %target.symbol(),
        anchor = %anchor.symbol(),
        candles = signals.len(),
        "Signals ready"
    );

    Ok(signals)
}
