//! Symbols command handler.

use crate::exchange::{BinanceClient, MarketDataProvider};

use tracing::info;

/// Print the Binance symbols quoted in `quote_asset` with status `status`.
pub async fn run_symbols(quote_asset: &str, status: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = BinanceClient::new()?;
    let quote = quote_asset.trim().to_uppercase();
    let status = status.trim().to_uppercase();

    let symbols = client.list_symbols(&quote, &status).await?;
    info!(quote = %quote, status = %status, symbols = symbols.len(), "Universe listed");

    for symbol in &symbols {
        println!("{}", symbol);
    }
    println!("\n{} symbols ({} / {})", symbols.len(), quote, status);

    Ok(())
}
