//! Binance Spot public market data
//!
//! Only unauthenticated endpoints are used, so no credentials are required.

pub mod client;

pub use client::BinanceClient;
