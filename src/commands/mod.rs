//! CLI command handlers.
//!
//! This module contains the implementation for each CLI subcommand,
//! delegating to the screener and signal rule.

mod screen;
mod signals;
mod symbols;

pub use screen::{execute_screen, run_screen};
pub use signals::{execute_signals, run_signals};
pub use symbols::run_symbols;
