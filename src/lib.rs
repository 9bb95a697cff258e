pub mod cli;
pub mod commands;
pub mod exchange;
pub mod export;
pub mod history;
pub mod observability;
pub mod screener;
pub mod strategy;
pub mod types;
