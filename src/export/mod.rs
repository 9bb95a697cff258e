//! Result export
//!
//! Writes screening records as CSV or JSON (chosen by file extension) and
//! signal sequences as CSV.

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::screener::ScreeningRecord;
use crate::strategy::TimedSignal;

const RECORD_HEADER: [&str; 5] = ["anchor", "target", "lag_hr", "correlation", "avg_volume_usdt"];
const SIGNAL_HEADER: [&str; 2] = ["timestamp", "signal"];

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// `.json` (any case) is JSON; everything else is CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Csv,
        }
    }
}

/// One exported screening row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub anchor: String,
    pub target: String,
    pub lag_hr: usize,
    /// Rounded to 5 decimal places
    pub correlation: f64,
    /// Rounded to 2 decimal places
    pub avg_volume_usdt: f64,
}

impl From<&ScreeningRecord> for ExportRow {
    fn from(record: &ScreeningRecord) -> Self {
        Self {
            anchor: record.anchor.clone(),
            target: record.target.clone(),
            lag_hr: record.lag,
            correlation: round_to(record.correlation, 5),
            avg_volume_usdt: record.volume.round_dp(2).to_f64().unwrap_or(0.0),
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Write `records` to `path` in the format implied by its extension.
///
/// Returns the number of rows written. A header is written even when there
/// are no records.
pub fn write_records(path: impl AsRef<Path>, records: &[ScreeningRecord]) -> Result<usize, ExportError> {
    let path = path.as_ref();
    let rows: Vec<ExportRow> = records.iter().map(ExportRow::from).collect();
    let format = ExportFormat::from_path(path);

    match format {
        ExportFormat::Csv => {
            let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
            writer.write_record(RECORD_HEADER)?;
            for row in &rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        ExportFormat::Json => {
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, &rows)?;
        }
    }

    info!(path = %path.display(), rows = rows.len(), format = ?format, "Results exported");
    Ok(rows.len())
}

/// Write a `timestamp,signal` CSV.
pub fn write_signals_csv(path: impl AsRef<Path>, signals: &[TimedSignal]) -> Result<usize, ExportError> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(SIGNAL_HEADER)?;
    for signal in signals {
        writer.serialize(signal)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = signals.len(), "Signals exported");
    Ok(signals.len())
}
