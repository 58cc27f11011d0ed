//! Export module for saving forecast results.
//!
//! Supports comma- and tab-delimited tables with `City`, `Data Type` and
//! `Forecast` columns, and a structured JSON form that also carries the
//! fit error and confidence interval.

mod json;
mod table;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::features::ForecastMap;

pub use table::format_forecast;

/// Errors that can occur during export. None of them touch in-memory state.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported export format for '{0}' (expected .csv, .tsv, .txt or .json)")]
    UnsupportedFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated table.
    Csv,
    /// Tab-separated table.
    Tsv,
    /// JSON array of forecast records.
    Json,
}

impl ExportFormat {
    /// Infers the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "tsv" | "txt" => Ok(ExportFormat::Tsv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ExportError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }
}

/// Options for forecast export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Explicit format. Inferred from the path extension when `None`.
    pub format: Option<ExportFormat>,
    /// Add `Error`, `CI Low` and `CI High` columns to delimited tables.
    pub include_uncertainty: bool,
}

/// What an export call wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub rows: usize,
}

/// Renders forecasts in `format` without writing anything.
pub fn render_forecasts(
    forecasts: &ForecastMap,
    format: ExportFormat,
    include_uncertainty: bool,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Csv => table::render_table(forecasts, b',', include_uncertainty),
        ExportFormat::Tsv => table::render_table(forecasts, b'\t', include_uncertainty),
        ExportFormat::Json => json::render_json(forecasts),
    }
}

/// Writes forecasts to `path`.
///
/// # Arguments
/// * `path` - Output file path; the parent directory is created if missing
/// * `forecasts` - Forecast results keyed by (city, variable)
/// * `options` - Format and column options
///
/// # Returns
/// A summary of what was written, or an error if export fails
pub fn export_forecasts(
    path: &Path,
    forecasts: &ForecastMap,
    options: &ExportOptions,
) -> Result<ExportSummary, ExportError> {
    let format = match options.format {
        Some(format) => format,
        None => ExportFormat::from_path(path)?,
    };

    let content = render_forecasts(forecasts, format, options.include_uncertainty)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;

    info!(
        path = %path.display(),
        format = format.extension(),
        rows = forecasts.len(),
        "forecasts exported"
    );

    Ok(ExportSummary {
        path: path.to_path_buf(),
        format,
        rows: forecasts.len(),
    })
}
