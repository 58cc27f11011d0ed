//! Structured JSON forecast export.

use serde::Serialize;

use crate::features::ForecastMap;

use super::ExportError;

#[derive(Debug, Serialize)]
struct ForecastRecord<'a> {
    city: &'a str,
    variable: String,
    method: &'static str,
    forecast: &'a [f64],
    error: f64,
    confidence_interval: Vec<[f64; 2]>,
}

/// Renders every forecast, including error and interval, as a JSON array.
pub(crate) fn render_json(forecasts: &ForecastMap) -> Result<String, ExportError> {
    let records: Vec<ForecastRecord> = forecasts
        .iter()
        .map(|(key, result)| ForecastRecord {
            city: key.city.as_str(),
            variable: key.variable.name(),
            method: result.method.name(),
            forecast: &result.forecast,
            error: result.error,
            confidence_interval: result
                .confidence_interval
                .iter()
                .map(|&(lo, hi)| [lo, hi])
                .collect(),
        })
        .collect();

    Ok(serde_json::to_string_pretty(&records)?)
}
