//! Row parsing for a single delimited source file.

use std::collections::BTreeMap;
use std::io::Read;

use thiserror::Error;
use tracing::{debug, warn};

use crate::series::{CityName, ClimateSeries, VariableKind, MONTHS};

/// Field spellings that mark a monthly value as explicitly missing.
const MISSING_MARKERS: &[&str] = &["na", "n/a", "nan", "null", "-"];

/// Why a row was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedReason {
    #[error("expected {expected} monthly fields, found {found}")]
    TooFewFields { expected: usize, found: usize },
    #[error("city name is empty")]
    MissingCity,
    #[error("month {month} has non-numeric value '{value}'")]
    InvalidValue { month: usize, value: String },
    #[error("duplicate row for this city")]
    Duplicate,
    #[error("row could not be decoded: {0}")]
    Undecodable(String),
}

/// One source row that was dropped. Loading continues past it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("malformed {variable} record at line {line} ({city}): {reason}")]
pub struct MalformedRecord {
    pub variable: VariableKind,
    pub line: u64,
    pub city: String,
    pub reason: MalformedReason,
}

/// Parsed contents of one source.
#[derive(Debug, Default)]
pub struct ParsedSource {
    pub series: BTreeMap<CityName, ClimateSeries>,
    pub malformed: Vec<MalformedRecord>,
}

/// Parses one monthly field. `Ok(None)` is an explicit missing value.
fn parse_month_field(raw: &str) -> Result<Option<f64>, ()> {
    let field = raw.trim();
    if field.is_empty() || MISSING_MARKERS.contains(&field.to_lowercase().as_str()) {
        return Ok(None);
    }
    match field.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(()),
    }
}

/// Parses a row's fields after the city column into 12 monthly values.
fn parse_months(fields: &[&str]) -> Result<Vec<Option<f64>>, MalformedReason> {
    if fields.len() < MONTHS {
        return Err(MalformedReason::TooFewFields {
            expected: MONTHS,
            found: fields.len(),
        });
    }

    fields[..MONTHS]
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            parse_month_field(raw).map_err(|_| MalformedReason::InvalidValue {
                month: i + 1,
                value: raw.trim().to_string(),
            })
        })
        .collect()
}

/// Reads every row of a source. I/O failures are returned; bad rows are
/// collected as [`MalformedRecord`]s and logged.
pub fn read_source<R: Read>(
    input: R,
    variable: &VariableKind,
    has_headers: bool,
    delimiter: u8,
) -> Result<ParsedSource, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(input);

    let mut parsed = ParsedSource::default();

    for (row_idx, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(row_idx as u64 + 1);
                let bad = MalformedRecord {
                    variable: variable.clone(),
                    line,
                    city: String::new(),
                    reason: MalformedReason::Undecodable(e.to_string()),
                };
                warn!("{}", bad);
                parsed.malformed.push(bad);
                continue;
            }
        };

        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(row_idx as u64 + 1);
        let fields: Vec<&str> = record.iter().collect();
        let raw_city = fields.first().copied().unwrap_or("");

        // Blank lines come through as a single empty field.
        if fields.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let outcome = match CityName::new(raw_city) {
            None => Err(MalformedReason::MissingCity),
            Some(city) if parsed.series.contains_key(&city) => Err(MalformedReason::Duplicate),
            Some(city) => parse_months(&fields[1..]).map(|values| (city, values)),
        };

        match outcome {
            Ok((city, values)) => {
                let series = ClimateSeries::new(values);
                if series.needs_cleanup() {
                    debug!(
                        city = %city,
                        variable = %variable,
                        missing = series.missing_count(),
                        "series has missing months"
                    );
                }
                parsed.series.insert(city, series);
            }
            Err(reason) => {
                let bad = MalformedRecord {
                    variable: variable.clone(),
                    line,
                    city: raw_city.trim().to_string(),
                    reason,
                };
                warn!("{}", bad);
                parsed.malformed.push(bad);
            }
        }
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ParsedSource {
        read_source(text.as_bytes(), &VariableKind::Temperature, true, b',').unwrap()
    }

    const HEADER: &str = "city,jan,feb,mar,apr,may,jun,jul,aug,sep,oct,nov,dec\n";

    #[test]
    fn test_well_formed_rows_load() {
        let text = format!(
            "{}Hanoi,20,21,22,23,24,25,26,27,28,29,30,31\nHue,1,1,1,1,1,1,1,1,1,1,1,1\n",
            HEADER
        );
        let parsed = parse(&text);
        assert_eq!(parsed.series.len(), 2);
        assert!(parsed.malformed.is_empty());

        let hanoi = &parsed.series[&CityName::new("hanoi").unwrap()];
        assert!(hanoi.is_complete());
        assert_eq!(hanoi.values()[11], Some(31.0));
    }

    #[test]
    fn test_short_row_is_malformed_and_others_survive() {
        let text = format!(
            "{}Hanoi,1,2,3,4,5,6,7,8,9,10,11\nHue,1,1,1,1,1,1,1,1,1,1,1,1\n",
            HEADER
        );
        let parsed = parse(&text);
        assert_eq!(parsed.series.len(), 1);
        assert_eq!(parsed.malformed.len(), 1);
        assert_eq!(
            parsed.malformed[0].reason,
            MalformedReason::TooFewFields { expected: 12, found: 11 }
        );
        assert_eq!(parsed.malformed[0].city, "Hanoi");
        assert_eq!(parsed.malformed[0].line, 2);
    }

    #[test]
    fn test_non_numeric_field_is_malformed() {
        let text = format!("{}Hanoi,1,2,x,4,5,6,7,8,9,10,11,12\n", HEADER);
        let parsed = parse(&text);
        assert!(parsed.series.is_empty());
        assert_eq!(
            parsed.malformed[0].reason,
            MalformedReason::InvalidValue { month: 3, value: "x".to_string() }
        );
    }

    #[test]
    fn test_missing_markers_keep_series_incomplete() {
        let text = format!("{}Hanoi,1,2,NA,4,,6,7,8,9,10,11,12\n", HEADER);
        let parsed = parse(&text);
        let hanoi = &parsed.series[&CityName::new("hanoi").unwrap()];
        assert!(!hanoi.is_complete());
        assert!(hanoi.needs_cleanup());
        assert_eq!(hanoi.values()[2], None);
        assert_eq!(hanoi.values()[4], None);
    }

    #[test]
    fn test_duplicate_city_keeps_first_row() {
        let text = format!(
            "{} Hanoi ,1,1,1,1,1,1,1,1,1,1,1,1\nHANOI,2,2,2,2,2,2,2,2,2,2,2,2\n",
            HEADER
        );
        let parsed = parse(&text);
        assert_eq!(parsed.series.len(), 1);
        assert_eq!(parsed.malformed[0].reason, MalformedReason::Duplicate);
        let hanoi = &parsed.series[&CityName::new("hanoi").unwrap()];
        assert_eq!(hanoi.values()[0], Some(1.0));
    }

    #[test]
    fn test_blank_city_is_malformed() {
        let text = format!("{} ,1,1,1,1,1,1,1,1,1,1,1,1\n", HEADER);
        let parsed = parse(&text);
        assert_eq!(parsed.malformed[0].reason, MalformedReason::MissingCity);
    }

    #[test]
    fn test_extra_trailing_fields_are_ignored() {
        let text = format!("{}Hue,1,1,1,1,1,1,1,1,1,1,1,1,99,100\n", HEADER);
        let parsed = parse(&text);
        assert!(parsed.series[&CityName::new("hue").unwrap()].is_complete());
    }
}
