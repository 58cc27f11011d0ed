//! Delimited-text forecast tables.

use crate::features::{ForecastMap, ForecastResult};

use super::ExportError;

const BASE_HEADER: [&str; 3] = ["City", "Data Type", "Forecast"];
const UNCERTAINTY_HEADER: [&str; 3] = ["Error", "CI Low", "CI High"];

/// Forecast values at one decimal, comma-joined: `32.0,33.0`.
pub fn format_forecast(values: &[f64]) -> String {
    join_one_decimal(values.iter().copied())
}

fn join_one_decimal(values: impl Iterator<Item = f64>) -> String {
    values.map(|v| format!("{:.1}", v)).collect::<Vec<_>>().join(",")
}

fn uncertainty_fields(result: &ForecastResult) -> [String; 3] {
    [
        format!("{:.3}", result.error),
        join_one_decimal(result.confidence_interval.iter().map(|ci| ci.0)),
        join_one_decimal(result.confidence_interval.iter().map(|ci| ci.1)),
    ]
}

/// Renders one row per forecast, in key order.
pub(crate) fn render_table(
    forecasts: &ForecastMap,
    delimiter: u8,
    include_uncertainty: bool,
) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    if include_uncertainty {
        writer.write_record(BASE_HEADER.iter().chain(&UNCERTAINTY_HEADER))?;
    } else {
        writer.write_record(BASE_HEADER)?;
    }

    for (key, result) in forecasts {
        let mut row = vec![
            key.city.to_string(),
            key.variable.name(),
            format_forecast(&result.forecast),
        ];
        if include_uncertainty {
            row.extend(uncertainty_fields(result));
        }
        writer.write_record(&row)?;
    }

    let bytes = writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ForecastMethod;
    use crate::series::{CityName, SeriesKey, VariableKind};

    fn forecasts() -> ForecastMap {
        let mut map = ForecastMap::new();
        map.insert(
            SeriesKey::new(CityName::new("hanoi").unwrap(), VariableKind::Temperature),
            ForecastResult {
                method: ForecastMethod::Linear,
                forecast: vec![32.0, 33.04],
                error: 0.25,
                confidence_interval: vec![(31.5, 32.5), (32.54, 33.54)],
            },
        );
        map
    }

    #[test]
    fn test_format_forecast() {
        assert_eq!(format_forecast(&[32.0, 33.04, -1.26]), "32.0,33.0,-1.3");
        assert_eq!(format_forecast(&[]), "");
    }

    #[test]
    fn test_csv_quotes_joined_forecast() {
        let out = render_table(&forecasts(), b',', false).unwrap();
        assert_eq!(out, "City,Data Type,Forecast\nhanoi,temperature,\"32.0,33.0\"\n");
    }

    #[test]
    fn test_tsv_with_uncertainty() {
        let out = render_table(&forecasts(), b'\t', true).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "City\tData Type\tForecast\tError\tCI Low\tCI High");
        assert_eq!(lines[1], "hanoi\ttemperature\t32.0,33.0\t0.250\t31.5,32.5\t32.5,33.5");
    }
}
