//! Feature engine: preprocessing, derived series and per-city forecasts.
//!
//! The engine owns a working copy of the loaded table. Derived and forecast
//! series are added to that table next to the raw ones; forecast results
//! (values, error, interval) are kept separately, keyed by [`SeriesKey`].

mod config;
mod derive;
mod forecast;
mod preprocess;
mod table;

use std::collections::BTreeMap;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::series::{
    self, CityName, ClimateSeries, ClimateTable, SeriesKey, VariableKind, MONTHS,
};

pub use config::FeatureConfig;
pub use derive::DerivedFeature;
pub use forecast::{fit_polynomial, forecast_series, FitError, ForecastMethod, ForecastResult, TrendFit};
pub use preprocess::{clean_series, PreprocessReport};
pub use table::{nested_to_table, table_to_nested, NestedMap};

/// Longest accepted forecast horizon, in months.
pub const MAX_HORIZON: usize = 120;

/// Forecast results for the session.
pub type ForecastMap = BTreeMap<SeriesKey, ForecastResult>;

/// Errors that reject a whole feature call before any city is processed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("unknown forecast method '{0}' (expected 'linear' or 'polynomial')")]
    UnknownMethod(String),
    #[error("forecast horizon must be between 1 and {max}")]
    InvalidHorizon { max: usize },
    #[error("confidence multiplier must be finite and non-negative, got {0}")]
    InvalidMultiplier(f64),
    #[error("polynomial degree {degree} is not in 1..{max}")]
    InvalidDegree { degree: usize, max: usize },
    #[error("cannot forecast '{0}': it is already a forecast series")]
    ForecastOfForecast(VariableKind),
}

/// Working table plus forecast results for one session.
#[derive(Debug, Clone)]
pub struct FeatureEngine {
    table: ClimateTable,
    forecasts: ForecastMap,
    config: FeatureConfig,
}

impl FeatureEngine {
    /// Starts from a copy of `table`; the caller's table is left untouched.
    pub fn new(table: &ClimateTable, config: FeatureConfig) -> Self {
        Self {
            table: table.clone(),
            forecasts: ForecastMap::new(),
            config,
        }
    }

    /// Builds an engine from a nested mapping (keys are normalized).
    pub fn from_dict(map: &NestedMap, config: FeatureConfig) -> Self {
        Self {
            table: nested_to_table(map),
            forecasts: ForecastMap::new(),
            config,
        }
    }

    /// The working table as a nested mapping, derived and forecast series included.
    pub fn to_dict(&self) -> NestedMap {
        table_to_nested(&self.table)
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn table(&self) -> &ClimateTable {
        &self.table
    }

    pub fn cities(&self) -> impl Iterator<Item = &CityName> {
        self.table.keys()
    }

    pub fn series(&self, key: &SeriesKey) -> Option<&ClimateSeries> {
        series::lookup(&self.table, key)
    }

    pub fn forecasts(&self) -> &ForecastMap {
        &self.forecasts
    }

    pub fn forecast(&self, key: &SeriesKey) -> Option<&ForecastResult> {
        self.forecasts.get(key)
    }

    /// Computes every [`DerivedFeature`] for each city whose inputs are
    /// complete. Returns the number of series added.
    pub fn add_feature_auto(&mut self) -> usize {
        let mut added = 0;

        for feature in DerivedFeature::ALL {
            for (city, vars) in self.table.iter_mut() {
                let inputs: Option<Vec<[f64; MONTHS]>> = feature
                    .inputs()
                    .iter()
                    .map(|input| vars.get(input).and_then(ClimateSeries::complete_values))
                    .collect();

                let Some(inputs) = inputs else {
                    debug!(city = %city, feature = %feature.variable(), "inputs incomplete, skipping");
                    continue;
                };

                match feature.compute(&inputs) {
                    Some(values) => {
                        vars.insert(feature.variable(), ClimateSeries::from_values(values));
                        added += 1;
                    }
                    None => {
                        debug!(city = %city, feature = %feature.variable(), "formula undefined, skipping");
                    }
                }
            }
        }

        info!(added, "derived features computed");
        added
    }

    /// Fits `method` to every complete 12-month `variable` series and
    /// forecasts `horizon` months ahead. Returns the number of cities
    /// forecast; cities with incomplete series are skipped.
    pub fn add_forecast_feature(
        &mut self,
        variable: &VariableKind,
        horizon: usize,
        method: ForecastMethod,
    ) -> Result<usize, FeatureError> {
        if horizon == 0 || horizon > MAX_HORIZON || MONTHS.checked_add(horizon).is_none() {
            return Err(FeatureError::InvalidHorizon { max: MAX_HORIZON });
        }
        let ci_multiplier = self.config.ci_multiplier;
        if !ci_multiplier.is_finite() || ci_multiplier < 0.0 {
            return Err(FeatureError::InvalidMultiplier(ci_multiplier));
        }
        if variable.is_forecast() {
            return Err(FeatureError::ForecastOfForecast(variable.clone()));
        }
        let degree = method.degree();
        if degree == 0 || degree >= MONTHS {
            return Err(FeatureError::InvalidDegree { degree, max: MONTHS });
        }

        let candidates: Vec<(CityName, [f64; MONTHS])> = self
            .table
            .iter()
            .filter_map(|(city, vars)| {
                let values = vars.get(variable).and_then(ClimateSeries::complete_values);
                if values.is_none() {
                    debug!(city = %city, variable = %variable, "series incomplete, not forecast");
                }
                values.map(|v| (city.clone(), v))
            })
            .collect();

        let fitted: Vec<(CityName, Result<ForecastResult, FitError>)> = candidates
            .into_par_iter()
            .map(|(city, values)| {
                let result = forecast_series(&values, horizon, method, ci_multiplier);
                (city, result)
            })
            .collect();

        let mut produced = 0;
        for (city, result) in fitted {
            let key = SeriesKey::new(city, variable.clone());
            match result {
                Ok(result) => {
                    if let Some(vars) = self.table.get_mut(&key.city) {
                        vars.insert(
                            variable.forecast(),
                            ClimateSeries::from_values(result.forecast.iter().copied()),
                        );
                    }
                    self.forecasts.insert(key, result);
                    produced += 1;
                }
                Err(e) => warn!(key = %key, error = %e, "forecast fit failed"),
            }
        }

        info!(
            variable = %variable,
            horizon,
            method = method.name(),
            cities = produced,
            "forecast computed"
        );
        Ok(produced)
    }

    /// Cleans every series flagged as needing it. Values that cannot be
    /// filled stay explicitly missing.
    pub fn preprocess_data(&mut self) -> PreprocessReport {
        let max_gap = self.config.max_gap;
        let mut report = PreprocessReport::default();

        for vars in self.table.values_mut() {
            for (variable, series) in vars.iter_mut() {
                if !series.needs_cleanup() {
                    continue;
                }
                let (imputed, missing) = clean_series(series, variable, max_gap);
                report.series_cleaned += 1;
                report.values_imputed += imputed;
                report.values_still_missing += missing;
            }
        }

        info!(
            cleaned = report.series_cleaned,
            imputed = report.values_imputed,
            still_missing = report.values_still_missing,
            "preprocessing done"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(name: &str) -> CityName {
        CityName::new(name).unwrap()
    }

    fn table_with(entries: &[(&str, VariableKind, Vec<Option<f64>>)]) -> ClimateTable {
        let mut table = ClimateTable::new();
        for (name, variable, values) in entries {
            table
                .entry(city(name))
                .or_default()
                .insert(variable.clone(), ClimateSeries::new(values.clone()));
        }
        table
    }

    fn full(f: impl Fn(usize) -> f64) -> Vec<Option<f64>> {
        (0..MONTHS).map(|i| Some(f(i))).collect()
    }

    #[test]
    fn test_linear_forecast_on_arithmetic_series() {
        let table = table_with(&[("hanoi", VariableKind::Temperature, full(|i| i as f64 + 1.0))]);
        let mut engine = FeatureEngine::new(&table, FeatureConfig::default());

        let n = engine
            .add_forecast_feature(&VariableKind::Temperature, 1, ForecastMethod::Linear)
            .unwrap();
        assert_eq!(n, 1);

        let key = SeriesKey::new(city("hanoi"), VariableKind::Temperature);
        let result = engine.forecast(&key).unwrap();
        assert!((result.forecast[0] - 13.0).abs() < 1e-9);
        assert!(result.error < 1e-9);

        let forecast_key = SeriesKey::new(city("hanoi"), VariableKind::Temperature.forecast());
        assert_eq!(engine.series(&forecast_key).unwrap().len(), 1);
    }

    #[test]
    fn test_incomplete_series_is_absent_from_forecasts() {
        let mut eleven: Vec<Option<f64>> = full(|i| i as f64);
        eleven.pop();
        let table = table_with(&[
            ("hanoi", VariableKind::Temperature, full(|i| i as f64)),
            ("hue", VariableKind::Temperature, eleven),
        ]);
        let mut engine = FeatureEngine::new(&table, FeatureConfig::default());

        let n = engine
            .add_forecast_feature(&VariableKind::Temperature, 2, ForecastMethod::Linear)
            .unwrap();
        assert_eq!(n, 1);
        assert!(engine
            .forecast(&SeriesKey::new(city("hue"), VariableKind::Temperature))
            .is_none());
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let table = table_with(&[("hanoi", VariableKind::Temperature, full(|i| i as f64))]);
        let mut engine = FeatureEngine::new(&table, FeatureConfig::default());

        assert_eq!(
            engine.add_forecast_feature(&VariableKind::Temperature, 0, ForecastMethod::Linear),
            Err(FeatureError::InvalidHorizon { max: MAX_HORIZON })
        );
        assert_eq!(
            engine.add_forecast_feature(&VariableKind::Temperature, usize::MAX, ForecastMethod::Linear),
            Err(FeatureError::InvalidHorizon { max: MAX_HORIZON })
        );
        assert!(engine
            .add_forecast_feature(&VariableKind::Temperature, MAX_HORIZON + 1, ForecastMethod::Linear)
            .is_err());
        assert!(matches!(
            engine.add_forecast_feature(
                &VariableKind::Temperature,
                1,
                ForecastMethod::Polynomial { degree: 12 }
            ),
            Err(FeatureError::InvalidDegree { degree: 12, .. })
        ));
        assert!(matches!(
            engine.add_forecast_feature(
                &VariableKind::Temperature.forecast(),
                1,
                ForecastMethod::Linear
            ),
            Err(FeatureError::ForecastOfForecast(_))
        ));
        assert!(engine.forecasts().is_empty());
    }

    #[test]
    fn test_bad_multiplier_is_rejected_before_fitting() {
        let table = table_with(&[("hanoi", VariableKind::Temperature, full(|i| (i % 3) as f64))]);
        for k in [-2.0, f64::NAN, f64::INFINITY] {
            let config = FeatureConfig {
                ci_multiplier: k,
                ..Default::default()
            };
            let mut engine = FeatureEngine::new(&table, config);
            let err = engine
                .add_forecast_feature(&VariableKind::Temperature, 1, ForecastMethod::Linear)
                .unwrap_err();
            assert!(matches!(err, FeatureError::InvalidMultiplier(_)));
            assert!(engine.forecasts().is_empty());
        }
    }

    #[test]
    fn test_interval_low_never_exceeds_high() {
        let table = table_with(&[("hanoi", VariableKind::Temperature, full(|i| (i % 3) as f64))]);
        let config = FeatureConfig {
            ci_multiplier: 0.0,
            ..Default::default()
        };
        let mut engine = FeatureEngine::new(&table, config);
        engine
            .add_forecast_feature(&VariableKind::Temperature, MAX_HORIZON, ForecastMethod::Linear)
            .unwrap();
        let result = engine
            .forecast(&SeriesKey::new(city("hanoi"), VariableKind::Temperature))
            .unwrap();
        assert_eq!(result.horizon(), MAX_HORIZON);
        assert!(result.confidence_interval.iter().all(|(lo, hi)| lo <= hi));
    }

    #[test]
    fn test_derived_features_only_for_complete_inputs() {
        let mut gap = full(|_| 5.0);
        gap[2] = None;
        let table = table_with(&[
            ("hanoi", VariableKind::Rainfall, full(|_| 100.0)),
            ("hanoi", VariableKind::Sunshine, full(|_| 4.0)),
            ("hanoi", VariableKind::Temperature, full(|_| 20.0)),
            ("hue", VariableKind::Rainfall, full(|_| 100.0)),
            ("hue", VariableKind::Sunshine, gap),
        ]);
        let mut engine = FeatureEngine::new(&table, FeatureConfig::default());

        assert_eq!(engine.add_feature_auto(), 2);

        let humidity = engine
            .series(&SeriesKey::new(city("hanoi"), VariableKind::HumidityIndex))
            .unwrap();
        assert_eq!(humidity.values()[0], Some(20.0));
        assert!(engine
            .series(&SeriesKey::new(city("hanoi"), VariableKind::AridityIndex))
            .is_some());
        assert!(engine
            .series(&SeriesKey::new(city("hue"), VariableKind::HumidityIndex))
            .is_none());
    }

    #[test]
    fn test_preprocess_then_forecast_recovers_city() {
        let mut values = full(|i| i as f64);
        values[6] = None;
        let table = table_with(&[("hanoi", VariableKind::Temperature, values)]);
        let mut engine = FeatureEngine::new(&table, FeatureConfig::default());

        let report = engine.preprocess_data();
        assert_eq!(report.series_cleaned, 1);
        assert_eq!(report.values_imputed, 1);
        assert_eq!(report.values_still_missing, 0);

        let n = engine
            .add_forecast_feature(&VariableKind::Temperature, 1, ForecastMethod::Linear)
            .unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn test_engine_does_not_mutate_source_table() {
        let table = table_with(&[("hanoi", VariableKind::Temperature, full(|i| i as f64))]);
        let mut engine = FeatureEngine::new(&table, FeatureConfig::default());
        engine
            .add_forecast_feature(&VariableKind::Temperature, 1, ForecastMethod::Linear)
            .unwrap();
        assert_eq!(table[&city("hanoi")].len(), 1);
        assert_eq!(engine.table()[&city("hanoi")].len(), 2);
    }

    #[test]
    fn test_to_dict_includes_forecast_series() {
        let table = table_with(&[("hanoi", VariableKind::Temperature, full(|i| 20.0 + i as f64))]);
        let mut engine = FeatureEngine::new(&table, FeatureConfig::default());
        engine
            .add_forecast_feature(&VariableKind::Temperature, 1, ForecastMethod::Linear)
            .unwrap();

        let dict = engine.to_dict();
        let forecast = &dict["hanoi"]["temperature_forecast"];
        assert_eq!(forecast.len(), 1);
        assert!((forecast[0].unwrap() - 32.0).abs() < 1e-9);

        let rebuilt = FeatureEngine::from_dict(&dict, FeatureConfig::default());
        assert_eq!(rebuilt.to_dict(), dict);
    }
}
