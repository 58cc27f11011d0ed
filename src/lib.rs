//! Per-city climate forecasting and disaster-risk classification.
//!
//! This crate loads monthly climate series per city, derives additional
//! features, fits trend forecasts with an error estimate, and classifies
//! each city's aggregate climate into a disaster-risk category with an
//! associated recommendation.

pub mod classify;
pub mod config;
pub mod export;
pub mod features;
pub mod logging;
pub mod pipeline;
pub mod recommend;
pub mod series;
pub mod store;

pub use classify::{
    train, AggregateFeatureVector, ClassifierConfig, ClassifierError, DisasterLabel, DisasterModel,
    TrainingSet,
};
pub use config::{AppConfig, ConfigError};
pub use export::{export_forecasts, render_forecasts, ExportError, ExportFormat, ExportOptions};
pub use features::{FeatureConfig, FeatureEngine, FeatureError, ForecastMethod, ForecastResult};
pub use pipeline::{assess_all, assess_city, CityAssessment, Pipeline, StageConfig};
pub use recommend::{recommendation, recommendation_for_name, DEFAULT_RECOMMENDATION};
pub use series::{CityName, ClimateSeries, ClimateTable, SeriesKey, VariableKind};
pub use store::{DataStore, StoreConfig, StoreError};
