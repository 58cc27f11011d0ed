//! Feature engineering configuration.

use serde::{Deserialize, Serialize};

use crate::series::VariableKind;

use super::forecast::ForecastMethod;
use super::FeatureError;

/// Parameters for preprocessing and forecasting.
///
/// `ci_multiplier` scales the in-sample error into the half-width of each
/// forecast interval. It is a plain multiplier and implies no coverage level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Interval half-width = in-sample error × this.
    pub ci_multiplier: f64,
    /// Longest interior run of missing months filled by interpolation.
    pub max_gap: usize,

    // Forecast stage defaults
    /// Number of future months to forecast.
    pub horizon: usize,
    /// "linear" or "polynomial".
    pub method: String,
    /// Polynomial degree (ignored for linear).
    pub degree: usize,
    /// Variables to forecast.
    pub forecast_variables: Vec<VariableKind>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            ci_multiplier: 2.0,
            max_gap: 1,

            horizon: 3,
            method: "linear".to_string(),
            degree: 2,
            forecast_variables: VariableKind::TRACKED.to_vec(),
        }
    }
}

impl FeatureConfig {
    /// The configured forecast method.
    pub fn forecast_method(&self) -> Result<ForecastMethod, FeatureError> {
        ForecastMethod::parse(&self.method, self.degree)
    }
}
