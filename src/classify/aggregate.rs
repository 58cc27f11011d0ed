//! Per-city aggregate feature vector fed to the classifier.

use serde::{Deserialize, Serialize};

use crate::series::{CityName, ClimateTable, VariableKind};

use super::config::FEATURE_COUNT;

/// Mean temperature, rainfall and sunshine over the 12 months of a city.
///
/// Only built from complete series, so every component is finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateFeatureVector {
    pub temperature: f64,
    pub rainfall: f64,
    pub sunshine: f64,
}

impl AggregateFeatureVector {
    /// Computes the vector for `city`. Returns `None` if any of the three
    /// series is missing or incomplete; no dimension is ever defaulted.
    pub fn for_city(table: &ClimateTable, city: &CityName) -> Option<Self> {
        let vars = table.get(city)?;
        let mean = |variable: &VariableKind| vars.get(variable).and_then(|s| s.mean());

        Some(Self {
            temperature: mean(&VariableKind::Temperature)?,
            rainfall: mean(&VariableKind::Rainfall)?,
            sunshine: mean(&VariableKind::Sunshine)?,
        })
    }

    pub fn as_array(&self) -> [f64; FEATURE_COUNT] {
        [self.temperature, self.rainfall, self.sunshine]
    }

    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            temperature: values[0],
            rainfall: values[1],
            sunshine: values[2],
        }
    }
}
