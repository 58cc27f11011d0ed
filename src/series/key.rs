//! City names, variable kinds and the composite series key.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Suffix appended to a variable name for its forecast series.
const FORECAST_SUFFIX: &str = "_forecast";

/// Normalizes a raw key: trimmed and lower-cased.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalized city identifier (trimmed, lower-cased, never empty).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityName(String);

impl CityName {
    /// Normalizes `raw`. Returns `None` if nothing is left after trimming.
    pub fn new(raw: &str) -> Option<Self> {
        let name = normalize_key(raw);
        if name.is_empty() {
            None
        } else {
            Some(Self(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of climate variable a series holds.
///
/// Every kind has a canonical lower-case name, and parsing a canonical name
/// gives back a kind with the same name. Names that are not recognized are
/// kept as [`VariableKind::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VariableKind {
    /// Mean monthly temperature (°C).
    Temperature,
    /// Monthly rainfall (mm).
    Rainfall,
    /// Mean daily sunshine hours for the month.
    Sunshine,
    /// Derived: rainfall / (sunshine + 1).
    HumidityIndex,
    /// Derived: monthly De Martonne aridity index, 12·P / (T + 10).
    AridityIndex,
    /// Forecast values produced for the wrapped variable.
    Forecast(Box<VariableKind>),
    /// Any other normalized variable name.
    Custom(String),
}

impl VariableKind {
    /// The three variables read from sources and fed to the classifier.
    pub const TRACKED: [VariableKind; 3] = [
        VariableKind::Temperature,
        VariableKind::Rainfall,
        VariableKind::Sunshine,
    ];

    /// Parses a variable name after normalizing it.
    pub fn parse(raw: &str) -> Self {
        let name = normalize_key(raw);
        match name.as_str() {
            "temperature" => VariableKind::Temperature,
            "rainfall" => VariableKind::Rainfall,
            "sunshine" => VariableKind::Sunshine,
            "humidity_index" => VariableKind::HumidityIndex,
            "aridity_index" => VariableKind::AridityIndex,
            other => match other.strip_suffix(FORECAST_SUFFIX) {
                // A base ending in whitespace would not survive re-normalization.
                Some(base) if !base.is_empty() && !base.ends_with(char::is_whitespace) => {
                    VariableKind::Forecast(Box::new(VariableKind::parse(base)))
                }
                _ => VariableKind::Custom(name),
            },
        }
    }

    /// Canonical name used as the nested-map key and in exports.
    pub fn name(&self) -> String {
        match self {
            VariableKind::Temperature => "temperature".to_string(),
            VariableKind::Rainfall => "rainfall".to_string(),
            VariableKind::Sunshine => "sunshine".to_string(),
            VariableKind::HumidityIndex => "humidity_index".to_string(),
            VariableKind::AridityIndex => "aridity_index".to_string(),
            VariableKind::Forecast(base) => format!("{}{}", base.name(), FORECAST_SUFFIX),
            VariableKind::Custom(name) => name.clone(),
        }
    }

    /// The forecast kind for this variable.
    pub fn forecast(&self) -> Self {
        VariableKind::Forecast(Box::new(self.clone()))
    }

    pub fn is_forecast(&self) -> bool {
        matches!(self, VariableKind::Forecast(_))
    }

    pub fn is_derived(&self) -> bool {
        matches!(self, VariableKind::HumidityIndex | VariableKind::AridityIndex)
    }

    /// Whether negative values are physically invalid for this variable.
    pub fn is_non_negative(&self) -> bool {
        matches!(
            self,
            VariableKind::Rainfall
                | VariableKind::Sunshine
                | VariableKind::HumidityIndex
                | VariableKind::AridityIndex
        )
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl From<String> for VariableKind {
    fn from(value: String) -> Self {
        VariableKind::parse(&value)
    }
}

impl From<VariableKind> for String {
    fn from(value: VariableKind) -> Self {
        value.name()
    }
}

/// Composite `(city, variable)` key with ordering by city, then variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    pub city: CityName,
    pub variable: VariableKind,
}

impl SeriesKey {
    pub fn new(city: CityName, variable: VariableKind) -> Self {
        Self { city, variable }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.city, self.variable)
    }
}
