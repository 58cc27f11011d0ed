//! Monthly climate series and the keys that identify them.
//!
//! A loaded session is a two-level table: city → variable → series. The
//! composite [`SeriesKey`] is used wherever a single `(city, variable)` lookup
//! is needed, e.g. for forecast results.

mod key;
mod monthly;

use std::collections::BTreeMap;

pub use key::{normalize_key, CityName, SeriesKey, VariableKind};
pub use monthly::{ClimateSeries, MONTHS};

/// Per-city variables for one session, ordered by city then variable.
pub type ClimateTable = BTreeMap<CityName, BTreeMap<VariableKind, ClimateSeries>>;

/// Looks up a single series by composite key.
pub fn lookup<'a>(table: &'a ClimateTable, key: &SeriesKey) -> Option<&'a ClimateSeries> {
    table.get(&key.city).and_then(|vars| vars.get(&key.variable))
}

