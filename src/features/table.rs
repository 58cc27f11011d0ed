//! Conversion between the engine table and a plain nested mapping.

use std::collections::BTreeMap;

use tracing::warn;

use crate::series::{CityName, ClimateSeries, ClimateTable, VariableKind};

/// city → variable → monthly values, with `None` for missing months.
pub type NestedMap = BTreeMap<String, BTreeMap<String, Vec<Option<f64>>>>;

/// Flattens a table into a nested map keyed by canonical names.
pub fn table_to_nested(table: &ClimateTable) -> NestedMap {
    table
        .iter()
        .map(|(city, vars)| {
            let inner = vars
                .iter()
                .map(|(variable, series)| (variable.name(), series.values().to_vec()))
                .collect();
            (city.as_str().to_string(), inner)
        })
        .collect()
}

/// Builds a table from a nested map, normalizing city and variable keys.
///
/// Keys that collide after normalization keep the last entry in map order.
/// Blank city names are dropped.
pub fn nested_to_table(map: &NestedMap) -> ClimateTable {
    let mut table = ClimateTable::new();
    for (raw_city, vars) in map {
        let Some(city) = CityName::new(raw_city) else {
            warn!(city = %raw_city, "skipping blank city key");
            continue;
        };
        let entry = table.entry(city).or_default();
        for (raw_variable, values) in vars {
            entry.insert(
                VariableKind::parse(raw_variable),
                ClimateSeries::new(values.clone()),
            );
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_map() -> NestedMap {
        let mut vars = BTreeMap::new();
        vars.insert("temperature".to_string(), (20..32).map(|v| Some(v as f64)).collect());
        vars.insert("rainfall".to_string(), vec![Some(100.0), None, Some(90.0)]);
        vars.insert("temperature_forecast".to_string(), vec![Some(32.0)]);
        let mut map = NestedMap::new();
        map.insert("hanoi".to_string(), vars);
        map
    }

    #[test]
    fn test_round_trip_preserves_content() {
        let map = sample_map();
        assert_eq!(table_to_nested(&nested_to_table(&map)), map);
    }

    #[test]
    fn test_keys_are_normalized_on_ingestion() {
        let mut vars = BTreeMap::new();
        vars.insert(" Temperature ".to_string(), vec![Some(1.0)]);
        let mut map = NestedMap::new();
        map.insert("  HaNoi".to_string(), vars);

        let table = nested_to_table(&map);
        let hanoi = &table[&CityName::new("hanoi").unwrap()];
        assert!(hanoi.contains_key(&VariableKind::Temperature));

        let out = table_to_nested(&table);
        assert!(out["hanoi"].contains_key("temperature"));
    }

    #[test]
    fn test_missing_values_flag_cleanup() {
        let table = nested_to_table(&sample_map());
        let hanoi = &table[&CityName::new("hanoi").unwrap()];
        assert!(hanoi[&VariableKind::Rainfall].needs_cleanup());
        assert!(!hanoi[&VariableKind::Temperature].needs_cleanup());
    }

    fn value_strategy() -> impl Strategy<Value = Option<f64>> {
        prop_oneof![Just(None), (-1.0e6..1.0e6f64).prop_map(Some)]
    }

    fn nested_strategy() -> impl Strategy<Value = NestedMap> {
        let vars = prop::collection::btree_map(
            "[a-z][a-z_]{0,14}",
            prop::collection::vec(value_strategy(), 0..16),
            0..5,
        );
        prop::collection::btree_map("[a-z]([a-z ]{0,10}[a-z])?", vars, 0..5)
    }

    proptest! {
        #[test]
        fn prop_round_trip_is_identity_for_normalized_maps(map in nested_strategy()) {
            prop_assert_eq!(table_to_nested(&nested_to_table(&map)), map);
        }
    }
}
