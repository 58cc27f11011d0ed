//! Application configuration loaded from TOML.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::ClassifierConfig;
use crate::export::ExportOptions;
use crate::features::FeatureConfig;
use crate::store::StoreConfig;

/// Errors raised while reading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration. Every section and field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub features: FeatureConfig,
    pub classifier: ClassifierConfig,
    pub export: ExportOptions,
}

impl AppConfig {
    /// Reads and parses a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::VariableKind;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(AppConfig::from_toml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [store]
            data_dir = "climate"

            [features]
            ci_multiplier = 1.5
            method = "polynomial"
            forecast_variables = ["temperature", "humidity_index"]

            [classifier]
            seed = 7

            [export]
            include_uncertainty = true
            "#,
        )
        .unwrap();

        assert_eq!(config.store.data_dir, PathBuf::from("climate"));
        assert!(config.store.has_headers);
        assert_eq!(config.features.ci_multiplier, 1.5);
        assert_eq!(config.features.horizon, 3);
        assert_eq!(
            config.features.forecast_variables,
            vec![VariableKind::Temperature, VariableKind::HumidityIndex]
        );
        assert_eq!(config.classifier.seed, 7);
        assert_eq!(config.classifier.n_trees, 50);
        assert!(config.export.include_uncertainty);
    }

    #[test]
    fn test_example_file_matches_defaults() {
        let config = AppConfig::from_toml(include_str!("../climcast.example.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_reports_errors() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            AppConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));

        let path = dir.path().join("bad.toml");
        fs::write(&path, "[features]\nhorizon = \"three\"\n").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Parse(_))));
    }
}
