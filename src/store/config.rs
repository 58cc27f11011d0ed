//! Source configuration for the data store.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::series::VariableKind;

/// One tabular source: a delimited file holding one variable for many cities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Variable every row in this file contributes.
    pub variable: VariableKind,
    /// File name, relative to `StoreConfig::data_dir` unless absolute.
    pub file: PathBuf,
}

impl SourceSpec {
    pub fn new(variable: VariableKind, file: impl Into<PathBuf>) -> Self {
        Self {
            variable,
            file: file.into(),
        }
    }
}

/// Where and how the data store reads its sources.
///
/// Every listed source is required; a missing one fails the whole load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory containing the source files.
    pub data_dir: PathBuf,
    /// Whether each file starts with a header row.
    pub has_headers: bool,
    /// Field delimiter.
    pub delimiter: char,
    pub sources: Vec<SourceSpec>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            has_headers: true,
            delimiter: ',',
            sources: vec![
                SourceSpec::new(VariableKind::Temperature, "temperature.csv"),
                SourceSpec::new(VariableKind::Rainfall, "rainfall.csv"),
                SourceSpec::new(VariableKind::Sunshine, "sunshine.csv"),
            ],
        }
    }
}

impl StoreConfig {
    /// Default sources under `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Resolved path of a source file.
    pub fn source_path(&self, source: &SourceSpec) -> PathBuf {
        if source.file.is_absolute() {
            source.file.clone()
        } else {
            self.data_dir.join(&source.file)
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
