//! Configuration for classifier training.

use serde::{Deserialize, Serialize};

use super::ClassifierError;

/// Number of input dimensions: mean temperature, rainfall and sunshine.
pub const FEATURE_COUNT: usize = 3;

/// Parameters for the bagged decision-tree ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Maximum depth of each tree.
    pub max_depth: usize,
    /// Nodes with fewer samples than this become leaves.
    pub min_samples_split: usize,
    /// Features considered at each split (1-3).
    pub max_features: usize,

    /// Random seed. Tree `i` uses `seed + i * 31`.
    pub seed: u64,
    /// Size of the synthetic training set used when no file is given.
    pub training_samples: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: 8,
            min_samples_split: 2,
            max_features: 2,
            seed: 42,
            training_samples: 600,
        }
    }
}

impl ClassifierConfig {
    /// Default parameters with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Checks parameter ranges.
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.n_trees == 0 {
            return Err(ClassifierError::InvalidConfig("n_trees must be at least 1".into()));
        }
        if self.max_depth == 0 {
            return Err(ClassifierError::InvalidConfig("max_depth must be at least 1".into()));
        }
        if self.min_samples_split < 2 {
            return Err(ClassifierError::InvalidConfig(
                "min_samples_split must be at least 2".into(),
            ));
        }
        if !(1..=FEATURE_COUNT).contains(&self.max_features) {
            return Err(ClassifierError::InvalidConfig(format!(
                "max_features must be between 1 and {}",
                FEATURE_COUNT
            )));
        }
        Ok(())
    }
}
