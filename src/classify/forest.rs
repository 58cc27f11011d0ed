//! Bagged ensemble training and the deployable model.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::aggregate::AggregateFeatureVector;
use super::config::{ClassifierConfig, FEATURE_COUNT};
use super::training::TrainingSet;
use super::tree::{majority_label, DecisionTree, TreeParams};
use super::{ClassifierError, DisasterLabel};

/// Trains a bagged ensemble of decision trees.
///
/// Each tree is grown on a bootstrap sample drawn from a ChaCha8 stream
/// seeded with `seed + i * 31`, so the result depends only on the seed and
/// the training data.
///
/// # Arguments
/// * `set` - Labelled training samples
/// * `config` - Ensemble parameters and seed
pub fn train(set: &TrainingSet, config: &ClassifierConfig) -> Result<DisasterModel, ClassifierError> {
    config.validate()?;
    if set.is_empty() {
        return Err(ClassifierError::EmptyTrainingSet);
    }

    let params = TreeParams {
        max_depth: config.max_depth,
        min_samples_split: config.min_samples_split,
        max_features: config.max_features,
    };
    let samples = set.samples();
    let n = samples.len();

    let trees: Vec<DecisionTree> = (0..config.n_trees)
        .into_par_iter()
        .map(|i| {
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(i as u64 * 31));
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
            DecisionTree::fit(samples, bootstrap, params, &mut rng)
        })
        .collect();

    info!(
        trees = trees.len(),
        samples = n,
        seed = config.seed,
        "classifier trained"
    );

    Ok(DisasterModel {
        config: config.clone(),
        trees,
    })
}

/// A trained ensemble, ready to predict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisasterModel {
    config: ClassifierConfig,
    trees: Vec<DecisionTree>,
}

impl DisasterModel {
    /// Predicts the label for a city's aggregate vector.
    pub fn predict(&self, vector: &AggregateFeatureVector) -> DisasterLabel {
        self.predict_vector(vector.as_array())
    }

    /// Majority vote over all trees. Ties go to the earliest label.
    pub fn predict_vector(&self, x: [f64; FEATURE_COUNT]) -> DisasterLabel {
        majority_label(&self.votes(x))
    }

    /// Per-label vote counts, in enumeration order.
    pub fn votes(&self, x: [f64; FEATURE_COUNT]) -> [usize; 4] {
        let mut votes = [0; 4];
        for tree in &self.trees {
            votes[tree.predict(&x).index()] += 1;
        }
        votes
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    // Persistence

    pub fn to_json(&self) -> Result<String, ClassifierError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ClassifierError> {
        let model: Self = serde_json::from_str(json)?;
        model.check_loaded()
    }

    /// Writes the model as JSON, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), ClassifierError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        info!(path = %path.display(), trees = self.trees.len(), "model saved");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        let reader = BufReader::new(File::open(path)?);
        let model: Self = serde_json::from_reader(reader)?;
        let model = model.check_loaded()?;
        info!(path = %path.display(), trees = model.trees.len(), "model loaded");
        Ok(model)
    }

    fn check_loaded(self) -> Result<Self, ClassifierError> {
        if self.trees.is_empty() {
            return Err(ClassifierError::EmptyModel);
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.check()
                .map_err(|reason| ClassifierError::InvalidModel(format!("tree {}: {}", i, reason)))?;
        }
        Ok(self)
    }
}
