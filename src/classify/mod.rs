//! Disaster-risk classification.
//!
//! Training and deployment are separate: [`train`] turns a [`TrainingSet`]
//! and a seed into a [`DisasterModel`], which can be saved, loaded and
//! queried with [`DisasterModel::predict`].

mod aggregate;
mod config;
mod forest;
mod label;
mod training;
mod tree;

use thiserror::Error;

pub use aggregate::AggregateFeatureVector;
pub use config::{ClassifierConfig, FEATURE_COUNT};
pub use forest::{train, DisasterModel};
pub use label::DisasterLabel;
pub use training::{TrainingSample, TrainingSet};
pub use tree::{DecisionTree, TreeNode};

/// Errors raised while training, saving or loading a classifier.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("training set is empty")]
    EmptyTrainingSet,
    #[error("invalid classifier config: {0}")]
    InvalidConfig(String),
    #[error("model has no trees")]
    EmptyModel,
    #[error("invalid model: {0}")]
    InvalidModel(String),
    #[error("non-finite {field} on line {line}")]
    NonFiniteValue { line: u64, field: &'static str },
    #[error("unknown label '{label}' on line {line}")]
    UnknownLabel { line: u64, label: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
