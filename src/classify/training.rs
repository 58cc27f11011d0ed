//! Labelled training data.

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::config::FEATURE_COUNT;
use super::{ClassifierError, DisasterLabel};

/// One labelled observation: `[temperature, rainfall, sunshine]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub features: [f64; FEATURE_COUNT],
    pub label: DisasterLabel,
}

/// Row layout of a training CSV file.
#[derive(Debug, Deserialize)]
struct TrainingRow {
    temperature: f64,
    rainfall: f64,
    sunshine: f64,
    label: String,
}

/// Labelled samples the ensemble is trained on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    samples: Vec<TrainingSample>,
}

impl TrainingSet {
    pub fn new(samples: Vec<TrainingSample>) -> Self {
        Self { samples }
    }

    /// Generates `n` reproducible placeholder samples labelled by fixed
    /// climate rules:
    /// - mean rainfall above 250 mm: flood
    /// - above 30 °C with under 50 mm rainfall: drought
    /// - above 150 mm rainfall with under 4 h sunshine: storm
    /// - anything else: no disaster
    pub fn synthetic(seed: u64, n: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let samples = (0..n)
            .map(|_| {
                let temperature = -5.0 + rng.random::<f64>() * 45.0;
                let rainfall = rng.random::<f64>() * 400.0;
                let sunshine = rng.random::<f64>() * 12.0;
                let features = [temperature, rainfall, sunshine];
                TrainingSample {
                    features,
                    label: rule_label(features),
                }
            })
            .collect();

        Self { samples }
    }

    /// Reads `temperature,rainfall,sunshine,label` rows (with a header).
    pub fn from_csv_path(path: &Path) -> Result<Self, ClassifierError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;

        let mut samples = Vec::new();
        for (i, row) in reader.deserialize::<TrainingRow>().enumerate() {
            let row = row?;
            // Header is line 1.
            let line = i as u64 + 2;
            for (field, value) in [
                ("temperature", row.temperature),
                ("rainfall", row.rainfall),
                ("sunshine", row.sunshine),
            ] {
                if !value.is_finite() {
                    return Err(ClassifierError::NonFiniteValue { line, field });
                }
            }
            let label = DisasterLabel::parse(&row.label)
                .ok_or_else(|| ClassifierError::UnknownLabel { line, label: row.label.clone() })?;
            samples.push(TrainingSample {
                features: [row.temperature, row.rainfall, row.sunshine],
                label,
            });
        }

        info!(path = %path.display(), samples = samples.len(), "training set loaded");
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[TrainingSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples per label, in enumeration order.
    pub fn label_counts(&self) -> [usize; 4] {
        let mut counts = [0; 4];
        for s in &self.samples {
            counts[s.label.index()] += 1;
        }
        counts
    }
}

fn rule_label([temperature, rainfall, sunshine]: [f64; FEATURE_COUNT]) -> DisasterLabel {
    if rainfall > 250.0 {
        DisasterLabel::Flood
    } else if temperature > 30.0 && rainfall < 50.0 {
        DisasterLabel::Drought
    } else if rainfall > 150.0 && sunshine < 4.0 {
        DisasterLabel::Storm
    } else {
        DisasterLabel::NoDisaster
    }
}
