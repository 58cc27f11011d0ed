//! Feature stage trait and pipeline orchestration.

use thiserror::Error;
use tracing::info;

use crate::features::{FeatureConfig, FeatureEngine};

/// Unique identifier for feature stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Invalid-value removal and gap interpolation.
    Preprocess,
    /// Derived series (humidity and aridity indices).
    DerivedFeatures,
    /// Per-city trend forecasts.
    Forecast,
}

impl StageId {
    /// Returns the name of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            StageId::Preprocess => "preprocess",
            StageId::DerivedFeatures => "derived_features",
            StageId::Forecast => "forecast",
        }
    }
}

/// Configuration passed to each feature stage.
#[derive(Debug, Clone, Default)]
pub struct StageConfig {
    /// Preprocessing and forecast parameters.
    pub features: FeatureConfig,
}

impl StageConfig {
    /// Creates a new configuration with the given feature settings.
    pub fn with_features(features: FeatureConfig) -> Self {
        Self { features }
    }
}

/// Errors that can occur during pipeline execution.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Stage '{0}' failed: {1}")]
    StageFailed(String, String),
    #[error("Missing dependency: stage '{0}' requires '{1}'")]
    MissingDependency(String, String),
}

/// Trait for implementing feature stages.
///
/// Each stage transforms the engine's working table, building upon
/// previous stages.
pub trait FeatureStage: Send + Sync {
    /// Returns the unique identifier for this stage.
    fn id(&self) -> StageId;

    /// Returns a human-readable name for the stage.
    fn name(&self) -> &str;

    /// Returns the stage IDs that must be executed before this stage.
    fn dependencies(&self) -> &[StageId] {
        &[]
    }

    /// Executes the stage, modifying the engine in place.
    ///
    /// # Arguments
    /// * `engine` - The feature engine holding the working table
    /// * `config` - Stage configuration parameters
    fn execute(&self, engine: &mut FeatureEngine, config: &StageConfig) -> Result<(), PipelineError>;
}

/// Orchestrates multiple feature stages into a complete pipeline.
pub struct Pipeline {
    stages: Vec<Box<dyn FeatureStage>>,
    config: StageConfig,
}

impl Pipeline {
    /// Creates a new empty pipeline with the given configuration.
    pub fn new(config: StageConfig) -> Self {
        Self {
            stages: Vec::new(),
            config,
        }
    }

    /// Preprocess, derived features, then forecasts.
    pub fn standard(config: StageConfig) -> Self {
        let mut pipeline = Self::new(config);
        pipeline
            .add_stage(PreprocessStage)
            .add_stage(DerivedFeatureStage)
            .add_stage(ForecastStage);
        pipeline
    }

    /// Adds a stage to the pipeline.
    pub fn add_stage<S: FeatureStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Returns the number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Executes all stages in order on the given engine.
    pub fn run(&self, engine: &mut FeatureEngine) -> Result<(), PipelineError> {
        self.run_with_callbacks(engine, |_, _, _| {}, |_, _, _| {})
    }

    /// Executes all stages with progress callbacks.
    ///
    /// # Arguments
    /// * `engine` - The feature engine to run on
    /// * `on_stage_start` - Called when each stage begins
    /// * `on_stage_complete` - Called when each stage finishes
    pub fn run_with_callbacks<F1, F2>(
        &self,
        engine: &mut FeatureEngine,
        mut on_stage_start: F1,
        mut on_stage_complete: F2,
    ) -> Result<(), PipelineError>
    where
        F1: FnMut(&str, usize, usize),
        F2: FnMut(&str, usize, usize),
    {
        let total = self.stages.len();
        let mut completed: Vec<StageId> = Vec::new();

        for (i, stage) in self.stages.iter().enumerate() {
            on_stage_start(stage.name(), i, total);

            // Check dependencies
            for dep in stage.dependencies() {
                if !completed.contains(dep) {
                    return Err(PipelineError::MissingDependency(
                        stage.name().to_string(),
                        dep.name().to_string(),
                    ));
                }
            }

            stage.execute(engine, &self.config)?;
            completed.push(stage.id());
            info!(stage = stage.id().name(), "stage complete");

            on_stage_complete(stage.name(), i, total);
        }

        Ok(())
    }
}

/// Cleans series flagged as needing it.
pub struct PreprocessStage;

impl FeatureStage for PreprocessStage {
    fn id(&self) -> StageId {
        StageId::Preprocess
    }

    fn name(&self) -> &str {
        "Preprocessing"
    }

    fn execute(&self, engine: &mut FeatureEngine, _config: &StageConfig) -> Result<(), PipelineError> {
        engine.preprocess_data();
        Ok(())
    }
}

/// Adds every derived feature for cities with complete inputs.
pub struct DerivedFeatureStage;

impl FeatureStage for DerivedFeatureStage {
    fn id(&self) -> StageId {
        StageId::DerivedFeatures
    }

    fn name(&self) -> &str {
        "Derived Features"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Preprocess]
    }

    fn execute(&self, engine: &mut FeatureEngine, _config: &StageConfig) -> Result<(), PipelineError> {
        engine.add_feature_auto();
        Ok(())
    }
}

/// Forecasts each configured variable with the configured method and horizon.
pub struct ForecastStage;

impl FeatureStage for ForecastStage {
    fn id(&self) -> StageId {
        StageId::Forecast
    }

    fn name(&self) -> &str {
        "Forecasting"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Preprocess]
    }

    fn execute(&self, engine: &mut FeatureEngine, config: &StageConfig) -> Result<(), PipelineError> {
        let failed = |e: crate::features::FeatureError| {
            PipelineError::StageFailed(self.name().to_string(), e.to_string())
        };

        let features = &config.features;
        let method = features.forecast_method().map_err(failed)?;
        for variable in &features.forecast_variables {
            engine
                .add_forecast_feature(variable, features.horizon, method)
                .map_err(failed)?;
        }
        Ok(())
    }
}
