//! Pipeline module for orchestrating feature stages and city assessment.
//!
//! Provides a trait-based architecture for feature stages that can be
//! composed into a complete processing pipeline, plus the per-city
//! classification step that runs on its output.

mod assess;
mod stage;

pub use assess::{assess_all, assess_city, AssessmentReport, CityAssessment};
pub use stage::{
    DerivedFeatureStage, FeatureStage, ForecastStage, Pipeline, PipelineError, PreprocessStage,
    StageConfig, StageId,
};
