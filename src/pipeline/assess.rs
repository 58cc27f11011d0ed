//! Per-city disaster-risk assessment over a processed engine.

use serde::Serialize;
use tracing::debug;

use crate::classify::{AggregateFeatureVector, DisasterLabel, DisasterModel};
use crate::features::FeatureEngine;
use crate::recommend::recommendation;
use crate::series::CityName;

/// Label and advisory for one city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityAssessment {
    pub city: CityName,
    pub vector: AggregateFeatureVector,
    pub label: DisasterLabel,
    pub recommendation: &'static str,
}

/// Assessments for every city with a complete aggregate vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssessmentReport {
    pub assessments: Vec<CityAssessment>,
    /// Cities withheld from prediction for lack of complete series.
    pub skipped: Vec<CityName>,
}

/// Assesses one city, or `None` if its aggregate vector is incomplete.
pub fn assess_city(
    engine: &FeatureEngine,
    model: &DisasterModel,
    city: &CityName,
) -> Option<CityAssessment> {
    let vector = AggregateFeatureVector::for_city(engine.table(), city)?;
    let label = model.predict(&vector);
    Some(CityAssessment {
        city: city.clone(),
        vector,
        label,
        recommendation: recommendation(label),
    })
}

/// Assesses every city in the engine, in city order.
pub fn assess_all(engine: &FeatureEngine, model: &DisasterModel) -> AssessmentReport {
    let mut report = AssessmentReport::default();
    for city in engine.cities() {
        match assess_city(engine, model, city) {
            Some(assessment) => report.assessments.push(assessment),
            None => {
                debug!(city = %city, "aggregate vector incomplete, prediction withheld");
                report.skipped.push(city.clone());
            }
        }
    }
    report
}
