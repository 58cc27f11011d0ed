//! Twelve-month climate series with explicit missing values.

/// Number of monthly values in a complete series (January..December).
pub const MONTHS: usize = 12;

/// Ordered monthly values for one city and variable.
///
/// Missing values are kept as `None` and are never coerced to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateSeries {
    values: Vec<Option<f64>>,
    needs_cleanup: bool,
}

impl ClimateSeries {
    /// Wraps raw values. The series is flagged for cleanup if any value is
    /// missing or non-finite.
    pub fn new(values: Vec<Option<f64>>) -> Self {
        let needs_cleanup = values.iter().any(|v| !matches!(v, Some(x) if x.is_finite()));
        Self { values, needs_cleanup }
    }

    /// Builds a series where every value is present.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(values.into_iter().map(Some).collect())
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut Vec<Option<f64>> {
        &mut self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Exactly 12 values, all present and finite.
    pub fn is_complete(&self) -> bool {
        self.values.len() == MONTHS
            && self.values.iter().all(|v| matches!(v, Some(x) if x.is_finite()))
    }

    /// The 12 values if the series is complete.
    pub fn complete_values(&self) -> Option<[f64; MONTHS]> {
        if !self.is_complete() {
            return None;
        }
        let mut out = [0.0; MONTHS];
        for (slot, v) in out.iter_mut().zip(&self.values) {
            *slot = (*v)?;
        }
        Some(out)
    }

    /// Mean over the 12 months; `None` for incomplete series.
    pub fn mean(&self) -> Option<f64> {
        self.complete_values()
            .map(|vals| vals.iter().sum::<f64>() / MONTHS as f64)
    }

    /// Number of values that are missing or non-finite.
    pub fn missing_count(&self) -> usize {
        self.values
            .iter()
            .filter(|v| !matches!(v, Some(x) if x.is_finite()))
            .count()
    }

    pub fn needs_cleanup(&self) -> bool {
        self.needs_cleanup
    }

    pub(crate) fn mark_clean(&mut self) {
        self.needs_cleanup = false;
    }
}
