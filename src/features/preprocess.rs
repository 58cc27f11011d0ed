//! Cleanup of flagged series: invalid values out, short gaps interpolated.

use crate::series::{ClimateSeries, VariableKind};

/// Outcome of a preprocessing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreprocessReport {
    /// Series that were flagged and processed.
    pub series_cleaned: usize,
    /// Values filled by interpolation.
    pub values_imputed: usize,
    /// Values still marked missing afterwards.
    pub values_still_missing: usize,
}

/// Cleans one series in place and returns `(imputed, still_missing)`.
///
/// Non-finite values, and negative values of non-negative variables, are
/// turned into missing values first. Interior gaps of at most `max_gap`
/// months with a present value on both sides are then linearly
/// interpolated. Leading and trailing gaps are left missing.
pub fn clean_series(
    series: &mut ClimateSeries,
    variable: &VariableKind,
    max_gap: usize,
) -> (usize, usize) {
    let non_negative = variable.is_non_negative();
    let values = series.values_mut();

    for v in values.iter_mut() {
        if let Some(x) = *v {
            if !x.is_finite() || (non_negative && x < 0.0) {
                *v = None;
            }
        }
    }

    let mut imputed = 0;
    let mut i = 0;
    while i < values.len() {
        if values[i].is_some() {
            i += 1;
            continue;
        }

        let start = i;
        while i < values.len() && values[i].is_none() {
            i += 1;
        }
        let gap = i - start;

        let before = start.checked_sub(1).and_then(|b| values[b]);
        let after = values.get(i).copied().flatten();
        if let (Some(lo), Some(hi)) = (before, after) {
            if gap <= max_gap {
                let step = (hi - lo) / (gap + 1) as f64;
                for (k, slot) in values[start..i].iter_mut().enumerate() {
                    *slot = Some(lo + step * (k + 1) as f64);
                }
                imputed += gap;
            }
        }
    }

    series.mark_clean();
    (imputed, series.missing_count())
}
