//! Fixed transforms that derive new monthly series from existing ones.

use crate::series::{VariableKind, MONTHS};

static HUMIDITY_INPUTS: [VariableKind; 2] = [VariableKind::Rainfall, VariableKind::Sunshine];
static ARIDITY_INPUTS: [VariableKind; 2] = [VariableKind::Rainfall, VariableKind::Temperature];

/// A derived feature and its formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedFeature {
    /// Humidity proxy: rainfall / (sunshine + 1).
    HumidityIndex,
    /// Monthly De Martonne aridity index: 12 · rainfall / (temperature + 10).
    AridityIndex,
}

impl DerivedFeature {
    pub const ALL: [DerivedFeature; 2] = [DerivedFeature::HumidityIndex, DerivedFeature::AridityIndex];

    /// Variable the derived series is stored under.
    pub fn variable(self) -> VariableKind {
        match self {
            DerivedFeature::HumidityIndex => VariableKind::HumidityIndex,
            DerivedFeature::AridityIndex => VariableKind::AridityIndex,
        }
    }

    /// Input variables, in the order `compute` expects them.
    pub fn inputs(self) -> &'static [VariableKind] {
        match self {
            DerivedFeature::HumidityIndex => &HUMIDITY_INPUTS,
            DerivedFeature::AridityIndex => &ARIDITY_INPUTS,
        }
    }

    /// Applies the formula month by month. Returns `None` if any month is
    /// undefined (e.g. temperature at or below -10 °C for the aridity index).
    pub fn compute(self, inputs: &[[f64; MONTHS]]) -> Option<[f64; MONTHS]> {
        if inputs.len() != self.inputs().len() {
            return None;
        }

        let mut out = [0.0; MONTHS];
        for (m, slot) in out.iter_mut().enumerate() {
            let value = match self {
                DerivedFeature::HumidityIndex => {
                    let (rain, sun) = (inputs[0][m], inputs[1][m]);
                    if sun < 0.0 {
                        return None;
                    }
                    rain / (sun + 1.0)
                }
                DerivedFeature::AridityIndex => {
                    let (rain, temp) = (inputs[0][m], inputs[1][m]);
                    let denom = temp + 10.0;
                    if denom <= 0.0 {
                        return None;
                    }
                    12.0 * rain / denom
                }
            };
            if !value.is_finite() {
                return None;
            }
            *slot = value;
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humidity_index() {
        let out = DerivedFeature::HumidityIndex
            .compute(&[[100.0; MONTHS], [4.0; MONTHS]])
            .unwrap();
        assert!(out.iter().all(|&v| (v - 20.0).abs() < 1e-12));
    }

    #[test]
    fn test_aridity_index() {
        let out = DerivedFeature::AridityIndex
            .compute(&[[50.0; MONTHS], [20.0; MONTHS]])
            .unwrap();
        assert!(out.iter().all(|&v| (v - 20.0).abs() < 1e-12));
    }

    #[test]
    fn test_aridity_undefined_in_deep_cold() {
        let mut temps = [5.0; MONTHS];
        temps[0] = -10.0;
        assert!(DerivedFeature::AridityIndex
            .compute(&[[50.0; MONTHS], temps])
            .is_none());
    }

    #[test]
    fn test_wrong_input_count_is_rejected() {
        assert!(DerivedFeature::HumidityIndex.compute(&[[1.0; MONTHS]]).is_none());
    }
}
