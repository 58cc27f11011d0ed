//! Least-squares trend fitting over ordinal month indices.
//!
//! The 12 observed months sit at x = 0..11 and the forecast is the fitted
//! curve evaluated at x = 12..(11 + horizon). Internally x is mapped onto
//! [-1, 1] before building the normal equations, which keeps higher degrees
//! well conditioned.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::series::MONTHS;

use super::FeatureError;

/// Trend model used for a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum ForecastMethod {
    /// Straight line (degree 1).
    Linear,
    /// Polynomial of the given degree.
    Polynomial { degree: usize },
}

impl ForecastMethod {
    /// Parses a method name. `degree` is only used for `"polynomial"`.
    pub fn parse(method: &str, degree: usize) -> Result<Self, FeatureError> {
        match method.trim().to_lowercase().as_str() {
            "linear" => Ok(ForecastMethod::Linear),
            "polynomial" | "poly" => Ok(ForecastMethod::Polynomial { degree }),
            other => Err(FeatureError::UnknownMethod(other.to_string())),
        }
    }

    pub fn degree(&self) -> usize {
        match self {
            ForecastMethod::Linear => 1,
            ForecastMethod::Polynomial { degree } => *degree,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ForecastMethod::Linear => "linear",
            ForecastMethod::Polynomial { .. } => "polynomial",
        }
    }
}

/// Fitting failures. These only ever affect a single (city, variable) pair.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("degree {degree} needs more than {points} points")]
    TooFewPoints { degree: usize, points: usize },
    #[error("normal equations are singular")]
    Singular,
}

/// Forecast for one (city, variable) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub method: ForecastMethod,
    /// Forecast values for months 12..(11 + horizon).
    pub forecast: Vec<f64>,
    /// In-sample mean absolute error of the fit.
    pub error: f64,
    /// `(forecast - error·k, forecast + error·k)` per forecast point.
    pub confidence_interval: Vec<(f64, f64)>,
}

impl ForecastResult {
    pub fn horizon(&self) -> usize {
        self.forecast.len()
    }
}

/// Fitted polynomial in the normalized coordinate `t = (x - center) / scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendFit {
    /// Coefficients, lowest power first.
    pub coefficients: Vec<f64>,
    center: f64,
    scale: f64,
}

impl TrendFit {
    /// Evaluates the fit at ordinal index `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        let t = (x - self.center) / self.scale;
        self.coefficients.iter().rev().fold(0.0, |acc, &c| acc * t + c)
    }
}

/// Least-squares polynomial fit of `ys` against x = 0..ys.len()-1.
pub fn fit_polynomial(ys: &[f64], degree: usize) -> Result<TrendFit, FitError> {
    let n = ys.len();
    if n <= degree {
        return Err(FitError::TooFewPoints { degree, points: n });
    }

    let center = (n as f64 - 1.0) / 2.0;
    let scale = if center > 0.0 { center } else { 1.0 };
    let terms = degree + 1;

    // Power sums Σ t^p for p in 0..=2·degree.
    let ts: Vec<f64> = (0..n).map(|i| (i as f64 - center) / scale).collect();
    let mut power_sums = vec![0.0; 2 * degree + 1];
    let mut rhs = vec![0.0; terms];
    for (&t, &y) in ts.iter().zip(ys) {
        let mut tp = 1.0;
        for (p, sum) in power_sums.iter_mut().enumerate() {
            *sum += tp;
            if p < terms {
                rhs[p] += tp * y;
            }
            tp *= t;
        }
    }

    // Augmented normal matrix [A | b].
    let mut m: Vec<Vec<f64>> = (0..terms)
        .map(|row| {
            let mut r: Vec<f64> = (0..terms).map(|col| power_sums[row + col]).collect();
            r.push(rhs[row]);
            r
        })
        .collect();

    let coefficients = solve_gaussian(&mut m).ok_or(FitError::Singular)?;
    Ok(TrendFit { coefficients, center, scale })
}

/// Gaussian elimination with partial pivoting on an augmented matrix.
fn solve_gaussian(m: &mut [Vec<f64>]) -> Option<Vec<f64>> {
    let n = m.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))?;
        if m[pivot][col].abs() < 1e-12 {
            return None;
        }
        m.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = m[row][col] / m[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..=n {
                m[row][k] -= factor * m[col][k];
            }
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| m[row][k] * x[k]).sum();
        x[row] = (m[row][n] - tail) / m[row][row];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}

/// Fits `values` with `method` and projects `horizon` months ahead.
pub fn forecast_series(
    values: &[f64; MONTHS],
    horizon: usize,
    method: ForecastMethod,
    ci_multiplier: f64,
) -> Result<ForecastResult, FitError> {
    let fit = fit_polynomial(values, method.degree())?;

    let error = values
        .iter()
        .enumerate()
        .map(|(i, &y)| (fit.evaluate(i as f64) - y).abs())
        .sum::<f64>()
        / MONTHS as f64;

    let forecast: Vec<f64> = (MONTHS..MONTHS + horizon)
        .map(|x| fit.evaluate(x as f64))
        .collect();

    let half_width = error * ci_multiplier;
    let confidence_interval = forecast
        .iter()
        .map(|&f| (f - half_width, f + half_width))
        .collect();

    Ok(ForecastResult {
        method,
        forecast,
        error,
        confidence_interval,
    })
}
