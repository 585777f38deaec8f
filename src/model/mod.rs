//! Model
//!
//! The estimator contract consumed by experiments, plus small reference
//! estimators so an experiment can run end to end.
use crate::data::Matrix;
use crate::errors::CausalBenchError;
use rand::rngs::StdRng;

pub mod baseline;
pub mod linear;

pub use baseline::DifferenceInMeans;
pub use linear::{SLearner, TLearner};

/// A causal effect estimator.
pub trait CausalModel {
    /// Stable display name, used as the row index of result tables.
    fn name(&self) -> &str;

    /// Fit on proxies `x`, binary treatment `w` and outcome `y`.
    fn fit(&mut self, x: &Matrix<f64>, w: &[f64], y: &[f64], rng: &mut StdRng) -> Result<(), CausalBenchError>;

    /// Predict the individual treatment effect of every row of `x`.
    fn estimate_causal_effect(&self, x: &Matrix<f64>) -> Result<Vec<f64>, CausalBenchError>;
}

pub(crate) fn check_fit_inputs(x: &Matrix<f64>, w: &[f64], y: &[f64]) -> Result<(), CausalBenchError> {
    check_shape(x)?;
    if w.len() != x.rows {
        return Err(CausalBenchError::LengthMismatch(x.rows, w.len()));
    }
    if y.len() != x.rows {
        return Err(CausalBenchError::LengthMismatch(x.rows, y.len()));
    }
    if x.rows == 0 {
        return Err(CausalBenchError::EmptyInput);
    }
    Ok(())
}

/// Fail unless the backing slice of `x` holds exactly `rows * cols` values.
pub(crate) fn check_shape(x: &Matrix<f64>) -> Result<(), CausalBenchError> {
    if x.data.len() != x.rows * x.cols {
        return Err(CausalBenchError::LengthMismatch(x.rows * x.cols, x.data.len()));
    }
    Ok(())
}

/// Predict with `model`, requiring one finite effect per row of `x`.
pub(crate) fn estimate_checked(model: &dyn CausalModel, x: &Matrix<f64>) -> Result<Vec<f64>, CausalBenchError> {
    check_shape(x)?;
    let predictions = model.estimate_causal_effect(x)?;
    if predictions.len() != x.rows {
        return Err(CausalBenchError::LengthMismatch(x.rows, predictions.len()));
    }
    if let Some((row, &value)) = predictions.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(CausalBenchError::NonFinitePrediction {
            model: model.name().to_string(),
            row,
            value,
        });
    }
    Ok(predictions)
}

/// Row indices of the control and treated arms.
pub(crate) fn split_arms(w: &[f64]) -> (Vec<usize>, Vec<usize>) {
    let idx0 = w
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v == 0.0)
        .map(|(i, _)| i)
        .collect();
    let idx1 = w
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v == 1.0)
        .map(|(i, _)| i)
        .collect();
    (idx0, idx1)
}

pub(crate) fn require_both_arms(name: &str, idx0: &[usize], idx1: &[usize]) -> Result<(), CausalBenchError> {
    if idx0.is_empty() || idx1.is_empty() {
        return Err(CausalBenchError::InsufficientData(
            name.to_string(),
            format!("{} control and {} treated rows, both arms are required", idx0.len(), idx1.len()),
        ));
    }
    Ok(())
}
