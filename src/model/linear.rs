//! Linear
//!
//! Ridge regression and the S- and T-learners built on it.
use super::{check_fit_inputs, require_both_arms, split_arms, CausalModel};
use crate::data::{Matrix, RowMajorMatrix};
use crate::errors::CausalBenchError;
use crate::utils::validate_float_parameter;
use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Ridge regression with an unpenalized intercept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ridge {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl Ridge {
    /// Fit `y ~ design` minimizing `||y - b0 - X b||^2 + alpha ||b||^2`.
    ///
    /// * `design` - Row-major design matrix, without an intercept column.
    /// * `y` - Targets, one per design row.
    /// * `alpha` - L2 penalty on the coefficients.
    pub fn fit(design: &RowMajorMatrix<f64>, y: &[f64], alpha: f64) -> Result<Self, CausalBenchError> {
        let n = design.rows;
        let p = design.cols;
        if y.len() != n {
            return Err(CausalBenchError::LengthMismatch(n, y.len()));
        }
        if n == 0 {
            return Err(CausalBenchError::EmptyInput);
        }

        // Centering removes the intercept from the penalized system.
        let x = DMatrix::from_row_slice(n, p, design.data.as_slice());
        let x_mean: Vec<f64> = (0..p).map(|j| x.column(j).mean()).collect();
        let centered = DMatrix::from_fn(n, p, |i, j| x[(i, j)] - x_mean[j]);
        let y_mean = y.iter().sum::<f64>() / n as f64;
        let yc = DVector::from_iterator(n, y.iter().map(|v| v - y_mean));

        let a = centered.transpose() * &centered + DMatrix::<f64>::identity(p, p) * alpha;
        let b = centered.transpose() * yc;
        let beta = a.lu().solve(&b).ok_or(CausalBenchError::SingularSystem)?;
        if beta.iter().any(|v| !v.is_finite()) {
            return Err(CausalBenchError::SingularSystem);
        }

        let coefficients: Vec<f64> = beta.iter().copied().collect();
        let intercept = y_mean - coefficients.iter().zip(x_mean.iter()).map(|(c, m)| c * m).sum::<f64>();
        Ok(Ridge {
            intercept,
            coefficients,
        })
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept + self.coefficients.iter().zip(row).map(|(c, v)| c * v).sum::<f64>()
    }
}

fn validate_alpha(alpha: f64) -> Result<(), CausalBenchError> {
    validate_float_parameter(alpha, 0.0, f64::MAX, "alpha")
}

fn check_width(name: &str, fitted: usize, x: &Matrix<f64>) -> Result<(), CausalBenchError> {
    if fitted != x.cols {
        return Err(CausalBenchError::InvalidParameter(
            format!("{} input", name),
            format!("{} columns", fitted),
            x.cols.to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// S-Learner
// ---------------------------------------------------------------------------

/// S-Learner over a single ridge model of `y ~ x + w + w * x`.
///
/// CATE(x) = mu(x, 1) - mu(x, 0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SLearner {
    name: String,
    alpha: f64,
    features: usize,
    model: Option<Ridge>,
}

fn s_learner_row(x: &[f64], w: f64) -> Vec<f64> {
    let mut row = Vec::with_capacity(2 * x.len() + 1);
    row.extend_from_slice(x);
    row.push(w);
    row.extend(x.iter().map(|v| v * w));
    row
}

impl SLearner {
    pub fn new(alpha: f64, id: usize) -> Result<Self, CausalBenchError> {
        validate_alpha(alpha)?;
        Ok(SLearner {
            name: format!("S-Learner {}", id),
            alpha,
            features: 0,
            model: None,
        })
    }
}

impl CausalModel for SLearner {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&mut self, x: &Matrix<f64>, w: &[f64], y: &[f64], _rng: &mut StdRng) -> Result<(), CausalBenchError> {
        check_fit_inputs(x, w, y)?;
        let mut design = RowMajorMatrix::with_capacity(x.rows, 2 * x.cols + 1);
        for (i, w_) in w.iter().enumerate() {
            design.append_row(s_learner_row(&x.get_row(i), *w_));
        }
        self.model = Some(Ridge::fit(&design, y, self.alpha)?);
        self.features = x.cols;
        Ok(())
    }

    fn estimate_causal_effect(&self, x: &Matrix<f64>) -> Result<Vec<f64>, CausalBenchError> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| CausalBenchError::NotFitted(self.name.clone()))?;
        check_width(&self.name, self.features, x)?;
        Ok((0..x.rows)
            .map(|i| {
                let row = x.get_row(i);
                model.predict_row(&s_learner_row(&row, 1.0)) - model.predict_row(&s_learner_row(&row, 0.0))
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// T-Learner
// ---------------------------------------------------------------------------

/// T-Learner, one ridge model per treatment arm.
///
/// CATE(x) = mu_1(x) - mu_0(x).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TLearner {
    name: String,
    alpha: f64,
    features: usize,
    mu0: Option<Ridge>,
    mu1: Option<Ridge>,
}

impl TLearner {
    pub fn new(alpha: f64, id: usize) -> Result<Self, CausalBenchError> {
        validate_alpha(alpha)?;
        Ok(TLearner {
            name: format!("T-Learner {}", id),
            alpha,
            features: 0,
            mu0: None,
            mu1: None,
        })
    }

    fn fit_arm(&self, x: &Matrix<f64>, y: &[f64], idx: &[usize]) -> Result<Ridge, CausalBenchError> {
        let mut design = RowMajorMatrix::with_capacity(idx.len(), x.cols);
        let mut targets = Vec::with_capacity(idx.len());
        for &i in idx {
            design.append_row(x.get_row(i));
            targets.push(y[i]);
        }
        Ridge::fit(&design, &targets, self.alpha)
    }
}

impl CausalModel for TLearner {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&mut self, x: &Matrix<f64>, w: &[f64], y: &[f64], _rng: &mut StdRng) -> Result<(), CausalBenchError> {
        check_fit_inputs(x, w, y)?;
        let (idx0, idx1) = split_arms(w);
        require_both_arms(&self.name, &idx0, &idx1)?;
        self.mu0 = Some(self.fit_arm(x, y, &idx0)?);
        self.mu1 = Some(self.fit_arm(x, y, &idx1)?);
        self.features = x.cols;
        Ok(())
    }

    fn estimate_causal_effect(&self, x: &Matrix<f64>) -> Result<Vec<f64>, CausalBenchError> {
        let (mu0, mu1) = match (&self.mu0, &self.mu1) {
            (Some(mu0), Some(mu1)) => (mu0, mu1),
            _ => return Err(CausalBenchError::NotFitted(self.name.clone())),
        };
        check_width(&self.name, self.features, x)?;
        Ok((0..x.rows)
            .map(|i| {
                let row = x.get_row(i);
                mu1.predict_row(&row) - mu0.predict_row(&row)
            })
            .collect())
    }
}
