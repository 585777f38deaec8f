//! Latent
//!
//! Mechanisms where treatment and outcome are drawn directly from the latent
//! vector, without a main effect / treatment effect decomposition. The ground
//! truth is the difference of the expected outcomes under both arms.
use super::components::check_features;
use super::proxy::ProxySpec;
use crate::errors::CausalBenchError;
use crate::utils::sigmoid;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A data-generating process over a latent vector `z`.
pub trait LatentMechanism {
    /// Must return 0 or 1.
    fn treatment(&self, z: &[f64], rng: &mut StdRng) -> f64;
    fn outcome(&self, z: &[f64], treatment: f64, rng: &mut StdRng) -> f64;
    /// `E[Y | z, t]`, used for the ground-truth effect.
    fn expected_outcome(&self, z: &[f64], treatment: f64) -> f64;

    fn proxy_function(&self, z: &[f64], _rng: &mut StdRng) -> Vec<Vec<f64>> {
        z.iter().map(|f| vec![*f]).collect()
    }

    fn validate(&self, _dimensions: usize) -> Result<(), CausalBenchError> {
        Ok(())
    }
}

/// Built-in latent processes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LatentModel {
    /// Five latent dimensions:
    /// `t ~ Bernoulli(clip(sin(pi z0 z1), 0.1, 0.9))`,
    /// `y = sin(pi z0 z1) + 2 (z2 - 0.5)^2 + z3 + 0.5 z4 + (t - 0.5)(z0 + z1) / 2`.
    Synthetic,
    /// `t ~ Bernoulli(sigmoid(z0))`, `y ~ N(t z0 + z0, outcome_std)`.
    Gaussian { outcome_std: f64 },
    /// Binary `z0` is the treatment, `y ~ Bernoulli(sigmoid(3 (z0 + 2 (2t - 1))))`.
    BinaryToy,
}

impl LatentModel {
    fn required_features(&self) -> Vec<usize> {
        match self {
            LatentModel::Synthetic => (0..5).collect(),
            LatentModel::Gaussian { .. } | LatentModel::BinaryToy => vec![0],
        }
    }
}

/// A [`LatentModel`] together with its measurement layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatentSpec {
    pub model: LatentModel,
    #[serde(default)]
    pub proxy: ProxySpec,
}

impl LatentSpec {
    pub fn new(model: LatentModel, proxy: ProxySpec) -> Self {
        LatentSpec { model, proxy }
    }
}

fn bernoulli(p: f64, rng: &mut StdRng) -> f64 {
    if rng.gen::<f64>() < p {
        1.0
    } else {
        0.0
    }
}

impl LatentMechanism for LatentSpec {
    fn treatment(&self, z: &[f64], rng: &mut StdRng) -> f64 {
        match self.model {
            LatentModel::Synthetic => bernoulli((PI * z[0] * z[1]).sin().clamp(0.1, 0.9), rng),
            LatentModel::Gaussian { .. } => bernoulli(sigmoid(z[0]), rng),
            LatentModel::BinaryToy => z[0],
        }
    }

    fn outcome(&self, z: &[f64], treatment: f64, rng: &mut StdRng) -> f64 {
        match self.model {
            LatentModel::Synthetic => self.expected_outcome(z, treatment),
            LatentModel::Gaussian { outcome_std } => {
                let e: f64 = rng.sample(StandardNormal);
                self.expected_outcome(z, treatment) + outcome_std * e
            }
            LatentModel::BinaryToy => bernoulli(self.expected_outcome(z, treatment), rng),
        }
    }

    fn expected_outcome(&self, z: &[f64], treatment: f64) -> f64 {
        match self.model {
            LatentModel::Synthetic => {
                (PI * z[0] * z[1]).sin()
                    + 2.0 * (z[2] - 0.5).powi(2)
                    + z[3]
                    + 0.5 * z[4]
                    + (treatment - 0.5) * (z[0] + z[1]) / 2.0
            }
            LatentModel::Gaussian { .. } => treatment * z[0] + z[0],
            LatentModel::BinaryToy => sigmoid(3.0 * (z[0] + 2.0 * (2.0 * treatment - 1.0))),
        }
    }

    fn proxy_function(&self, z: &[f64], rng: &mut StdRng) -> Vec<Vec<f64>> {
        self.proxy.apply(z, rng)
    }

    fn validate(&self, dimensions: usize) -> Result<(), CausalBenchError> {
        if let LatentModel::Gaussian { outcome_std } = self.model {
            crate::utils::validate_float_parameter(outcome_std, 0.0, f64::MAX, "outcome_std")?;
        }
        check_features(&self.model.required_features(), dimensions)?;
        self.proxy.validate(dimensions)
    }
}
