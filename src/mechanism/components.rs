//! Components
//!
//! Parametric building blocks of a [`MechanismSpec`](super::MechanismSpec). Each
//! enum carries its parameters as named fields so that a mechanism can be
//! serialized, validated against a dimensionality, and tested in isolation.
use crate::errors::CausalBenchError;
use crate::utils::{sigmoid, validate_float_parameter, validate_positive_float_parameter, validate_probability_parameter};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Beta, Continuous, Normal};

pub(crate) fn check_features(features: &[usize], dimensions: usize) -> Result<(), CausalBenchError> {
    match features.iter().find(|&&f| f >= dimensions) {
        Some(&f) => Err(CausalBenchError::FeatureOutOfRange(f, dimensions)),
        None => Ok(()),
    }
}

fn check_finite(value: f64, parameter: &str) -> Result<(), CausalBenchError> {
    validate_float_parameter(value, f64::MIN, f64::MAX, parameter)
}

/// Outcome under no treatment, `main_effect(x)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MainEffect {
    Zero,
    /// `slope * x[feature] + intercept`
    Linear { feature: usize, slope: f64, intercept: f64 },
}

impl MainEffect {
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        match *self {
            MainEffect::Zero => 0.0,
            MainEffect::Linear {
                feature,
                slope,
                intercept,
            } => slope * x[feature] + intercept,
        }
    }

    pub fn validate(&self, dimensions: usize) -> Result<(), CausalBenchError> {
        match *self {
            MainEffect::Zero => Ok(()),
            MainEffect::Linear {
                feature,
                slope,
                intercept,
            } => {
                check_finite(slope, "slope")?;
                check_finite(intercept, "intercept")?;
                check_features(&[feature], dimensions)
            }
        }
    }
}

/// Effect of the treatment on the outcome, `treatment_effect(x)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreatmentEffect {
    Zero,
    Constant { value: f64 },
    /// `(1 + sigmoid(k (x_a - c))) (1 + sigmoid(k (x_b - c)))`
    SigmoidProduct {
        features: [usize; 2],
        steepness: f64,
        threshold: f64,
    },
    /// `scale * pdf(x_a, x_b)` of an isotropic bivariate normal.
    GaussianSpike {
        features: [usize; 2],
        mean: [f64; 2],
        variance: f64,
        scale: f64,
    },
    /// `sum(x_i^2)` over the listed features.
    SumOfSquares { features: Vec<usize> },
    /// `magnitude` with probability `probability`, otherwise 0, independently of `x`.
    RareSpike { probability: f64, magnitude: f64 },
}

impl TreatmentEffect {
    /// Draw the effect for one unit.
    pub fn sample(&self, x: &[f64], rng: &mut StdRng) -> f64 {
        match *self {
            TreatmentEffect::RareSpike {
                probability,
                magnitude,
            } => {
                if rng.gen::<f64>() <= probability {
                    magnitude
                } else {
                    0.0
                }
            }
            _ => self.expected(x),
        }
    }

    /// Expected effect given `x`.
    pub fn expected(&self, x: &[f64]) -> f64 {
        match self {
            TreatmentEffect::Zero => 0.0,
            TreatmentEffect::Constant { value } => *value,
            TreatmentEffect::SigmoidProduct {
                features,
                steepness,
                threshold,
            } => features
                .iter()
                .map(|&f| 1.0 + sigmoid(steepness * (x[f] - threshold)))
                .product(),
            TreatmentEffect::GaussianSpike {
                features,
                mean,
                variance,
                scale,
            } => {
                let std = variance.sqrt();
                let density: f64 = features
                    .iter()
                    .zip(mean.iter())
                    .map(|(&f, &m)| Normal::new(m, std).map(|n| n.pdf(x[f])).unwrap_or(f64::NAN))
                    .product();
                scale * density
            }
            TreatmentEffect::SumOfSquares { features } => features.iter().map(|&f| x[f].powi(2)).sum(),
            TreatmentEffect::RareSpike {
                probability,
                magnitude,
            } => probability * magnitude,
        }
    }

    pub fn validate(&self, dimensions: usize) -> Result<(), CausalBenchError> {
        match self {
            TreatmentEffect::Zero => Ok(()),
            TreatmentEffect::Constant { value } => check_finite(*value, "value"),
            TreatmentEffect::SigmoidProduct {
                features,
                steepness,
                threshold,
            } => {
                check_finite(*steepness, "steepness")?;
                check_finite(*threshold, "threshold")?;
                check_features(features, dimensions)
            }
            TreatmentEffect::GaussianSpike {
                features,
                mean,
                variance,
                scale,
            } => {
                check_finite(mean[0], "mean")?;
                check_finite(mean[1], "mean")?;
                validate_float_parameter(*variance, f64::MIN_POSITIVE, f64::MAX, "variance")?;
                check_finite(*scale, "scale")?;
                check_features(features, dimensions)
            }
            TreatmentEffect::SumOfSquares { features } => check_features(features, dimensions),
            TreatmentEffect::RareSpike {
                probability,
                magnitude,
            } => {
                validate_probability_parameter(*probability, "probability")?;
                check_finite(*magnitude, "magnitude")
            }
        }
    }
}

/// Probability of receiving treatment, `treatment_propensity(x)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Propensity {
    Constant { p: f64 },
    /// `(1 + BetaPdf(x[feature]; alpha, beta)) / 4`
    BetaDensity { feature: usize, alpha: f64, beta: f64 },
    /// `1 - ||(x_a, x_b) - center||`, higher close to the center.
    RadialDecay { features: [usize; 2], center: [f64; 2] },
}

impl Propensity {
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        match *self {
            Propensity::Constant { p } => p,
            Propensity::BetaDensity { feature, alpha, beta } => {
                let density = Beta::new(alpha, beta).map(|d| d.pdf(x[feature])).unwrap_or(f64::NAN);
                (1.0 + density) / 4.0
            }
            Propensity::RadialDecay { features, center } => {
                let dx = x[features[0]] - center[0];
                let dy = x[features[1]] - center[1];
                1.0 - (dx * dx + dy * dy).sqrt()
            }
        }
    }

    pub fn validate(&self, dimensions: usize) -> Result<(), CausalBenchError> {
        match self {
            Propensity::Constant { p } => validate_probability_parameter(*p, "p"),
            Propensity::BetaDensity { feature, alpha, beta } => {
                validate_float_parameter(*alpha, f64::MIN_POSITIVE, f64::MAX, "alpha")?;
                validate_float_parameter(*beta, f64::MIN_POSITIVE, f64::MAX, "beta")?;
                check_features(&[*feature], dimensions)
            }
            Propensity::RadialDecay { features, center } => {
                check_finite(center[0], "center")?;
                check_finite(center[1], "center")?;
                check_features(features, dimensions)
            }
        }
    }
}

/// Additive outcome noise, `noise()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NoiseSpec {
    None,
    /// `std * N(0, 1)`
    Gaussian { std: f64 },
}

impl NoiseSpec {
    pub fn sample(&self, rng: &mut StdRng) -> f64 {
        match *self {
            NoiseSpec::None => 0.0,
            NoiseSpec::Gaussian { std } => {
                let z: f64 = rng.sample(StandardNormal);
                std * z
            }
        }
    }

    pub fn validate(&self) -> Result<(), CausalBenchError> {
        match *self {
            NoiseSpec::None => Ok(()),
            NoiseSpec::Gaussian { std } => {
                validate_positive_float_parameter(std, "std")?;
                check_finite(std, "std")
            }
        }
    }
}

/// Treatment assignment, `treatment_function(propensity, noise)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Assignment {
    /// Treated when a uniform draw is at most the propensity.
    Bernoulli,
    /// Treated when `propensity + noise` exceeds `threshold`.
    NoisyThreshold { threshold: f64 },
}

impl Assignment {
    pub fn assign(&self, propensity: f64, noise: f64, rng: &mut StdRng) -> f64 {
        let treated = match *self {
            Assignment::Bernoulli => rng.gen::<f64>() <= propensity,
            Assignment::NoisyThreshold { threshold } => propensity + noise > threshold,
        };
        if treated {
            1.0
        } else {
            0.0
        }
    }

    pub fn validate(&self) -> Result<(), CausalBenchError> {
        match *self {
            Assignment::Bernoulli => Ok(()),
            Assignment::NoisyThreshold { threshold } => check_finite(threshold, "threshold"),
        }
    }
}

/// Outcome composition, `outcome_function(main, treatment, treatment_effect, noise)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutcomeSpec {
    /// `main + (t - 0.5) * effect + noise`
    Centered,
    /// `main + t * effect + noise`
    Additive,
    /// `factor * t * effect + noise`
    Scaled { factor: f64 },
    /// Bernoulli draw with logits `main + t * effect + noise`.
    BernoulliLogit,
}

impl OutcomeSpec {
    pub fn evaluate(&self, main: f64, treatment: f64, effect: f64, noise: f64, rng: &mut StdRng) -> f64 {
        match *self {
            OutcomeSpec::Centered => main + (treatment - 0.5) * effect + noise,
            OutcomeSpec::Additive => main + treatment * effect + noise,
            OutcomeSpec::Scaled { factor } => factor * treatment * effect + noise,
            OutcomeSpec::BernoulliLogit => {
                if rng.gen::<f64>() < sigmoid(main + treatment * effect + noise) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), CausalBenchError> {
        match *self {
            OutcomeSpec::Scaled { factor } => check_finite(factor, "factor"),
            _ => Ok(()),
        }
    }
}

/// Analytic ground truth, `cate(x)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CateSpec {
    /// The expected treatment effect at `x`.
    TreatmentEffect,
    Constant { value: f64 },
    /// `sigmoid(main + effect) - sigmoid(main)`, for Bernoulli-logit outcomes.
    LogitDifference,
}

impl CateSpec {
    pub fn validate(&self) -> Result<(), CausalBenchError> {
        match *self {
            CateSpec::Constant { value } => check_finite(value, "value"),
            _ => Ok(()),
        }
    }
}
