//! Proxy
//!
//! The measurement layer between raw features and what models observe. Each
//! proxy group is derived from one feature and may hold several noisy copies of it.
use super::components::check_features;
use crate::errors::CausalBenchError;
use crate::utils::validate_float_parameter;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// A single observed value derived from a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProxyComponent {
    /// The feature itself.
    Exact,
    /// `x + std * N(0, 1)`
    Gaussian { std: f64 },
    /// `x + (base_std + slope * x) * N(0, 1)`, the scale is floored at 0.
    Heteroscedastic { base_std: f64, slope: f64 },
}

impl ProxyComponent {
    fn observe(&self, x: f64, rng: &mut StdRng) -> f64 {
        let std = match *self {
            ProxyComponent::Exact => return x,
            ProxyComponent::Gaussian { std } => std,
            ProxyComponent::Heteroscedastic { base_std, slope } => (base_std + slope * x).max(0.0),
        };
        let z: f64 = rng.sample(StandardNormal);
        x + std * z
    }

    fn validate(&self) -> Result<(), CausalBenchError> {
        match *self {
            ProxyComponent::Exact => Ok(()),
            ProxyComponent::Gaussian { std } => validate_float_parameter(std, 0.0, f64::MAX, "std"),
            ProxyComponent::Heteroscedastic { base_std, slope } => {
                validate_float_parameter(base_std, f64::MIN, f64::MAX, "base_std")?;
                validate_float_parameter(slope, f64::MIN, f64::MAX, "slope")
            }
        }
    }
}

/// Observed values derived from a single feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyGroup {
    pub feature: usize,
    pub components: Vec<ProxyComponent>,
}

impl ProxyGroup {
    pub fn exact(feature: usize) -> Self {
        ProxyGroup {
            feature,
            components: vec![ProxyComponent::Exact],
        }
    }

    /// `copies` exact copies of the feature.
    pub fn replicated(feature: usize, copies: usize) -> Self {
        ProxyGroup {
            feature,
            components: vec![ProxyComponent::Exact; copies],
        }
    }

    /// `copies` independent Gaussian measurements of the feature.
    pub fn noisy(feature: usize, copies: usize, std: f64) -> Self {
        ProxyGroup {
            feature,
            components: vec![ProxyComponent::Gaussian { std }; copies],
        }
    }
}

/// `proxy_function(features)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum ProxySpec {
    /// One exact proxy per feature.
    #[default]
    Identity,
    Groups(Vec<ProxyGroup>),
}

impl ProxySpec {
    /// Exact proxies for the first `n` features only.
    pub fn first_features(n: usize) -> Self {
        ProxySpec::Groups((0..n).map(ProxyGroup::exact).collect())
    }

    pub fn apply(&self, features: &[f64], rng: &mut StdRng) -> Vec<Vec<f64>> {
        match self {
            ProxySpec::Identity => features.iter().map(|f| vec![*f]).collect(),
            ProxySpec::Groups(groups) => groups
                .iter()
                .map(|g| {
                    g.components
                        .iter()
                        .map(|c| c.observe(features[g.feature], rng))
                        .collect()
                })
                .collect(),
        }
    }

    pub fn validate(&self, dimensions: usize) -> Result<(), CausalBenchError> {
        match self {
            ProxySpec::Identity => Ok(()),
            ProxySpec::Groups(groups) => {
                if groups.iter().all(|g| g.components.is_empty()) {
                    return Err(CausalBenchError::InvalidParameter(
                        "proxy".to_string(),
                        "at least one proxy component".to_string(),
                        "none".to_string(),
                    ));
                }
                let features: Vec<usize> = groups.iter().map(|g| g.feature).collect();
                check_features(&features, dimensions)?;
                groups
                    .iter()
                    .flat_map(|g| g.components.iter())
                    .try_for_each(|c| c.validate())
            }
        }
    }
}
