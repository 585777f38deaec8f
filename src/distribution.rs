//! Distribution
//!
//! Per-dimension feature distributions for the generators. A configured list of
//! distributions is resolved against the generator's dimensionality once, at
//! construction, into a [`FeatureSampler`].
use crate::errors::CausalBenchError;
use crate::utils::{validate_float_parameter, validate_positive_float_parameter, validate_probability_parameter};
use log::warn;
use rand::rngs::StdRng;
use rand_distr::{Bernoulli, Distribution, Exp, Normal, Uniform};
use serde::{Deserialize, Serialize};

/// Distribution a single raw feature is drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureDistribution {
    /// Continuous uniform on `[low, high)`.
    Uniform { low: f64, high: f64 },
    Normal { mean: f64, std: f64 },
    /// 0 or 1, with `P(1) = p`.
    Bernoulli { p: f64 },
    Exponential { rate: f64 },
    Constant { value: f64 },
}

impl Default for FeatureDistribution {
    fn default() -> Self {
        FeatureDistribution::Uniform { low: 0.0, high: 1.0 }
    }
}

enum Draw {
    Uniform(Uniform<f64>),
    Normal(Normal<f64>),
    Bernoulli(Bernoulli),
    Exponential(Exp<f64>),
    Constant(f64),
}

impl Draw {
    fn sample(&self, rng: &mut StdRng) -> f64 {
        match self {
            Draw::Uniform(d) => d.sample(rng),
            Draw::Normal(d) => d.sample(rng),
            Draw::Bernoulli(d) => {
                if d.sample(rng) {
                    1.0
                } else {
                    0.0
                }
            }
            Draw::Exponential(d) => d.sample(rng),
            Draw::Constant(v) => *v,
        }
    }
}

impl TryFrom<&FeatureDistribution> for Draw {
    type Error = CausalBenchError;

    fn try_from(distribution: &FeatureDistribution) -> Result<Self, Self::Error> {
        let invalid = |name: &str, expected: &str, e: String| {
            CausalBenchError::InvalidParameter(name.to_string(), expected.to_string(), e)
        };
        match *distribution {
            FeatureDistribution::Uniform { low, high } => {
                validate_float_parameter(low, f64::MIN, f64::MAX, "low")?;
                validate_float_parameter(high, f64::MIN, f64::MAX, "high")?;
                if low >= high {
                    return Err(invalid("high", "a value above low", high.to_string()));
                }
                if !(high - low).is_finite() {
                    return Err(invalid("high", "a range with a finite width", format!("{} to {}", low, high)));
                }
                Ok(Draw::Uniform(Uniform::new(low, high)))
            }
            FeatureDistribution::Normal { mean, std } => {
                validate_float_parameter(mean, f64::MIN, f64::MAX, "mean")?;
                validate_positive_float_parameter(std, "std")?;
                Normal::new(mean, std)
                    .map(Draw::Normal)
                    .map_err(|e| invalid("std", "a finite standard deviation", e.to_string()))
            }
            FeatureDistribution::Bernoulli { p } => {
                validate_probability_parameter(p, "p")?;
                Bernoulli::new(p)
                    .map(Draw::Bernoulli)
                    .map_err(|e| invalid("p", "a probability", e.to_string()))
            }
            FeatureDistribution::Exponential { rate } => {
                validate_positive_float_parameter(rate, "rate")?;
                if rate == 0.0 || rate.is_infinite() {
                    return Err(invalid("rate", "a positive finite rate", rate.to_string()));
                }
                Exp::new(rate)
                    .map(Draw::Exponential)
                    .map_err(|e| invalid("rate", "a positive rate", e.to_string()))
            }
            FeatureDistribution::Constant { value } => {
                validate_float_parameter(value, f64::MIN, f64::MAX, "value")?;
                Ok(Draw::Constant(value))
            }
        }
    }
}

/// Draws a full feature vector, one value per dimension.
///
/// When fewer distributions than dimensions are configured, the last
/// distribution is reused for every remaining dimension. Distributions beyond the
/// dimensionality are ignored. With no distribution at all, every dimension is
/// `Uniform(0, 1)`.
pub struct FeatureSampler {
    draws: Vec<Draw>,
    dimensions: usize,
}

impl FeatureSampler {
    pub fn new(distributions: &[FeatureDistribution], dimensions: usize) -> Result<Self, CausalBenchError> {
        if dimensions == 0 {
            return Err(CausalBenchError::InvalidParameter(
                "dimensions".to_string(),
                "at least one dimension".to_string(),
                "0".to_string(),
            ));
        }
        if distributions.len() > dimensions {
            warn!(
                "{} distributions configured for {} dimensions, the last {} are ignored.",
                distributions.len(),
                dimensions,
                distributions.len() - dimensions
            );
        }
        let draws = if distributions.is_empty() {
            vec![Draw::try_from(&FeatureDistribution::default())?]
        } else {
            distributions
                .iter()
                .take(dimensions)
                .map(Draw::try_from)
                .collect::<Result<Vec<_>, _>>()?
        };
        Ok(FeatureSampler { draws, dimensions })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Index of the distribution used for dimension `d`.
    pub fn distribution_index(&self, d: usize) -> usize {
        d.min(self.draws.len() - 1)
    }

    pub fn sample(&self, rng: &mut StdRng) -> Vec<f64> {
        (0..self.dimensions)
            .map(|d| self.draws[self.distribution_index(d)].sample(rng))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_last_distribution_is_reused() {
        let distributions = vec![
            FeatureDistribution::Constant { value: 1.0 },
            FeatureDistribution::Constant { value: 7.0 },
        ];
        let sampler = FeatureSampler::new(&distributions, 5).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(sampler.sample(&mut rng), vec![1.0, 7.0, 7.0, 7.0, 7.0]);
        assert_eq!(sampler.distribution_index(4), 1);
    }

    #[test]
    fn test_extra_distributions_are_ignored() {
        let distributions = vec![
            FeatureDistribution::Constant { value: 1.0 },
            FeatureDistribution::Constant { value: 2.0 },
            FeatureDistribution::Constant { value: 3.0 },
        ];
        let sampler = FeatureSampler::new(&distributions, 2).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(sampler.sample(&mut rng), vec![1.0, 2.0]);
    }

    #[test]
    fn test_default_is_unit_uniform() {
        let sampler = FeatureSampler::new(&[], 3).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let x = sampler.sample(&mut rng);
            assert_eq!(x.len(), 3);
            assert!(x.iter().all(|v| (0.0..1.0).contains(v)));
        }
    }

    #[test]
    fn test_bernoulli_values() {
        let sampler = FeatureSampler::new(&[FeatureDistribution::Bernoulli { p: 0.5 }], 4).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let x = sampler.sample(&mut rng);
        assert!(x.iter().all(|v| *v == 0.0 || *v == 1.0));
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(FeatureSampler::new(&[FeatureDistribution::Uniform { low: 1.0, high: 1.0 }], 1).is_err());
        assert!(matches!(
            FeatureSampler::new(&[FeatureDistribution::Uniform { low: -1e308, high: 1e308 }], 1),
            Err(CausalBenchError::InvalidParameter(..))
        ));
        assert!(FeatureSampler::new(&[FeatureDistribution::Normal { mean: 0.0, std: -1.0 }], 1).is_err());
        assert!(FeatureSampler::new(&[FeatureDistribution::Bernoulli { p: 1.5 }], 1).is_err());
        assert!(FeatureSampler::new(&[FeatureDistribution::Exponential { rate: f64::NAN }], 1).is_err());
        assert!(FeatureSampler::new(&[], 0).is_err());
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let distributions = vec![FeatureDistribution::Normal { mean: 0.0, std: 1.0 }];
        let sampler = FeatureSampler::new(&distributions, 3).unwrap();
        let a = sampler.sample(&mut StdRng::seed_from_u64(9));
        let b = sampler.sample(&mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}
