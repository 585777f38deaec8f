//! Proxy Generator
//!
//! Samples rows from a [`CausalMechanism`]: features, propensity, noise,
//! treatment, main and treatment effects, outcome, ground-truth CATE, and
//! finally the proxies the models get to see.
use super::{check_proxies, check_sample_size, check_treatment, Generator, GeneratorState};
use crate::dataset::{Dataset, DatasetBuilder};
use crate::distribution::{FeatureDistribution, FeatureSampler};
use crate::errors::CausalBenchError;
use crate::mechanism::CausalMechanism;
use crate::utils::ensure_finite;
use rand::rngs::StdRng;

/// Generator composing a full causal mechanism.
pub struct ProxyGenerator<M: CausalMechanism> {
    mechanism: M,
    distributions: Vec<FeatureDistribution>,
    sampler: FeatureSampler,
    state: GeneratorState,
}

impl<M: CausalMechanism> ProxyGenerator<M> {
    /// Create a new generator.
    ///
    /// * `mechanism` - The causal mechanism, validated against `dimensions`.
    /// * `dimensions` - Number of raw features per row.
    /// * `distributions` - Per-dimension feature distributions, the last one is reused
    ///   for any remaining dimension.
    /// * `name` - Name of the generator, used for its output directory.
    pub fn new(
        mechanism: M,
        dimensions: usize,
        distributions: Vec<FeatureDistribution>,
        name: Option<String>,
    ) -> Result<Self, CausalBenchError> {
        let sampler = FeatureSampler::new(&distributions, dimensions)?;
        mechanism.validate(dimensions)?;
        let name = name.unwrap_or_else(|| "custom_generator".to_string());
        Ok(ProxyGenerator {
            mechanism,
            distributions,
            sampler,
            state: GeneratorState::new(&name),
        })
    }

    pub fn mechanism(&self) -> &M {
        &self.mechanism
    }

    pub fn distributions(&self) -> &[FeatureDistribution] {
        &self.distributions
    }
}

impl<M: CausalMechanism> Generator for ProxyGenerator<M> {
    fn state(&self) -> &GeneratorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut GeneratorState {
        &mut self.state
    }

    fn dimensions(&self) -> usize {
        self.sampler.dimensions()
    }

    fn generate(&self, sample_size: usize, rng: &mut StdRng) -> Result<Dataset, CausalBenchError> {
        check_sample_size(sample_size)?;
        let m = &self.mechanism;
        let mut builder = DatasetBuilder::new(self.dimensions(), sample_size);
        for row in 0..sample_size {
            let features = self.sampler.sample(rng);
            let propensity = ensure_finite(m.treatment_propensity(&features), "treatment_propensity", row)?;
            let noise = ensure_finite(m.noise(rng), "noise", row)?;
            let treatment = check_treatment(m.treatment_function(propensity, noise, rng), row)?;
            let main = ensure_finite(m.main_effect(&features), "main_effect", row)?;
            let effect = ensure_finite(m.treatment_effect(&features, rng), "treatment_effect", row)?;
            let outcome = ensure_finite(
                m.outcome_function(main, treatment, effect, noise, rng),
                "outcome_function",
                row,
            )?;
            let true_effect = ensure_finite(m.cate(&features), "cate", row)?;
            let proxies = m.proxy_function(&features, rng);
            check_proxies(&proxies, row)?;
            builder.push(proxies, treatment, outcome, true_effect)?;
        }
        Ok(builder.build())
    }
}
