//! Latent Generator
//!
//! Samples rows where treatment and outcome are direct functions of the latent
//! vector, see [`LatentMechanism`].
use super::{check_proxies, check_sample_size, check_treatment, Generator, GeneratorState};
use crate::dataset::{Dataset, DatasetBuilder};
use crate::distribution::{FeatureDistribution, FeatureSampler};
use crate::errors::CausalBenchError;
use crate::mechanism::LatentMechanism;
use crate::utils::ensure_finite;
use rand::rngs::StdRng;

/// Generator over a latent vector without an explicit effect decomposition.
pub struct LatentGenerator<L: LatentMechanism> {
    mechanism: L,
    sampler: FeatureSampler,
    state: GeneratorState,
}

impl<L: LatentMechanism> LatentGenerator<L> {
    /// Create a new generator.
    ///
    /// * `mechanism` - The latent mechanism, validated against `dimensions`.
    /// * `dimensions` - Number of latent features per row.
    /// * `distributions` - Per-dimension latent distributions, the last one is reused.
    /// * `name` - Name of the generator.
    pub fn new(
        mechanism: L,
        dimensions: usize,
        distributions: Vec<FeatureDistribution>,
        name: Option<String>,
    ) -> Result<Self, CausalBenchError> {
        let sampler = FeatureSampler::new(&distributions, dimensions)?;
        mechanism.validate(dimensions)?;
        let name = name.unwrap_or_else(|| "latent_generator".to_string());
        Ok(LatentGenerator {
            mechanism,
            sampler,
            state: GeneratorState::new(&name),
        })
    }

    pub fn mechanism(&self) -> &L {
        &self.mechanism
    }
}

impl<L: LatentMechanism> Generator for LatentGenerator<L> {
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
            let z = self.sampler.sample(rng);
            let treatment = check_treatment(m.treatment(&z, rng), row)?;
            let outcome = ensure_finite(m.outcome(&z, treatment, rng), "outcome", row)?;
            let treated = ensure_finite(m.expected_outcome(&z, 1.0), "expected_outcome", row)?;
            let control = ensure_finite(m.expected_outcome(&z, 0.0), "expected_outcome", row)?;
            let proxies = m.proxy_function(&z, rng);
            check_proxies(&proxies, row)?;
            builder.push(proxies, treatment, outcome, treated - control)?;
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mechanism::{LatentModel, LatentSpec, ProxyGroup, ProxySpec};
    use rand::SeedableRng;

    #[test]
    fn test_gaussian_latent_true_effect() {
        let spec = LatentSpec::new(
            LatentModel::Gaussian { outcome_std: 0.5 },
            ProxySpec::Groups(vec![ProxyGroup::noisy(0, 1, 0.1)]),
        );
        let generator = LatentGenerator::new(
            spec,
            1,
            vec![FeatureDistribution::Uniform { low: -2.0, high: 2.0 }],
            Some("easy".to_string()),
        )
        .unwrap();
        let ds = generator.generate(500, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(ds.rows, 500);
        assert_eq!(ds.proxy_width(), 1);
        // The effect is z0 itself, so the proxy tracks it up to the measurement noise.
        let x = ds.proxy_matrix();
        let max_gap = x
            .get_col(0)
            .iter()
            .zip(ds.true_effect.iter())
            .map(|(p, e)| (p - e).abs())
            .fold(0.0, f64::max);
        assert!(max_gap < 1.0);
        assert!(ds.true_effect.iter().all(|e| (-2.0..2.0).contains(e)));
    }

    #[test]
    fn test_toy_requires_binary_latent() {
        let spec = LatentSpec::new(LatentModel::BinaryToy, ProxySpec::Identity);
        let generator = LatentGenerator::new(
            spec,
            1,
            vec![FeatureDistribution::Uniform { low: 0.0, high: 1.0 }],
            None,
        )
        .unwrap();
        let err = generator.generate(10, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, CausalBenchError::InvalidTreatment { .. }));
    }

    #[test]
    fn test_synthetic_is_reproducible() {
        let spec = LatentSpec::new(LatentModel::Synthetic, ProxySpec::first_features(5));
        let generator = LatentGenerator::new(spec, 6, vec![], None).unwrap();
        let a = generator.generate(50, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = generator.generate(50, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.feature_dimensions, 6);
        assert_eq!(a.proxy_width(), 5);
    }
}
