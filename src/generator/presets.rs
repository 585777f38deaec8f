//! Presets
//!
//! Ready-made generators covering the usual benchmarking scenarios: no effect,
//! pure effect, rare effects, sharply localized effects, and proxies with
//! replicated or noisy measurements of the confounders.
use super::{Generator, LatentGenerator, ProxyGenerator};
use crate::distribution::FeatureDistribution;
use crate::errors::CausalBenchError;
use crate::mechanism::{
    Assignment, CateSpec, LatentModel, LatentSpec, MainEffect, MechanismSpec, NoiseSpec, OutcomeSpec, Propensity,
    ProxyComponent, ProxyGroup, ProxySpec, TreatmentEffect,
};
use serde::{Deserialize, Serialize};

const CENTER: [f64; 2] = [0.5, 0.5];

fn radial_propensity() -> Propensity {
    Propensity::RadialDecay {
        features: [0, 1],
        center: CENTER,
    }
}

fn small_noise() -> NoiseSpec {
    NoiseSpec::Gaussian { std: 0.01 }
}

fn five_exact_proxies() -> ProxySpec {
    ProxySpec::first_features(5)
}

fn build(spec: MechanismSpec, dimensions: usize, name: &str) -> Result<ProxyGenerator<MechanismSpec>, CausalBenchError> {
    ProxyGenerator::new(spec, dimensions, vec![], Some(name.to_string()))
}

/// Default mechanism: main effect, heterogeneous effect and confounded assignment.
pub fn all_effects(dimensions: usize) -> Result<ProxyGenerator<MechanismSpec>, CausalBenchError> {
    build(MechanismSpec::default(), dimensions, "all_effects")
}

/// The treatment does nothing, `cate = 0`.
pub fn no_treatment_effect(dimensions: usize) -> Result<ProxyGenerator<MechanismSpec>, CausalBenchError> {
    let spec = MechanismSpec::default()
        .set_treatment_effect(TreatmentEffect::Zero)
        .set_cate(CateSpec::Constant { value: 0.0 });
    build(spec, dimensions, "no_treatment_effect")
}

/// No main effect and randomized assignment, only the treatment moves the outcome.
pub fn only_treatment_effect(dimensions: usize) -> Result<ProxyGenerator<MechanismSpec>, CausalBenchError> {
    let spec = MechanismSpec::default()
        .set_main_effect(MainEffect::Zero)
        .set_propensity(Propensity::Constant { p: 0.5 });
    build(spec, dimensions, "only_treatment_effect")
}

/// A rare, feature independent effect: `y = 2 t e + noise` with `e ~ Bernoulli(0.05)`.
pub fn biased(dimensions: usize) -> Result<ProxyGenerator<MechanismSpec>, CausalBenchError> {
    let spec = MechanismSpec {
        main_effect: MainEffect::Zero,
        treatment_effect: TreatmentEffect::RareSpike {
            probability: 0.05,
            magnitude: 1.0,
        },
        propensity: Propensity::Constant { p: 0.5 },
        noise: small_noise(),
        assignment: Assignment::Bernoulli,
        outcome: OutcomeSpec::Scaled { factor: 2.0 },
        // E[Y1 - Y0 | X] = 2 * 0.05 = 0.1
        cate: CateSpec::Constant { value: 0.1 },
        proxy: ProxySpec::Identity,
    };
    build(spec, dimensions, "biased_generator")
}

/// A sharp spike of effect around `(0.5, 0.5)` with a binary outcome.
///
/// The logits carry no noise, so the ground truth `sigmoid(main + effect) - sigmoid(main)`
/// is the exact expected outcome difference.
pub fn spiked(dimensions: usize) -> Result<ProxyGenerator<MechanismSpec>, CausalBenchError> {
    let spec = MechanismSpec::default()
        .set_treatment_effect(TreatmentEffect::GaussianSpike {
            features: [0, 1],
            mean: CENTER,
            variance: 0.01,
            scale: 1.0,
        })
        .set_propensity(radial_propensity())
        .set_noise(NoiseSpec::None)
        .set_outcome(OutcomeSpec::BernoulliLogit)
        .set_cate(CateSpec::LogitDifference)
        .set_proxy(five_exact_proxies());
    build(spec, dimensions, "spiked_generator")
}

/// Constant effect of 0.3 under confounded assignment.
pub fn constant_treatment_effect(dimensions: usize) -> Result<ProxyGenerator<MechanismSpec>, CausalBenchError> {
    let spec = MechanismSpec::default()
        .set_treatment_effect(TreatmentEffect::Constant { value: 0.3 })
        .set_propensity(radial_propensity())
        .set_noise(small_noise())
        .set_outcome(OutcomeSpec::Additive)
        .set_proxy(five_exact_proxies());
    build(spec, dimensions, "constant_treatment_effect")
}

/// Spiked effect around `(0.2, 0.6)` observed through triplicated proxies of `x0` and `x1`.
pub fn constant_proxied_treatment_effect(
    dimensions: usize,
) -> Result<ProxyGenerator<MechanismSpec>, CausalBenchError> {
    let spec = MechanismSpec::default()
        .set_treatment_effect(TreatmentEffect::GaussianSpike {
            features: [0, 1],
            mean: [0.2, 0.6],
            variance: 0.01,
            scale: 0.1,
        })
        .set_propensity(radial_propensity())
        .set_noise(small_noise())
        .set_outcome(OutcomeSpec::Additive)
        .set_proxy(ProxySpec::Groups(vec![
            ProxyGroup::replicated(0, 3),
            ProxyGroup::replicated(1, 3),
            ProxyGroup::exact(2),
            ProxyGroup::exact(3),
            ProxyGroup::exact(4),
        ]));
    build(spec, dimensions, "constant_proxied_treatment_effect")
}

/// Effect `x0^2` with `x0` observed three times.
pub fn spiked_proxy(dimensions: usize) -> Result<ProxyGenerator<MechanismSpec>, CausalBenchError> {
    let spec = MechanismSpec::default()
        .set_treatment_effect(TreatmentEffect::SumOfSquares { features: vec![0] })
        .set_propensity(radial_propensity())
        .set_noise(small_noise())
        .set_outcome(OutcomeSpec::Additive)
        .set_proxy(ProxySpec::Groups(vec![
            ProxyGroup::replicated(0, 3),
            ProxyGroup::exact(1),
            ProxyGroup::exact(2),
            ProxyGroup::exact(3),
            ProxyGroup::exact(4),
        ]));
    build(spec, dimensions, "spiked_proxy_generator")
}

/// Effect `x0^2 + x1^2` with `x0` and `x1` only observed through noisy measurements.
pub fn noisy_spiked_proxy(dimensions: usize) -> Result<ProxyGenerator<MechanismSpec>, CausalBenchError> {
    let spec = MechanismSpec::default()
        .set_treatment_effect(TreatmentEffect::SumOfSquares { features: vec![0, 1] })
        .set_propensity(radial_propensity())
        .set_noise(small_noise())
        .set_outcome(OutcomeSpec::Additive)
        .set_proxy(ProxySpec::Groups(vec![
            ProxyGroup::noisy(0, 3, 0.3),
            ProxyGroup::noisy(1, 3, 0.25),
            ProxyGroup::exact(2),
            ProxyGroup::exact(3),
            ProxyGroup::exact(4),
        ]));
    build(spec, dimensions, "noisy_spiked_proxy_generator")
}

/// Sinusoidal latent process over five uniform latents.
pub fn synthetic(dimensions: usize) -> Result<LatentGenerator<LatentSpec>, CausalBenchError> {
    LatentGenerator::new(
        LatentSpec::new(LatentModel::Synthetic, five_exact_proxies()),
        dimensions,
        vec![FeatureDistribution::Uniform { low: 0.0, high: 1.0 }],
        Some("synthetic_generator".to_string()),
    )
}

/// Gaussian outcome with effect `z0`, `z0` only observed with `proxy_noise_weight` noise.
pub fn easy(dimensions: usize, proxy_noise_weight: f64) -> Result<LatentGenerator<LatentSpec>, CausalBenchError> {
    LatentGenerator::new(
        LatentSpec::new(
            LatentModel::Gaussian { outcome_std: 0.5 },
            ProxySpec::Groups(vec![ProxyGroup::noisy(0, 1, proxy_noise_weight)]),
        ),
        dimensions,
        vec![FeatureDistribution::Uniform { low: -2.0, high: 2.0 }],
        Some("easy_generator".to_string()),
    )
}

/// Binary latent confounder which is also the treatment, observed through a
/// proxy whose noise depends on the latent: `N(z0, 5 z0 + 3 (1 - z0))`.
pub fn toy(dimensions: usize) -> Result<LatentGenerator<LatentSpec>, CausalBenchError> {
    LatentGenerator::new(
        LatentSpec::new(
            LatentModel::BinaryToy,
            ProxySpec::Groups(vec![ProxyGroup {
                feature: 0,
                components: vec![ProxyComponent::Heteroscedastic {
                    base_std: 3.0,
                    slope: 2.0,
                }],
            }]),
        ),
        dimensions,
        vec![FeatureDistribution::Bernoulli { p: 0.5 }],
        Some("cevae_toy_generator".to_string()),
    )
}

/// Serializable name of a preset generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeneratorPreset {
    AllEffects,
    NoTreatmentEffect,
    OnlyTreatmentEffect,
    Biased,
    Spiked,
    ConstantTreatmentEffect,
    ConstantProxiedTreatmentEffect,
    SpikedProxy,
    NoisySpikedProxy,
    Synthetic,
    Easy { proxy_noise_weight: f64 },
    Toy,
}

impl GeneratorPreset {
    /// Build the preset for `dimensions` features.
    pub fn build(&self, dimensions: usize) -> Result<Box<dyn Generator>, CausalBenchError> {
        let generator: Box<dyn Generator> = match *self {
            GeneratorPreset::AllEffects => Box::new(all_effects(dimensions)?),
            GeneratorPreset::NoTreatmentEffect => Box::new(no_treatment_effect(dimensions)?),
            GeneratorPreset::OnlyTreatmentEffect => Box::new(only_treatment_effect(dimensions)?),
            GeneratorPreset::Biased => Box::new(biased(dimensions)?),
            GeneratorPreset::Spiked => Box::new(spiked(dimensions)?),
            GeneratorPreset::ConstantTreatmentEffect => Box::new(constant_treatment_effect(dimensions)?),
            GeneratorPreset::ConstantProxiedTreatmentEffect => Box::new(constant_proxied_treatment_effect(dimensions)?),
            GeneratorPreset::SpikedProxy => Box::new(spiked_proxy(dimensions)?),
            GeneratorPreset::NoisySpikedProxy => Box::new(noisy_spiked_proxy(dimensions)?),
            GeneratorPreset::Synthetic => Box::new(synthetic(dimensions)?),
            GeneratorPreset::Easy { proxy_noise_weight } => Box::new(easy(dimensions, proxy_noise_weight)?),
            GeneratorPreset::Toy => Box::new(toy(dimensions)?),
        };
        Ok(generator)
    }
}
