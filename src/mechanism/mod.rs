//! Mechanism
//!
//! Causal data-generating processes. A mechanism composes the fixed causal
//! graph `features -> treatment -> outcome`, with an optional measurement layer
//! turning features into the proxies that models observe.
//!
//! [`CausalMechanism`] is the seam for custom processes; [`MechanismSpec`] is the
//! serializable, parametric implementation used by the preset generators.
//! [`LatentMechanism`] covers the simpler shape where treatment and outcome are
//! direct functions of the latent vector.
use crate::errors::CausalBenchError;
use crate::utils::sigmoid;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

pub mod components;
pub mod latent;
pub mod proxy;

pub use components::{Assignment, CateSpec, MainEffect, NoiseSpec, OutcomeSpec, Propensity, TreatmentEffect};
pub use latent::{LatentMechanism, LatentModel, LatentSpec};
pub use proxy::{ProxyComponent, ProxyGroup, ProxySpec};

/// A causal data-generating process with an analytic treatment effect.
///
/// Implementations must keep `cate(x)` equal to the expectation of
/// `outcome(t = 1) - outcome(t = 0)` given `x` under their own functions. This is
/// not checked at runtime. Stochastic functions must draw only from `rng`, so that
/// a seeded experiment reproduces its datasets.
pub trait CausalMechanism {
    fn main_effect(&self, x: &[f64]) -> f64;
    fn treatment_effect(&self, x: &[f64], rng: &mut StdRng) -> f64;
    fn treatment_propensity(&self, x: &[f64]) -> f64;
    fn noise(&self, rng: &mut StdRng) -> f64;
    fn cate(&self, x: &[f64]) -> f64;
    /// Must return 0 or 1.
    fn treatment_function(&self, propensity: f64, noise: f64, rng: &mut StdRng) -> f64;
    fn outcome_function(
        &self,
        main: f64,
        treatment: f64,
        treatment_effect: f64,
        noise: f64,
        rng: &mut StdRng,
    ) -> f64;

    /// Observed covariates, one group per proxied feature. Defaults to the identity.
    fn proxy_function(&self, features: &[f64], _rng: &mut StdRng) -> Vec<Vec<f64>> {
        features.iter().map(|f| vec![*f]).collect()
    }

    /// Check the mechanism against the generator's dimensionality.
    fn validate(&self, _dimensions: usize) -> Result<(), CausalBenchError> {
        Ok(())
    }
}

/// Parametric mechanism, every function given as a tagged variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanismSpec {
    pub main_effect: MainEffect,
    pub treatment_effect: TreatmentEffect,
    pub propensity: Propensity,
    pub noise: NoiseSpec,
    pub assignment: Assignment,
    pub outcome: OutcomeSpec,
    pub cate: CateSpec,
    #[serde(default)]
    pub proxy: ProxySpec,
}

impl Default for MechanismSpec {
    /// Main effect `2 x0 - 1`, a sigmoid product effect on `x0` and `x1`, a
    /// Beta(2, 4) shaped propensity on `x0`, small Gaussian noise, a centered
    /// outcome, and `cate = effect`.
    fn default() -> Self {
        MechanismSpec {
            main_effect: MainEffect::Linear {
                feature: 0,
                slope: 2.0,
                intercept: -1.0,
            },
            treatment_effect: TreatmentEffect::SigmoidProduct {
                features: [0, 1],
                steepness: 20.0,
                threshold: 1.0 / 3.0,
            },
            propensity: Propensity::BetaDensity {
                feature: 0,
                alpha: 2.0,
                beta: 4.0,
            },
            noise: NoiseSpec::Gaussian { std: 0.05 },
            assignment: Assignment::Bernoulli,
            // E[Y1 - Y0 | X] = 0.5 * effect + 0.5 * effect = effect
            outcome: OutcomeSpec::Centered,
            cate: CateSpec::TreatmentEffect,
            proxy: ProxySpec::Identity,
        }
    }
}

impl MechanismSpec {
    pub fn set_main_effect(mut self, main_effect: MainEffect) -> Self {
        self.main_effect = main_effect;
        self
    }

    pub fn set_treatment_effect(mut self, treatment_effect: TreatmentEffect) -> Self {
        self.treatment_effect = treatment_effect;
        self
    }

    pub fn set_propensity(mut self, propensity: Propensity) -> Self {
        self.propensity = propensity;
        self
    }

    pub fn set_noise(mut self, noise: NoiseSpec) -> Self {
        self.noise = noise;
        self
    }

    pub fn set_assignment(mut self, assignment: Assignment) -> Self {
        self.assignment = assignment;
        self
    }

    pub fn set_outcome(mut self, outcome: OutcomeSpec) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn set_cate(mut self, cate: CateSpec) -> Self {
        self.cate = cate;
        self
    }

    pub fn set_proxy(mut self, proxy: ProxySpec) -> Self {
        self.proxy = proxy;
        self
    }
}

impl CausalMechanism for MechanismSpec {
    fn main_effect(&self, x: &[f64]) -> f64 {
        self.main_effect.evaluate(x)
    }

    fn treatment_effect(&self, x: &[f64], rng: &mut StdRng) -> f64 {
        self.treatment_effect.sample(x, rng)
    }

    fn treatment_propensity(&self, x: &[f64]) -> f64 {
        self.propensity.evaluate(x)
    }

    fn noise(&self, rng: &mut StdRng) -> f64 {
        self.noise.sample(rng)
    }

    fn cate(&self, x: &[f64]) -> f64 {
        match self.cate {
            CateSpec::TreatmentEffect => self.treatment_effect.expected(x),
            CateSpec::Constant { value } => value,
            CateSpec::LogitDifference => {
                let main = self.main_effect.evaluate(x);
                sigmoid(main + self.treatment_effect.expected(x)) - sigmoid(main)
            }
        }
    }

    fn treatment_function(&self, propensity: f64, noise: f64, rng: &mut StdRng) -> f64 {
        self.assignment.assign(propensity, noise, rng)
    }

    fn outcome_function(
        &self,
        main: f64,
        treatment: f64,
        treatment_effect: f64,
        noise: f64,
        rng: &mut StdRng,
    ) -> f64 {
        self.outcome.evaluate(main, treatment, treatment_effect, noise, rng)
    }

    fn proxy_function(&self, features: &[f64], rng: &mut StdRng) -> Vec<Vec<f64>> {
        self.proxy.apply(features, rng)
    }

    fn validate(&self, dimensions: usize) -> Result<(), CausalBenchError> {
        self.main_effect.validate(dimensions)?;
        self.treatment_effect.validate(dimensions)?;
        self.propensity.validate(dimensions)?;
        self.noise.validate()?;
        self.assignment.validate()?;
        self.outcome.validate()?;
        self.cate.validate()?;
        self.proxy.validate(dimensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_default_cate_matches_effect() {
        let spec = MechanismSpec::default();
        let x = [0.6, 0.2, 0.9];
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(spec.cate(&x), spec.treatment_effect(&x, &mut rng));
        assert!(spec.validate(2).is_ok());
        assert!(spec.validate(1).is_err());
    }

    #[test]
    fn test_centered_outcome_difference_is_effect() {
        let spec = MechanismSpec::default().set_noise(NoiseSpec::None);
        let x = [0.4, 0.7];
        let mut rng = StdRng::seed_from_u64(0);
        let main = spec.main_effect(&x);
        let effect = spec.treatment_effect(&x, &mut rng);
        let y1 = spec.outcome_function(main, 1.0, effect, 0.0, &mut rng);
        let y0 = spec.outcome_function(main, 0.0, effect, 0.0, &mut rng);
        assert!((y1 - y0 - spec.cate(&x)).abs() < 1e-12);
    }

    #[test]
    fn test_logit_difference_cate() {
        let spec = MechanismSpec::default()
            .set_main_effect(MainEffect::Zero)
            .set_treatment_effect(TreatmentEffect::Constant { value: 1.0 })
            .set_outcome(OutcomeSpec::BernoulliLogit)
            .set_cate(CateSpec::LogitDifference);
        assert!((spec.cate(&[0.0, 0.0]) - (sigmoid(1.0) - 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_serde_round_trip() {
        let spec = MechanismSpec::default().set_proxy(ProxySpec::Groups(vec![ProxyGroup::noisy(1, 3, 0.25)]));
        let json = serde_json::to_string(&spec).unwrap();
        let spec2: MechanismSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec, spec2);
    }
}
