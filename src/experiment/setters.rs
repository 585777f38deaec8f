use crate::distribution::FeatureDistribution;
use crate::errors::CausalBenchError;
use crate::experiment::core::Experiment;
use crate::generator::presets;
use crate::generator::{check_sample_size, Generator, GeneratorPreset, LatentGenerator, ProxyGenerator};
use crate::mechanism::{CausalMechanism, LatentMechanism};
use crate::metric::{Metric, MetricName, Scorer};
use crate::model::{CausalModel, DifferenceInMeans, SLearner, TLearner};

impl Experiment {
    // Generators

    /// Add a generator.
    /// * `generator` - Generator to be added.
    /// * `sample_size` - Number of samples it generates per run.
    pub fn add_custom_generator(mut self, generator: Box<dyn Generator>, sample_size: usize) -> Result<Self, CausalBenchError> {
        check_sample_size(sample_size)?;
        self.generators.push((generator, sample_size));
        Ok(self)
    }

    /// Add a generator composed from a causal mechanism.
    /// * `mechanism` - Mechanism the rows are drawn from.
    /// * `dimensions` - Number of raw features.
    /// * `distributions` - Per-dimension feature distributions, the last one is reused.
    /// * `sample_size` - Number of samples per run.
    /// * `name` - Name of the generator.
    pub fn add_custom_generated_data<M: CausalMechanism + 'static>(
        self,
        mechanism: M,
        dimensions: usize,
        distributions: Vec<FeatureDistribution>,
        sample_size: usize,
        name: Option<String>,
    ) -> Result<Self, CausalBenchError> {
        let generator = ProxyGenerator::new(mechanism, dimensions, distributions, name)?;
        self.add_custom_generator(Box::new(generator), sample_size)
    }

    /// Add a generator over a latent mechanism.
    pub fn add_latent_generated_data<L: LatentMechanism + 'static>(
        self,
        mechanism: L,
        dimensions: usize,
        distributions: Vec<FeatureDistribution>,
        sample_size: usize,
        name: Option<String>,
    ) -> Result<Self, CausalBenchError> {
        let generator = LatentGenerator::new(mechanism, dimensions, distributions, name)?;
        self.add_custom_generator(Box::new(generator), sample_size)
    }

    pub fn add_preset_generator(
        self,
        preset: &GeneratorPreset,
        dimensions: usize,
        sample_size: usize,
    ) -> Result<Self, CausalBenchError> {
        let generator = preset.build(dimensions)?;
        self.add_custom_generator(generator, sample_size)
    }

    pub fn add_all_effects_generator(self, dimensions: usize, sample_size: usize) -> Result<Self, CausalBenchError> {
        self.add_custom_generator(Box::new(presets::all_effects(dimensions)?), sample_size)
    }

    pub fn add_no_treatment_effect_generator(
        self,
        dimensions: usize,
        sample_size: usize,
    ) -> Result<Self, CausalBenchError> {
        self.add_custom_generator(Box::new(presets::no_treatment_effect(dimensions)?), sample_size)
    }

    pub fn add_only_treatment_effect_generator(
        self,
        dimensions: usize,
        sample_size: usize,
    ) -> Result<Self, CausalBenchError> {
        self.add_custom_generator(Box::new(presets::only_treatment_effect(dimensions)?), sample_size)
    }

    pub fn add_biased_generator(self, dimensions: usize, sample_size: usize) -> Result<Self, CausalBenchError> {
        self.add_custom_generator(Box::new(presets::biased(dimensions)?), sample_size)
    }

    /// Requires at least five dimensions.
    pub fn add_spiked_generator(self, dimensions: usize, sample_size: usize) -> Result<Self, CausalBenchError> {
        self.add_custom_generator(Box::new(presets::spiked(dimensions)?), sample_size)
    }

    /// Requires at least five dimensions.
    pub fn add_constant_treatment_effect_generator(
        self,
        dimensions: usize,
        sample_size: usize,
    ) -> Result<Self, CausalBenchError> {
        self.add_custom_generator(Box::new(presets::constant_treatment_effect(dimensions)?), sample_size)
    }

    /// Requires at least five dimensions.
    pub fn add_constant_proxied_treatment_effect_generator(
        self,
        dimensions: usize,
        sample_size: usize,
    ) -> Result<Self, CausalBenchError> {
        self.add_custom_generator(
            Box::new(presets::constant_proxied_treatment_effect(dimensions)?),
            sample_size,
        )
    }

    /// Requires at least five dimensions.
    pub fn add_spiked_proxy_generator(self, dimensions: usize, sample_size: usize) -> Result<Self, CausalBenchError> {
        self.add_custom_generator(Box::new(presets::spiked_proxy(dimensions)?), sample_size)
    }

    /// Requires at least five dimensions.
    pub fn add_noisy_spiked_proxy_generator(
        self,
        dimensions: usize,
        sample_size: usize,
    ) -> Result<Self, CausalBenchError> {
        self.add_custom_generator(Box::new(presets::noisy_spiked_proxy(dimensions)?), sample_size)
    }

    /// Requires at least five dimensions.
    pub fn add_synthetic_generator(self, dimensions: usize, sample_size: usize) -> Result<Self, CausalBenchError> {
        self.add_custom_generator(Box::new(presets::synthetic(dimensions)?), sample_size)
    }

    /// * `proxy_noise_weight` - Standard deviation of the noise on the single observed proxy.
    pub fn add_easy_generator(
        self,
        dimensions: usize,
        sample_size: usize,
        proxy_noise_weight: f64,
    ) -> Result<Self, CausalBenchError> {
        self.add_custom_generator(Box::new(presets::easy(dimensions, proxy_noise_weight)?), sample_size)
    }

    pub fn add_toy_generator(self, dimensions: usize, sample_size: usize) -> Result<Self, CausalBenchError> {
        self.add_custom_generator(Box::new(presets::toy(dimensions)?), sample_size)
    }

    // Models

    /// Add a model. Display names must be unique within the experiment.
    pub fn add_custom_model<M: CausalModel + 'static>(mut self, model: M) -> Result<Self, CausalBenchError> {
        if self.models.iter().any(|m| m.name() == model.name()) {
            return Err(CausalBenchError::DuplicateModel(model.name().to_string()));
        }
        self.models.push(Box::new(model));
        Ok(self)
    }

    pub fn add_difference_in_means(self) -> Result<Self, CausalBenchError> {
        let id = self.models.len();
        self.add_custom_model(DifferenceInMeans::new(id))
    }

    /// * `alpha` - Ridge penalty of the outcome model.
    pub fn add_s_learner(self, alpha: f64) -> Result<Self, CausalBenchError> {
        let id = self.models.len();
        self.add_custom_model(SLearner::new(alpha, id)?)
    }

    /// * `alpha` - Ridge penalty of both arm models.
    pub fn add_t_learner(self, alpha: f64) -> Result<Self, CausalBenchError> {
        let id = self.models.len();
        self.add_custom_model(TLearner::new(alpha, id)?)
    }

    // Metrics

    /// Add a metric, replacing any metric registered under the same name.
    /// * `name` - Column name of the metric.
    /// * `scoring_function` - Maps (true effects, predicted effects) to a score.
    pub fn add_custom_metric<F>(mut self, name: &str, scoring_function: F) -> Result<Self, CausalBenchError>
    where
        F: Fn(&[f64], &[f64]) -> f64 + 'static,
    {
        let name = MetricName::new(name)?;
        self.metrics.insert(name, Scorer::Custom(Box::new(scoring_function)));
        Ok(self)
    }

    pub fn add_metric(mut self, metric: Metric) -> Self {
        self.metrics.insert_builtin(metric);
        self
    }

    pub fn add_true_ate(self) -> Self {
        self.add_metric(Metric::TrueAte)
    }

    pub fn add_estimated_ate(self) -> Self {
        self.add_metric(Metric::EstimatedAte)
    }

    pub fn add_ate_error(self) -> Self {
        self.add_metric(Metric::AteError)
    }

    pub fn add_ate_percent_error(self) -> Self {
        self.add_metric(Metric::AtePercentError)
    }

    pub fn add_pehe_mse(self) -> Self {
        self.add_metric(Metric::PeheMse)
    }

    pub fn add_pehe_mae(self) -> Self {
        self.add_metric(Metric::PeheMae)
    }

    /// Add the six built-in metrics: eATE, eATE (%), True ATE, Est. ATE, PEHE (MSE), PEHE (MAE).
    pub fn add_all_metrics(self) -> Self {
        Metric::all().into_iter().fold(self, |experiment, metric| experiment.add_metric(metric))
    }
}
