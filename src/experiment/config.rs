//! Experiment Configuration
//!
//! A serializable description of a whole experiment: seed, output flags,
//! generators, models and metrics.
use crate::constants::{DEFAULT_EXPERIMENT_ROOT, DEFAULT_RIDGE_ALPHA, DEFAULT_SAMPLE_SIZE};
use crate::distribution::FeatureDistribution;
use crate::errors::CausalBenchError;
use crate::experiment::core::Experiment;
use crate::generator::{GeneratorPreset, LatentGenerator, ProxyGenerator};
use crate::mechanism::{LatentSpec, MechanismSpec};
use crate::metric::Metric;
use log::warn;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

fn default_true() -> bool {
    true
}
fn default_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}
fn default_alpha() -> f64 {
    DEFAULT_RIDGE_ALPHA
}
fn default_root() -> PathBuf {
    PathBuf::from(DEFAULT_EXPERIMENT_ROOT)
}

/// What a configured generator is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeneratorKind {
    Preset(GeneratorPreset),
    Mechanism(MechanismSpec),
    Latent(LatentSpec),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub kind: GeneratorKind,
    pub dimensions: usize,
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    /// Ignored by presets, which fix their own distributions.
    #[serde(default)]
    pub distributions: Vec<FeatureDistribution>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A reference model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelSpec {
    DifferenceInMeans,
    SLearner {
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    TLearner {
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_true")]
    pub save_data: bool,
    #[serde(default = "default_true")]
    pub save_graphs: bool,
    #[serde(default)]
    pub show_graphs: bool,
    #[serde(default)]
    pub generators: Vec<GeneratorConfig>,
    #[serde(default)]
    pub models: Vec<ModelSpec>,
    /// Metric identifiers or column labels, all built-in metrics when empty.
    #[serde(default)]
    pub metrics: Vec<String>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig {
            seed: None,
            name: None,
            root: default_root(),
            save_data: true,
            save_graphs: true,
            show_graphs: false,
            generators: Vec::new(),
            models: Vec::new(),
            metrics: Vec::new(),
        }
    }
}

impl ExperimentConfig {
    /// Resolve the configured metric names.
    pub fn parse_metrics(&self) -> Result<Vec<Metric>, CausalBenchError> {
        if self.metrics.is_empty() {
            return Ok(Metric::all().to_vec());
        }
        self.metrics.iter().map(|m| Metric::from_str(m)).collect()
    }
}

pub trait ConfigIO: Serialize + DeserializeOwned + Sized {
    /// Save the configuration as a json object to a file.
    ///
    /// * `path` - Path to save the configuration.
    fn save_config<P: AsRef<Path>>(&self, path: P) -> Result<(), CausalBenchError> {
        fs::write(path, self.json_dump()?).map_err(|e| CausalBenchError::UnableToWrite(e.to_string()))
    }

    fn json_dump(&self) -> Result<String, CausalBenchError> {
        serde_json::to_string_pretty(self).map_err(|e| CausalBenchError::UnableToWrite(e.to_string()))
    }

    fn from_json(json_str: &str) -> Result<Self, CausalBenchError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| CausalBenchError::UnableToRead(e.to_string()))
    }

    /// Load a configuration from a json file.
    fn load_config<P: AsRef<Path>>(path: P) -> Result<Self, CausalBenchError> {
        let json_str = fs::read_to_string(path).map_err(|e| CausalBenchError::UnableToRead(e.to_string()))?;
        Self::from_json(&json_str)
    }
}

impl ConfigIO for ExperimentConfig {}

impl Experiment {
    /// Build an experiment from a configuration, without running it.
    pub fn from_config(config: &ExperimentConfig) -> Result<Self, CausalBenchError> {
        let metrics = config.parse_metrics()?;
        let mut experiment = Experiment::with_root(config.seed, config.name.clone(), &config.root)?;

        for g in config.generators.iter() {
            experiment = match &g.kind {
                GeneratorKind::Preset(preset) => {
                    if !g.distributions.is_empty() {
                        warn!("Preset {:?} ignores the configured distributions.", preset);
                    }
                    let mut generator = preset.build(g.dimensions)?;
                    if let Some(name) = &g.name {
                        generator.state_mut().name = name.clone();
                    }
                    experiment.add_custom_generator(generator, g.sample_size)?
                }
                GeneratorKind::Mechanism(spec) => {
                    let generator = ProxyGenerator::new(spec.clone(), g.dimensions, g.distributions.clone(), g.name.clone())?;
                    experiment.add_custom_generator(Box::new(generator), g.sample_size)?
                }
                GeneratorKind::Latent(spec) => {
                    let generator =
                        LatentGenerator::new(spec.clone(), g.dimensions, g.distributions.clone(), g.name.clone())?;
                    experiment.add_custom_generator(Box::new(generator), g.sample_size)?
                }
            };
        }

        for model in config.models.iter() {
            experiment = match *model {
                ModelSpec::DifferenceInMeans => experiment.add_difference_in_means()?,
                ModelSpec::SLearner { alpha } => experiment.add_s_learner(alpha)?,
                ModelSpec::TLearner { alpha } => experiment.add_t_learner(alpha)?,
            };
        }

        Ok(metrics.into_iter().fold(experiment, |e, m| e.add_metric(m)))
    }

    /// Build an experiment from `config` and run it with the configured output flags.
    pub fn run_configured(config: &ExperimentConfig) -> Result<Self, CausalBenchError> {
        let mut experiment = Experiment::from_config(config)?;
        experiment.run(config.save_data, config.save_graphs, config.show_graphs)?;
        Ok(experiment)
    }
}
