//! Generator
//!
//! Generators sample datasets from a causal mechanism and keep track of the
//! files they persist. [`ProxyGenerator`] composes a full [`CausalMechanism`],
//! [`LatentGenerator`] draws treatment and outcome directly from the latent
//! vector. Both produce the same [`Dataset`] contract.
//!
//! [`CausalMechanism`]: crate::mechanism::CausalMechanism
use crate::dataset::Dataset;
use crate::errors::CausalBenchError;
use log::info;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub mod latent;
pub mod presets;
pub mod proxy;

pub use latent::LatentGenerator;
pub use presets::GeneratorPreset;
pub use proxy::ProxyGenerator;

/// Which side effects accompany a generation or an experiment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputOptions {
    /// Persist generated datasets and per-generator tables.
    pub save_data: bool,
    /// Persist dataset diagnostics.
    pub save_graphs: bool,
    /// Log dataset diagnostics.
    pub show_graphs: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        OutputOptions {
            save_data: true,
            save_graphs: true,
            show_graphs: false,
        }
    }
}

/// Files written by a generator, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedFiles {
    pub data: Vec<PathBuf>,
    pub diagnostics: Vec<PathBuf>,
}

/// Bookkeeping shared by all generators.
#[derive(Debug, Clone)]
pub struct GeneratorState {
    pub name: String,
    pub directory: PathBuf,
    pub generated_files: GeneratedFiles,
    /// Number of completed `generate_data` calls.
    pub generations: usize,
}

impl GeneratorState {
    pub fn new(name: &str) -> Self {
        GeneratorState {
            name: name.to_string(),
            directory: PathBuf::from(name),
            generated_files: GeneratedFiles::default(),
            generations: 0,
        }
    }
}

/// Result of [`Generator::generate_data`].
#[derive(Debug, Clone)]
pub struct GeneratedData {
    pub dataset: Dataset,
    /// Location of the persisted dataset, when it was saved.
    pub data_file: Option<PathBuf>,
}

pub(crate) fn check_treatment(value: f64, row: usize) -> Result<f64, CausalBenchError> {
    if value == 0.0 || value == 1.0 {
        Ok(value)
    } else {
        Err(CausalBenchError::InvalidTreatment { row, value })
    }
}

pub(crate) fn check_sample_size(sample_size: usize) -> Result<(), CausalBenchError> {
    if sample_size == 0 {
        Err(CausalBenchError::InvalidParameter(
            "sample_size".to_string(),
            "at least one sample".to_string(),
            "0".to_string(),
        ))
    } else {
        Ok(())
    }
}

pub(crate) fn check_proxies(proxies: &[Vec<f64>], row: usize) -> Result<(), CausalBenchError> {
    match proxies.iter().flatten().find(|v| !v.is_finite()) {
        Some(&value) => Err(CausalBenchError::NonFiniteValue {
            function: "proxy_function".to_string(),
            row,
            value,
        }),
        None => Ok(()),
    }
}

/// A source of synthetic datasets with known treatment effects.
pub trait Generator {
    fn state(&self) -> &GeneratorState;
    fn state_mut(&mut self) -> &mut GeneratorState;

    /// Number of raw features drawn per row.
    fn dimensions(&self) -> usize;

    /// Sample `sample_size` independent rows.
    fn generate(&self, sample_size: usize, rng: &mut StdRng) -> Result<Dataset, CausalBenchError>;

    fn name(&self) -> &str {
        &self.state().name
    }

    fn directory(&self) -> &Path {
        &self.state().directory
    }

    fn set_directory(&mut self, directory: PathBuf) {
        self.state_mut().directory = directory;
    }

    fn generated_files(&self) -> &GeneratedFiles {
        &self.state().generated_files
    }

    /// Generate a fresh dataset and persist it according to `options`.
    fn generate_data(
        &mut self,
        sample_size: usize,
        options: &OutputOptions,
        rng: &mut StdRng,
    ) -> Result<GeneratedData, CausalBenchError> {
        let dataset = self.generate(sample_size, rng)?;
        let generation = self.state().generations;
        let directory = self.directory().to_path_buf();
        if options.save_data || options.save_graphs {
            fs::create_dir_all(&directory).map_err(|e| CausalBenchError::UnableToWrite(e.to_string()))?;
        }

        let mut data_file = None;
        if options.save_data {
            let path = directory.join(format!("data_{}.csv", generation));
            dataset.to_csv(&path)?;
            self.state_mut().generated_files.data.push(path.clone());
            data_file = Some(path);
        }
        if options.save_graphs || options.show_graphs {
            let summary = dataset.summary();
            if options.show_graphs {
                info!("Generator {} produced {:?}", self.name(), summary);
            }
            if options.save_graphs {
                let path = directory.join(format!("diagnostics_{}.json", generation));
                let json =
                    serde_json::to_string_pretty(&summary).map_err(|e| CausalBenchError::UnableToWrite(e.to_string()))?;
                fs::write(&path, json).map_err(|e| CausalBenchError::UnableToWrite(e.to_string()))?;
                self.state_mut().generated_files.diagnostics.push(path);
            }
        }
        self.state_mut().generations += 1;
        Ok(GeneratedData { dataset, data_file })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::FeatureDistribution;
    use crate::mechanism::MechanismSpec;
    use rand::SeedableRng;
    use tempfile::tempdir;

    #[test]
    fn test_check_treatment() {
        assert_eq!(check_treatment(1.0, 0).unwrap(), 1.0);
        assert!(matches!(
            check_treatment(0.5, 7),
            Err(CausalBenchError::InvalidTreatment { row: 7, .. })
        ));
    }

    #[test]
    fn test_generate_data_bookkeeping() {
        let dir = tempdir().unwrap();
        let mut generator = ProxyGenerator::new(
            MechanismSpec::default(),
            3,
            vec![FeatureDistribution::default()],
            Some("defaults".to_string()),
        )
        .unwrap();
        generator.set_directory(dir.path().join("defaults"));
        let mut rng = StdRng::seed_from_u64(0);
        let options = OutputOptions::default();

        let first = generator.generate_data(20, &options, &mut rng).unwrap();
        let second = generator.generate_data(30, &options, &mut rng).unwrap();
        assert_eq!(first.dataset.rows, 20);
        assert_eq!(second.dataset.rows, 30);
        assert_eq!(generator.generated_files().data.len(), 2);
        assert_eq!(generator.generated_files().diagnostics.len(), 2);
        let last = generator.generated_files().data.last().unwrap();
        assert_eq!(Some(last), second.data_file.as_ref());
        let reloaded = Dataset::from_csv(last).unwrap();
        assert_eq!(reloaded.rows, 30);
        assert_eq!(reloaded.true_effect, second.dataset.true_effect);
    }

    #[test]
    fn test_generate_data_without_saving() {
        let dir = tempdir().unwrap();
        let mut generator = ProxyGenerator::new(MechanismSpec::default(), 2, vec![], None).unwrap();
        generator.set_directory(dir.path().join("unsaved"));
        let options = OutputOptions {
            save_data: false,
            save_graphs: false,
            show_graphs: true,
        };
        let data = generator
            .generate_data(10, &options, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert!(data.data_file.is_none());
        assert!(generator.generated_files().data.is_empty());
        assert!(!dir.path().join("unsaved").exists());
    }
}
