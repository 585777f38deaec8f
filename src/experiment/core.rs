//! Experiment Core
//!
//! The experiment aggregate and its run loop: per generator generate, fit every
//! model on the proxies, score every metric against the true effect, and
//! average the scores across generators into one table.
use crate::constants::{DEFAULT_EXPERIMENT_ROOT, FINAL_TABLE_NAME, SPECIFIC_TABLE_PREFIX, TIMESTAMP_FORMAT};
use crate::data::Matrix;
use crate::dataset::Dataset;
use crate::errors::CausalBenchError;
use crate::generator::{Generator, OutputOptions};
use crate::metric::{Metric, MetricRegistry};
use crate::model::{estimate_checked, CausalModel};
use crate::table::{save_table, ResultTable};
use crate::utils::fmt_vec_output;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static INSTANCES: AtomicU64 = AtomicU64::new(0);

/// Benchmark of causal models over synthetic generators.
pub struct Experiment {
    pub(crate) name: Option<String>,
    pub(crate) seed: Option<u64>,
    pub(crate) root: PathBuf,
    pub(crate) directory: PathBuf,
    pub(crate) generators: Vec<(Box<dyn Generator>, usize)>,
    pub(crate) models: Vec<Box<dyn CausalModel>>,
    pub(crate) metrics: MetricRegistry,
    pub(crate) results: Vec<ResultTable>,
    pub(crate) trained: bool,
    pub(crate) count: usize,
    pub(crate) rng: StdRng,
}

fn validate_name(name: &Option<String>) -> Result<(), CausalBenchError> {
    match name {
        Some(n) if n.is_empty() || n.contains(['/', '\\']) => Err(CausalBenchError::InvalidParameter(
            "name".to_string(),
            "a non-empty name without path separators".to_string(),
            n.clone(),
        )),
        _ => Ok(()),
    }
}

/// Hash identifying one experiment instance.
fn identity_hash() -> String {
    let mut hasher = DefaultHasher::new();
    INSTANCES.fetch_add(1, Ordering::Relaxed).hash(&mut hasher);
    std::process::id().hash(&mut hasher);
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default()
        .hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn experiment_directory(root: &Path, seed: Option<u64>, name: &Option<String>) -> PathBuf {
    let seed = match seed {
        Some(s) => format!("seeded_{}", s),
        None => "randomized".to_string(),
    };
    let datetime = chrono::Local::now().format(TIMESTAMP_FORMAT);
    let hash = match name {
        Some(n) => n.clone(),
        None => identity_hash(),
    };
    root.join(format!("experiment_{}_{}_{}", seed, datetime, hash))
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// Fit every model on the dataset proxies and score it against the true effect.
fn score_models(
    models: &mut [Box<dyn CausalModel>],
    metrics: &MetricRegistry,
    dataset: &Dataset,
    rng: &mut StdRng,
) -> Result<ResultTable, CausalBenchError> {
    let x = dataset.proxy_matrix();
    let mut table = ResultTable::new(metrics.names());
    for model in models.iter_mut() {
        model.fit(&x, &dataset.treatment, &dataset.outcome, rng)?;
        let predictions = estimate_checked(&**model, &x)?;
        let scores = metrics.score_all(&dataset.true_effect, &predictions)?;
        debug!("{} scored {}", model.name(), fmt_vec_output(&scores));
        table.push_row(model.name(), scores)?;
    }
    Ok(table)
}

impl Experiment {
    /// Create an experiment under the default `experiments` root.
    ///
    /// * `seed` - Seed of the experiment random source, entropy when `None`.
    /// * `name` - Used instead of the identity hash in the directory name.
    pub fn new(seed: Option<u64>, name: Option<String>) -> Result<Self, CausalBenchError> {
        Experiment::with_root(seed, name, DEFAULT_EXPERIMENT_ROOT)
    }

    /// Create an experiment whose directory lives under `root`.
    pub fn with_root<P: AsRef<Path>>(seed: Option<u64>, name: Option<String>, root: P) -> Result<Self, CausalBenchError> {
        validate_name(&name)?;
        let mut experiment = Experiment {
            name,
            seed,
            root: root.as_ref().to_path_buf(),
            directory: PathBuf::new(),
            generators: Vec::new(),
            models: Vec::new(),
            metrics: MetricRegistry::new(),
            results: Vec::new(),
            trained: false,
            count: 0,
            rng: seeded_rng(seed),
        };
        experiment.reset(seed)?;
        Ok(experiment)
    }

    /// Drop generators, models, metrics and results, reseed, and move to a fresh directory.
    pub fn reset(&mut self, seed: Option<u64>) -> Result<&mut Self, CausalBenchError> {
        self.generators.clear();
        self.models.clear();
        self.metrics.clear();
        self.results.clear();
        self.seed = seed;
        self.rng = seeded_rng(seed);
        self.trained = false;
        self.count = 0;
        self.directory = experiment_directory(&self.root, seed, &self.name);
        fs::create_dir_all(&self.directory).map_err(|e| CausalBenchError::UnableToWrite(e.to_string()))?;
        Ok(self)
    }

    /// Drop generators and results, keeping models and metrics.
    pub fn clear(&mut self) -> &mut Self {
        self.generators.clear();
        self.results.clear();
        self.trained = false;
        self
    }

    fn validate(&self) -> Result<(), CausalBenchError> {
        if self.generators.is_empty() {
            return Err(CausalBenchError::NoGenerators);
        }
        if self.models.is_empty() {
            return Err(CausalBenchError::NoModels);
        }
        if self.metrics.is_empty() {
            return Err(CausalBenchError::NoMetrics);
        }
        Ok(())
    }

    /// Train and evaluate every model on every generator.
    ///
    /// Scores are averaged across generators without weighting by sample size.
    /// The averaged table is saved as `final_table.csv` and appended to the results.
    ///
    /// * `save_data` - Persist generated datasets and per-generator tables.
    /// * `save_graphs` - Persist dataset diagnostics.
    /// * `show_graphs` - Log dataset diagnostics.
    pub fn run(&mut self, save_data: bool, save_graphs: bool, show_graphs: bool) -> Result<&mut Self, CausalBenchError> {
        self.validate()?;
        info!(
            "Running experiment with {} generators, {} models and {} metrics in {}",
            self.generators.len(),
            self.models.len(),
            self.metrics.len(),
            self.directory.display()
        );
        let options = OutputOptions {
            save_data,
            save_graphs,
            show_graphs,
        };
        let mut totals = vec![vec![0.0; self.metrics.len()]; self.models.len()];

        for (idx, (generator, sample_size)) in self.generators.iter_mut().enumerate() {
            let directory = self.directory.join(format!("generator_{}_{}", idx, generator.name()));
            generator.set_directory(directory);
            let generation = generator.state().generations;
            info!("Generating {} samples with {}", sample_size, generator.name());
            let data = generator.generate_data(*sample_size, &options, &mut self.rng)?;
            let table = score_models(&mut self.models, &self.metrics, &data.dataset, &mut self.rng)?;
            if save_data {
                save_table(generator.directory().join(format!("table_{}.csv", generation)), &table)?;
            }
            for (total, row) in totals.iter_mut().zip(table.values.iter()) {
                for (t, v) in total.iter_mut().zip(row.iter()) {
                    *t += v;
                }
            }
        }

        let n_generators = self.generators.len() as f64;
        let mut final_table = ResultTable::new(self.metrics.names());
        for (model, total) in self.models.iter().zip(totals) {
            final_table.push_row(model.name(), total.into_iter().map(|v| v / n_generators).collect())?;
        }
        fs::create_dir_all(&self.directory).map_err(|e| CausalBenchError::UnableToWrite(e.to_string()))?;
        let path = self.directory.join(format!("{}.csv", FINAL_TABLE_NAME));
        save_table(&path, &final_table)?;
        info!("Saved final table to {}", path.display());
        self.results.push(final_table);
        self.trained = true;
        Ok(self)
    }

    /// Score the trained models on externally supplied proxies against the supplied truth.
    ///
    /// * `features` - Proxies, laid out like the ones the models were trained on.
    /// * `truth` - True effect of every row of `features`.
    pub fn test_specific_set(&mut self, features: &Matrix<f64>, truth: &[f64]) -> Result<&mut Self, CausalBenchError> {
        if !self.trained {
            return Err(CausalBenchError::NotTrained);
        }
        self.count += 1;
        let mut table = ResultTable::new(self.metrics.names());
        for model in self.models.iter() {
            let predictions = estimate_checked(&**model, features)?;
            let scores = self.metrics.score_all(truth, &predictions)?;
            debug!("{} scored {} on the supplied set", model.name(), fmt_vec_output(&scores));
            table.push_row(model.name(), scores)?;
        }
        let path = self
            .directory
            .join(format!("{}_{}.csv", SPECIFIC_TABLE_PREFIX, self.count));
        save_table(&path, &table)?;
        info!("Saved specific set table to {}", path.display());
        self.results.push(table);
        Ok(self)
    }

    /// The first result table's ATE error in its first row.
    pub fn get_result(&self) -> Result<f64, CausalBenchError> {
        let table = self.results.first().ok_or(CausalBenchError::NoResults)?;
        table
            .column(Metric::AteError.name())?
            .first()
            .copied()
            .ok_or(CausalBenchError::NoResults)
    }

    /// Child random source, independent from later draws of the experiment's own stream.
    pub fn fork_rng(&mut self) -> StdRng {
        StdRng::seed_from_u64(self.rng.gen::<u64>())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn results(&self) -> &[ResultTable] {
        &self.results
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// Number of `test_specific_set` calls since the last reset.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn generators(&self) -> impl Iterator<Item = (&dyn Generator, usize)> {
        self.generators.iter().map(|(g, n)| (g.as_ref(), *n))
    }

    pub fn model_names(&self) -> Vec<String> {
        self.models.iter().map(|m| m.name().to_string()).collect()
    }

    pub fn metric_names(&self) -> Vec<String> {
        self.metrics.names()
    }
}
