// Modules
pub mod constants;
pub mod data;
pub mod dataset;
pub mod distribution;
pub mod errors;
pub mod experiment;
pub mod generator;
pub mod mechanism;
pub mod metric;
pub mod model;
pub mod table;
pub mod utils;

// Individual classes, and functions
pub use data::Matrix;
pub use dataset::Dataset;
pub use errors::CausalBenchError;
pub use experiment::{Experiment, ExperimentConfig};
pub use generator::{Generator, LatentGenerator, ProxyGenerator};
pub use mechanism::{CausalMechanism, LatentMechanism, MechanismSpec};
pub use metric::Metric;
pub use model::CausalModel;
pub use table::ResultTable;
