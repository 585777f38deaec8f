//! Experiment
//!
//! Registers generators, models and metrics, runs the benchmark and keeps the
//! resulting tables. Construction picks the output directory and seeds the
//! random source every generator, mechanism and model draws from.
pub mod config;
pub mod core;

mod setters;
mod tests;

pub use self::config::{ConfigIO, ExperimentConfig, GeneratorConfig, GeneratorKind, ModelSpec};
pub use self::core::Experiment;
