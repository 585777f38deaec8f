//! Errors
//!
//! Custom error types used throughout the `causal-bench` crate.
use thiserror::Error;

/// Errors that can occur while generating data, fitting models or running experiments.
#[derive(Debug, Error)]
pub enum CausalBenchError {
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
    /// Invalid value parsing.
    #[error("Invalid value {0} passed for {1}, expected one of {2}.")]
    ParseString(String, String, String),
    /// Running an experiment without any generator.
    #[error("No generators configured, add at least one generator before running the experiment.")]
    NoGenerators,
    /// Running an experiment without any model.
    #[error("No models configured, add at least one model before running the experiment.")]
    NoModels,
    /// Running an experiment without any metric.
    #[error("No metrics configured, add at least one metric before running the experiment.")]
    NoMetrics,
    /// Evaluating before the experiment was run.
    #[error("Models are not trained yet. Please make sure you run the full experiment first.")]
    NotTrained,
    /// Two models registered under the same display name.
    #[error("A model named {0} is already registered.")]
    DuplicateModel(String),
    /// Metric inputs of different lengths.
    #[error("Length mismatch: {0} ground truth effects but {1} predictions.")]
    LengthMismatch(usize, usize),
    /// Metric inputs without any value.
    #[error("Metric inputs are empty.")]
    EmptyInput,
    /// Percent ATE error with a true ATE of zero.
    #[error("Percent ATE error is undefined because the true average treatment effect is zero.")]
    ZeroTrueAte,
    /// A mechanism function produced NaN or infinity.
    #[error("The {function} function returned the non-finite value {value} for row {row}.")]
    NonFiniteValue { function: String, row: usize, value: f64 },
    /// A model predicted NaN or infinity.
    #[error("Model {model} predicted the non-finite value {value} for row {row}.")]
    NonFinitePrediction { model: String, row: usize, value: f64 },
    /// A metric scored NaN or infinity.
    #[error("Metric {metric} returned the non-finite score {value}.")]
    NonFiniteScore { metric: String, value: f64 },
    /// The treatment function produced something other than 0 or 1.
    #[error("The treatment function returned {value} for row {row}, expected 0 or 1.")]
    InvalidTreatment { row: usize, value: f64 },
    /// The proxy function changed its output layout between rows.
    #[error("The proxy function returned a different layout at row {0} than at row 0.")]
    ProxyShapeMismatch(usize),
    /// A mechanism references a feature the generator does not sample.
    #[error("Feature index {0} is out of range for a generator with {1} dimensions.")]
    FeatureOutOfRange(usize, usize),
    /// Model fitting without enough observations.
    #[error("Not enough data to fit {0}: {1}")]
    InsufficientData(String, String),
    /// Prediction before fitting.
    #[error("Model {0} must be fitted before estimating causal effects.")]
    NotFitted(String),
    /// Linear system without a unique solution.
    #[error("Linear system is singular, increase the regularization strength.")]
    SingularSystem,
    /// No result table has been produced.
    #[error("No result tables have been produced yet.")]
    NoResults,
    /// A metric column that does not exist.
    #[error("Metric {0} is not part of the result table.")]
    MissingMetric(String),
    /// Unable to write to file.
    #[error("Unable to write to file: {0}")]
    UnableToWrite(String),
    /// Unable to read from file.
    #[error("Unable to read from file: {0}")]
    UnableToRead(String),
}
