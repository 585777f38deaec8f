//! Metric
//!
//! Scoring functions comparing ground-truth effects with predicted effects, and
//! the ordered registry an experiment scores with. Registration order is the
//! column order of every result table.
use crate::errors::CausalBenchError;
use crate::utils::{items_to_strings, mean};
use hashbrown::HashMap;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type MetricFn = fn(&[f64], &[f64]) -> Result<f64, CausalBenchError>;

/// Built-in metrics.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// `|mean(truth) - mean(pred)|`
    AteError,
    /// `|(mean(truth) - mean(pred)) / mean(truth)| * 100`
    AtePercentError,
    /// `mean(truth)`
    TrueAte,
    /// `mean(pred)`
    EstimatedAte,
    /// `mean((truth - pred)^2)`
    PeheMse,
    /// `mean(|truth - pred|)`
    PeheMae,
}

impl Metric {
    /// Column label used in result tables.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::AteError => "eATE",
            Metric::AtePercentError => "eATE (%)",
            Metric::TrueAte => "True ATE",
            Metric::EstimatedAte => "Est. ATE",
            Metric::PeheMse => "PEHE (MSE)",
            Metric::PeheMae => "PEHE (MAE)",
        }
    }

    /// Every built-in metric, in the order `add_all_metrics` registers them.
    pub fn all() -> [Metric; 6] {
        [
            Metric::AteError,
            Metric::AtePercentError,
            Metric::TrueAte,
            Metric::EstimatedAte,
            Metric::PeheMse,
            Metric::PeheMae,
        ]
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Metric {
    type Err = CausalBenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AteError" | "eATE" => Ok(Metric::AteError),
            "AtePercentError" | "eATE (%)" => Ok(Metric::AtePercentError),
            "TrueAte" | "True ATE" => Ok(Metric::TrueAte),
            "EstimatedAte" | "Est. ATE" => Ok(Metric::EstimatedAte),
            "PeheMse" | "PEHE (MSE)" => Ok(Metric::PeheMse),
            "PeheMae" | "PEHE (MAE)" => Ok(Metric::PeheMae),
            _ => Err(CausalBenchError::ParseString(
                s.to_string(),
                "Metric".to_string(),
                items_to_strings(vec![
                    "AteError",
                    "AtePercentError",
                    "TrueAte",
                    "EstimatedAte",
                    "PeheMse",
                    "PeheMae",
                ]),
            )),
        }
    }
}

pub fn metric_callable(metric: &Metric) -> MetricFn {
    match metric {
        Metric::AteError => ate_error,
        Metric::AtePercentError => ate_percent_error,
        Metric::TrueAte => true_ate,
        Metric::EstimatedAte => estimated_ate,
        Metric::PeheMse => pehe_mse,
        Metric::PeheMae => pehe_mae,
    }
}

/// Fail unless both slices are non-empty and of equal length.
pub fn check_inputs(truth: &[f64], pred: &[f64]) -> Result<(), CausalBenchError> {
    if truth.len() != pred.len() {
        return Err(CausalBenchError::LengthMismatch(truth.len(), pred.len()));
    }
    if truth.is_empty() {
        return Err(CausalBenchError::EmptyInput);
    }
    Ok(())
}

fn means(truth: &[f64], pred: &[f64]) -> Result<(f64, f64), CausalBenchError> {
    check_inputs(truth, pred)?;
    match (mean(truth), mean(pred)) {
        (Some(t), Some(p)) => Ok((t, p)),
        _ => Err(CausalBenchError::EmptyInput),
    }
}

pub fn true_ate(truth: &[f64], pred: &[f64]) -> Result<f64, CausalBenchError> {
    Ok(means(truth, pred)?.0)
}

pub fn estimated_ate(truth: &[f64], pred: &[f64]) -> Result<f64, CausalBenchError> {
    Ok(means(truth, pred)?.1)
}

pub fn ate_error(truth: &[f64], pred: &[f64]) -> Result<f64, CausalBenchError> {
    let (t, p) = means(truth, pred)?;
    Ok((t - p).abs())
}

/// Relative ATE error in percent, `ZeroTrueAte` when the true ATE is exactly 0.
pub fn ate_percent_error(truth: &[f64], pred: &[f64]) -> Result<f64, CausalBenchError> {
    let (t, p) = means(truth, pred)?;
    if t == 0.0 {
        return Err(CausalBenchError::ZeroTrueAte);
    }
    Ok(((t - p) / t).abs() * 100.0)
}

pub fn pehe_mse(truth: &[f64], pred: &[f64]) -> Result<f64, CausalBenchError> {
    check_inputs(truth, pred)?;
    let total: f64 = truth.iter().zip(pred).map(|(t, p)| (t - p).powi(2)).sum();
    Ok(total / truth.len() as f64)
}

pub fn pehe_mae(truth: &[f64], pred: &[f64]) -> Result<f64, CausalBenchError> {
    check_inputs(truth, pred)?;
    let total: f64 = truth.iter().zip(pred).map(|(t, p)| (t - p).abs()).sum();
    Ok(total / truth.len() as f64)
}

/// A validated metric column name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricName(String);

impl MetricName {
    /// Names must be non-empty and fit in a single CSV header cell.
    pub fn new(name: &str) -> Result<Self, CausalBenchError> {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.contains([',', '\n', '\r', '"']) || trimmed == crate::constants::INDEX_NAME {
            return Err(CausalBenchError::InvalidParameter(
                "metric name".to_string(),
                "a non-empty name without commas, quotes or line breaks".to_string(),
                name.to_string(),
            ));
        }
        Ok(MetricName(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Metric> for MetricName {
    fn from(metric: Metric) -> Self {
        MetricName(metric.name().to_string())
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type CustomMetricFn = Box<dyn Fn(&[f64], &[f64]) -> f64>;

/// How a registered metric computes its score.
pub enum Scorer {
    Builtin(MetricFn),
    Custom(CustomMetricFn),
}

impl Scorer {
    pub fn score(&self, truth: &[f64], pred: &[f64]) -> Result<f64, CausalBenchError> {
        match self {
            Scorer::Builtin(f) => f(truth, pred),
            Scorer::Custom(f) => Ok(f(truth, pred)),
        }
    }
}

impl fmt::Debug for Scorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scorer::Builtin(_) => write!(f, "Builtin"),
            Scorer::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// Ordered metrics keyed by name.
#[derive(Debug, Default)]
pub struct MetricRegistry {
    entries: Vec<(MetricName, Scorer)>,
    index: HashMap<MetricName, usize>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        MetricRegistry::default()
    }

    /// Register `scorer` under `name`. An existing metric with the same name is
    /// replaced in place, keeping its column position. Returns true on replacement.
    pub fn insert(&mut self, name: MetricName, scorer: Scorer) -> bool {
        match self.index.get(&name) {
            Some(&i) => {
                warn!("Metric {} is already registered, replacing it.", name);
                self.entries[i].1 = scorer;
                true
            }
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, scorer));
                false
            }
        }
    }

    pub fn insert_builtin(&mut self, metric: Metric) -> bool {
        self.insert(MetricName::from(metric), Scorer::Builtin(metric_callable(&metric)))
    }

    /// Score with every metric, in registration order. Every score must be finite.
    pub fn score_all(&self, truth: &[f64], pred: &[f64]) -> Result<Vec<f64>, CausalBenchError> {
        check_inputs(truth, pred)?;
        self.entries
            .iter()
            .map(|(name, scorer)| {
                let value = scorer.score(truth, pred)?;
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(CausalBenchError::NonFiniteScore {
                        metric: name.to_string(),
                        value,
                    })
                }
            })
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.to_string()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        MetricName::new(name).map(|n| self.index.contains_key(&n)).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}
