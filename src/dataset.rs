//! Dataset
//!
//! The observable part of a generated sample: flattened proxies, the binary
//! treatment, the outcome, and the held back ground-truth effect used only for
//! scoring. Raw features never enter a [`Dataset`], only their count does.
use crate::constants::{OUTCOME_COLUMN, PROXY_COLUMN_PREFIX, TREATMENT_COLUMN, TRUE_EFFECT_COLUMN};
use crate::data::{Matrix, RowMajorMatrix};
use crate::errors::CausalBenchError;
use crate::utils::mean;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Generated observations with their ground-truth treatment effects.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Proxies in column-major order, `rows * proxy_columns.len()` values.
    pub proxies: Vec<f64>,
    /// Names of the flattened proxy columns, `proxy_{group}_{k}`.
    pub proxy_columns: Vec<String>,
    /// Number of proxies produced for each group.
    pub proxy_layout: Vec<usize>,
    /// Number of raw features the proxies were derived from.
    pub feature_dimensions: usize,
    /// Number of rows.
    pub rows: usize,
    /// Treatment indicator, 0 or 1.
    pub treatment: Vec<f64>,
    /// Observed outcome.
    pub outcome: Vec<f64>,
    /// Analytic conditional average treatment effect for every row.
    pub true_effect: Vec<f64>,
}

/// Summary statistics for a generated dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetSummary {
    pub rows: usize,
    pub feature_dimensions: usize,
    pub proxy_width: usize,
    pub treated_fraction: f64,
    pub mean_outcome_treated: Option<f64>,
    pub mean_outcome_control: Option<f64>,
    /// Difference in mean outcomes between the arms, biased under confounding.
    pub naive_ate: Option<f64>,
    pub true_ate: Option<f64>,
}

pub(crate) fn proxy_column_names(layout: &[usize]) -> Vec<String> {
    layout
        .iter()
        .enumerate()
        .flat_map(|(g, &size)| (0..size).map(move |k| format!("{}_{}_{}", PROXY_COLUMN_PREFIX, g, k)))
        .collect()
}

/// Accumulates generated rows, checking that every row has the same proxy layout.
pub struct DatasetBuilder {
    feature_dimensions: usize,
    layout: Option<Vec<usize>>,
    proxies: Option<RowMajorMatrix<f64>>,
    capacity: usize,
    treatment: Vec<f64>,
    outcome: Vec<f64>,
    true_effect: Vec<f64>,
}

impl DatasetBuilder {
    pub fn new(feature_dimensions: usize, capacity: usize) -> Self {
        DatasetBuilder {
            feature_dimensions,
            layout: None,
            proxies: None,
            capacity,
            treatment: Vec::with_capacity(capacity),
            outcome: Vec::with_capacity(capacity),
            true_effect: Vec::with_capacity(capacity),
        }
    }

    /// Append one row. `proxies` holds one group of values per proxied feature.
    pub fn push(
        &mut self,
        proxies: Vec<Vec<f64>>,
        treatment: f64,
        outcome: f64,
        true_effect: f64,
    ) -> Result<(), CausalBenchError> {
        let row = self.treatment.len();
        let layout: Vec<usize> = proxies.iter().map(|g| g.len()).collect();
        match &self.layout {
            Some(expected) if *expected != layout => return Err(CausalBenchError::ProxyShapeMismatch(row)),
            Some(_) => (),
            None => {
                let width: usize = layout.iter().sum();
                if width == 0 {
                    return Err(CausalBenchError::InvalidParameter(
                        "proxy_function".to_string(),
                        "at least one proxy value".to_string(),
                        "none".to_string(),
                    ));
                }
                self.proxies = Some(RowMajorMatrix::with_capacity(self.capacity, width));
                self.layout = Some(layout);
            }
        }
        if let Some(matrix) = self.proxies.as_mut() {
            matrix.append_row(proxies.into_iter().flatten().collect());
        }
        self.treatment.push(treatment);
        self.outcome.push(outcome);
        self.true_effect.push(true_effect);
        Ok(())
    }

    pub fn build(self) -> Dataset {
        let layout = self.layout.unwrap_or_default();
        let proxies = self.proxies.map(|m| m.to_column_major()).unwrap_or_default();
        Dataset {
            proxies,
            proxy_columns: proxy_column_names(&layout),
            proxy_layout: layout,
            feature_dimensions: self.feature_dimensions,
            rows: self.treatment.len(),
            treatment: self.treatment,
            outcome: self.outcome,
            true_effect: self.true_effect,
        }
    }
}

impl Dataset {
    /// Number of flattened proxy columns, the input width seen by models.
    pub fn proxy_width(&self) -> usize {
        self.proxy_columns.len()
    }

    /// Column-major view over the proxies.
    pub fn proxy_matrix(&self) -> Matrix<'_, f64> {
        Matrix::new(&self.proxies, self.rows, self.proxy_width())
    }

    /// Mean of the ground-truth effects.
    pub fn true_ate(&self) -> Option<f64> {
        mean(&self.true_effect)
    }

    pub fn summary(&self) -> DatasetSummary {
        let (mut treated, mut control) = (Vec::new(), Vec::new());
        for (t, y) in self.treatment.iter().zip(self.outcome.iter()) {
            if *t == 1.0 {
                treated.push(*y);
            } else {
                control.push(*y);
            }
        }
        let mean_outcome_treated = mean(&treated);
        let mean_outcome_control = mean(&control);
        let naive_ate = match (mean_outcome_treated, mean_outcome_control) {
            (Some(t), Some(c)) => Some(t - c),
            _ => None,
        };
        DatasetSummary {
            rows: self.rows,
            feature_dimensions: self.feature_dimensions,
            proxy_width: self.proxy_width(),
            treated_fraction: if self.rows == 0 {
                0.0
            } else {
                treated.len() as f64 / self.rows as f64
            },
            mean_outcome_treated,
            mean_outcome_control,
            naive_ate,
            true_ate: self.true_ate(),
        }
    }

    /// Write the dataset as CSV: proxy columns, then treatment, outcome and true effect.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), CausalBenchError> {
        let mut writer = csv::Writer::from_path(path).map_err(|e| CausalBenchError::UnableToWrite(e.to_string()))?;
        let mut header: Vec<&str> = self.proxy_columns.iter().map(|s| s.as_str()).collect();
        header.extend([TREATMENT_COLUMN, OUTCOME_COLUMN, TRUE_EFFECT_COLUMN]);
        writer
            .write_record(&header)
            .map_err(|e| CausalBenchError::UnableToWrite(e.to_string()))?;
        let matrix = self.proxy_matrix();
        for i in 0..self.rows {
            let mut record: Vec<String> = matrix.get_row(i).iter().map(|v| v.to_string()).collect();
            record.push(self.treatment[i].to_string());
            record.push(self.outcome[i].to_string());
            record.push(self.true_effect[i].to_string());
            writer
                .write_record(&record)
                .map_err(|e| CausalBenchError::UnableToWrite(e.to_string()))?;
        }
        writer.flush().map_err(|e| CausalBenchError::UnableToWrite(e.to_string()))
    }

    /// Read a dataset written by [`Dataset::to_csv`].
    ///
    /// The raw feature dimensionality is not stored on disk, it is recovered as the
    /// number of proxy groups.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, CausalBenchError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| CausalBenchError::UnableToRead(e.to_string()))?;
        let header = reader
            .headers()
            .map_err(|e| CausalBenchError::UnableToRead(e.to_string()))?
            .clone();
        let width = header.len().saturating_sub(3);
        if header.len() < 4
            || header.get(width) != Some(TREATMENT_COLUMN)
            || header.get(width + 1) != Some(OUTCOME_COLUMN)
            || header.get(width + 2) != Some(TRUE_EFFECT_COLUMN)
        {
            return Err(CausalBenchError::UnableToRead(format!(
                "expected proxy columns followed by {}, {} and {}",
                TREATMENT_COLUMN, OUTCOME_COLUMN, TRUE_EFFECT_COLUMN
            )));
        }
        let proxy_columns: Vec<String> = header.iter().take(width).map(|s| s.to_string()).collect();
        let proxy_layout = parse_layout(&proxy_columns)?;

        let mut rows = RowMajorMatrix::with_capacity(0, width);
        let (mut treatment, mut outcome, mut true_effect) = (Vec::new(), Vec::new(), Vec::new());
        for record in reader.records() {
            let record = record.map_err(|e| CausalBenchError::UnableToRead(e.to_string()))?;
            let values = record
                .iter()
                .map(|v| {
                    v.trim()
                        .parse::<f64>()
                        .map_err(|e| CausalBenchError::UnableToRead(format!("{}: {}", v, e)))
                })
                .collect::<Result<Vec<f64>, CausalBenchError>>()?;
            rows.append_row(values[..width].to_vec());
            treatment.push(values[width]);
            outcome.push(values[width + 1]);
            true_effect.push(values[width + 2]);
        }
        Ok(Dataset {
            proxies: rows.to_column_major(),
            feature_dimensions: proxy_layout.len(),
            proxy_columns,
            proxy_layout,
            rows: treatment.len(),
            treatment,
            outcome,
            true_effect,
        })
    }
}

fn parse_layout(columns: &[String]) -> Result<Vec<usize>, CausalBenchError> {
    let mut layout: Vec<usize> = Vec::new();
    for name in columns {
        let group = name
            .strip_prefix(PROXY_COLUMN_PREFIX)
            .and_then(|rest| rest.strip_prefix('_'))
            .and_then(|rest| rest.split('_').next())
            .and_then(|g| g.parse::<usize>().ok())
            .ok_or_else(|| CausalBenchError::UnableToRead(format!("unexpected proxy column {}", name)))?;
        if group == layout.len() {
            layout.push(1);
        } else if group + 1 == layout.len() {
            layout[group] += 1;
        } else {
            return Err(CausalBenchError::UnableToRead(format!("proxy column {} out of order", name)));
        }
    }
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn small_dataset() -> Dataset {
        let mut builder = DatasetBuilder::new(2, 3);
        builder.push(vec![vec![0.1, 0.2], vec![1.0]], 1.0, 2.0, 0.5).unwrap();
        builder.push(vec![vec![0.3, 0.4], vec![2.0]], 0.0, 1.0, 0.5).unwrap();
        builder.push(vec![vec![0.5, 0.6], vec![3.0]], 1.0, 4.0, 1.1).unwrap();
        builder.build()
    }

    #[test]
    fn test_builder_layout() {
        let ds = small_dataset();
        assert_eq!(ds.rows, 3);
        assert_eq!(ds.proxy_layout, vec![2, 1]);
        assert_eq!(ds.proxy_columns, vec!["proxy_0_0", "proxy_0_1", "proxy_1_0"]);
        assert_eq!(ds.proxy_width(), 3);
        let m = ds.proxy_matrix();
        assert_eq!(m.get_row(1), vec![0.3, 0.4, 2.0]);
        assert_eq!(m.get_col(2), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_builder_rejects_changed_layout() {
        let mut builder = DatasetBuilder::new(1, 2);
        builder.push(vec![vec![0.1]], 1.0, 2.0, 0.5).unwrap();
        let err = builder.push(vec![vec![0.1, 0.2]], 1.0, 2.0, 0.5).unwrap_err();
        assert!(matches!(err, CausalBenchError::ProxyShapeMismatch(1)));
    }

    #[test]
    fn test_summary() {
        let summary = small_dataset().summary();
        assert_eq!(summary.rows, 3);
        assert!((summary.treated_fraction - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(summary.mean_outcome_treated, Some(3.0));
        assert_eq!(summary.mean_outcome_control, Some(1.0));
        assert_eq!(summary.naive_ate, Some(2.0));
        assert!((summary.true_ate.unwrap() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_csv_io() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let ds = small_dataset();
        ds.to_csv(&path).unwrap();
        let loaded = Dataset::from_csv(&path).unwrap();
        assert_eq!(loaded.proxy_layout, ds.proxy_layout);
        assert_eq!(loaded.proxies, ds.proxies);
        assert_eq!(loaded.true_effect, ds.true_effect);
        assert_eq!(loaded.feature_dimensions, 2);
    }

    #[test]
    fn test_from_csv_rejects_foreign_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("other.csv");
        std::fs::write(&path, "a,b,c,d\n1,2,3,4\n").unwrap();
        assert!(Dataset::from_csv(&path).is_err());
    }
}
