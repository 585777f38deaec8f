//! Table
//!
//! Result tables: one row per model, indexed by `method_name`, one column per
//! metric in registration order.
use crate::constants::INDEX_NAME;
use crate::errors::CausalBenchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub index_name: String,
    pub methods: Vec<String>,
    pub metrics: Vec<String>,
    /// Row-major, `values[row][metric]`.
    pub values: Vec<Vec<f64>>,
}

impl ResultTable {
    pub fn new(metrics: Vec<String>) -> Self {
        ResultTable {
            index_name: INDEX_NAME.to_string(),
            methods: Vec::new(),
            metrics,
            values: Vec::new(),
        }
    }

    pub fn push_row(&mut self, method: &str, values: Vec<f64>) -> Result<(), CausalBenchError> {
        if values.len() != self.metrics.len() {
            return Err(CausalBenchError::LengthMismatch(self.metrics.len(), values.len()));
        }
        self.methods.push(method.to_string());
        self.values.push(values);
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    fn metric_index(&self, metric: &str) -> Result<usize, CausalBenchError> {
        self.metrics
            .iter()
            .position(|m| m == metric)
            .ok_or_else(|| CausalBenchError::MissingMetric(metric.to_string()))
    }

    /// Value of `metric` for `method`, `None` when the method is unknown.
    pub fn get(&self, method: &str, metric: &str) -> Result<Option<f64>, CausalBenchError> {
        let j = self.metric_index(metric)?;
        Ok(self.methods.iter().position(|m| m == method).map(|i| self.values[i][j]))
    }

    /// Every row's value of `metric`.
    pub fn column(&self, metric: &str) -> Result<Vec<f64>, CausalBenchError> {
        let j = self.metric_index(metric)?;
        Ok(self.values.iter().map(|row| row[j]).collect())
    }

    /// Write the table as CSV, the first column holds the method names.
    pub fn save_table<P: AsRef<Path>>(&self, path: P) -> Result<(), CausalBenchError> {
        let mut writer = csv::Writer::from_path(path).map_err(|e| CausalBenchError::UnableToWrite(e.to_string()))?;
        let mut header = vec![self.index_name.as_str()];
        header.extend(self.metrics.iter().map(|m| m.as_str()));
        writer
            .write_record(&header)
            .map_err(|e| CausalBenchError::UnableToWrite(e.to_string()))?;
        for (method, row) in self.methods.iter().zip(self.values.iter()) {
            let mut record = vec![method.clone()];
            record.extend(row.iter().map(|v| v.to_string()));
            writer
                .write_record(&record)
                .map_err(|e| CausalBenchError::UnableToWrite(e.to_string()))?;
        }
        writer.flush().map_err(|e| CausalBenchError::UnableToWrite(e.to_string()))
    }

    /// Read a table written by [`ResultTable::save_table`].
    pub fn load_table<P: AsRef<Path>>(path: P) -> Result<Self, CausalBenchError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| CausalBenchError::UnableToRead(e.to_string()))?;
        let header = reader
            .headers()
            .map_err(|e| CausalBenchError::UnableToRead(e.to_string()))?
            .clone();
        let index_name = header
            .get(0)
            .ok_or_else(|| CausalBenchError::UnableToRead("missing index column".to_string()))?
            .to_string();
        let mut table = ResultTable::new(header.iter().skip(1).map(|s| s.to_string()).collect());
        table.index_name = index_name;
        for record in reader.records() {
            let record = record.map_err(|e| CausalBenchError::UnableToRead(e.to_string()))?;
            let method = record.get(0).unwrap_or_default();
            let values = record
                .iter()
                .skip(1)
                .map(|v| {
                    v.trim()
                        .parse::<f64>()
                        .map_err(|e| CausalBenchError::UnableToRead(format!("{}: {}", v, e)))
                })
                .collect::<Result<Vec<f64>, CausalBenchError>>()?;
            table
                .push_row(method, values)
                .map_err(|e| CausalBenchError::UnableToRead(e.to_string()))?;
        }
        Ok(table)
    }

    pub fn json_dump(&self) -> Result<String, CausalBenchError> {
        serde_json::to_string(self).map_err(|e| CausalBenchError::UnableToWrite(e.to_string()))
    }

    pub fn from_json(json_str: &str) -> Result<Self, CausalBenchError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| CausalBenchError::UnableToRead(e.to_string()))
    }
}

/// Persist `table` as CSV at `path`.
pub fn save_table<P: AsRef<Path>>(path: P, table: &ResultTable) -> Result<(), CausalBenchError> {
    table.save_table(path)
}

impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index_width = self
            .methods
            .iter()
            .map(|m| m.len())
            .chain(std::iter::once(self.index_name.len()))
            .max()
            .unwrap_or(0);
        let cells: Vec<Vec<String>> = self
            .values
            .iter()
            .map(|row| row.iter().map(|v| format!("{:.4}", v)).collect())
            .collect();
        let widths: Vec<usize> = self
            .metrics
            .iter()
            .enumerate()
            .map(|(j, m)| cells.iter().map(|row| row[j].len()).chain(std::iter::once(m.len())).max().unwrap_or(0))
            .collect();

        write!(f, "{:<index_width$}", self.index_name)?;
        for (m, w) in self.metrics.iter().zip(widths.iter()) {
            write!(f, "  {:>w$}", m, w = w)?;
        }
        for (method, row) in self.methods.iter().zip(cells.iter()) {
            writeln!(f)?;
            write!(f, "{:<index_width$}", method)?;
            for (cell, w) in row.iter().zip(widths.iter()) {
                write!(f, "  {:>w$}", cell, w = w)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn table() -> ResultTable {
        let mut table = ResultTable::new(vec!["eATE".to_string(), "PEHE (MSE)".to_string()]);
        table.push_row("T-Learner 0", vec![0.1, 0.25]).unwrap();
        table.push_row("S-Learner 1", vec![0.3, f64::NAN]).unwrap();
        table
    }

    #[test]
    fn test_push_and_get() {
        let mut table = table();
        assert_eq!(table.rows(), 2);
        assert_eq!(table.get("T-Learner 0", "eATE").unwrap(), Some(0.1));
        assert_eq!(table.get("missing", "eATE").unwrap(), None);
        assert!(matches!(table.get("T-Learner 0", "bias"), Err(CausalBenchError::MissingMetric(_))));
        assert_eq!(table.column("eATE").unwrap(), vec![0.1, 0.3]);
        assert!(matches!(
            table.push_row("x", vec![1.0]),
            Err(CausalBenchError::LengthMismatch(2, 1))
        ));
    }

    #[test]
    fn test_save_and_load_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("final_table.csv");
        let table = table();
        save_table(&path, &table).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("method_name,eATE,PEHE (MSE)"));
        let loaded = ResultTable::load_table(&path).unwrap();
        assert_eq!(loaded.methods, table.methods);
        assert_eq!(loaded.metrics, table.metrics);
        assert_eq!(loaded.values[0], table.values[0]);
        assert!(loaded.values[1][1].is_nan());
    }

    #[test]
    fn test_json_and_display() {
        let mut table = ResultTable::new(vec!["eATE".to_string()]);
        table.push_row("m", vec![0.5]).unwrap();
        let loaded = ResultTable::from_json(&table.json_dump().unwrap()).unwrap();
        assert_eq!(loaded, table);
        let shown = table.to_string();
        assert!(shown.starts_with("method_name"));
        assert!(shown.contains("0.5000"));
    }
}
