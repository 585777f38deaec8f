use super::{check_fit_inputs, require_both_arms, split_arms, CausalModel};
use crate::data::Matrix;
use crate::errors::CausalBenchError;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Predicts the naive contrast `mean(y | w = 1) - mean(y | w = 0)` for every row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifferenceInMeans {
    name: String,
    ate: Option<f64>,
}

impl DifferenceInMeans {
    pub fn new(id: usize) -> Self {
        DifferenceInMeans {
            name: format!("Difference in Means {}", id),
            ate: None,
        }
    }

    /// The fitted contrast, if any.
    pub fn ate(&self) -> Option<f64> {
        self.ate
    }
}

fn arm_mean(y: &[f64], idx: &[usize]) -> f64 {
    idx.iter().map(|&i| y[i]).sum::<f64>() / idx.len() as f64
}

impl CausalModel for DifferenceInMeans {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&mut self, x: &Matrix<f64>, w: &[f64], y: &[f64], _rng: &mut StdRng) -> Result<(), CausalBenchError> {
        check_fit_inputs(x, w, y)?;
        let (idx0, idx1) = split_arms(w);
        require_both_arms(&self.name, &idx0, &idx1)?;
        self.ate = Some(arm_mean(y, &idx1) - arm_mean(y, &idx0));
        Ok(())
    }

    fn estimate_causal_effect(&self, x: &Matrix<f64>) -> Result<Vec<f64>, CausalBenchError> {
        let ate = self.ate.ok_or_else(|| CausalBenchError::NotFitted(self.name.clone()))?;
        Ok(vec![ate; x.rows])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_difference_in_means() {
        let data = vec![0.0, 0.0, 0.0, 0.0];
        let x = Matrix::new(&data, 4, 1);
        let w = vec![0.0, 1.0, 0.0, 1.0];
        let y = vec![1.0, 3.0, 2.0, 4.0];
        let mut model = DifferenceInMeans::new(0);
        assert!(matches!(
            model.estimate_causal_effect(&x),
            Err(CausalBenchError::NotFitted(_))
        ));
        model.fit(&x, &w, &y, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(model.ate(), Some(2.0));
        assert_eq!(model.estimate_causal_effect(&x).unwrap(), vec![2.0; 4]);
        assert_eq!(model.name(), "Difference in Means 0");
    }

    #[test]
    fn test_difference_in_means_single_arm() {
        let data = vec![0.0, 0.0];
        let x = Matrix::new(&data, 2, 1);
        let mut model = DifferenceInMeans::new(1);
        let err = model
            .fit(&x, &[1.0, 1.0], &[1.0, 2.0], &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, CausalBenchError::InsufficientData(..)));
    }
}
