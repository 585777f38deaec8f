use crate::errors::CausalBenchError;

/// Create a string of all available items.
pub fn items_to_strings(items: Vec<&str>) -> String {
    let mut s = String::new();
    for i in items {
        s.push_str(i);
        s.push_str(&String::from(", "));
    }
    s
}

pub fn fmt_vec_output(v: &[f64]) -> String {
    let mut res = String::new();
    if let Some(last) = v.len().checked_sub(1) {
        if last == 0 {
            return format!("{:.4}", v[0]);
        }
        for n in &v[..last] {
            res.push_str(format!("{:.4}", n).as_str());
            res.push_str(", ");
        }
        res.push_str(format!("{:.4}", &v[last]).as_str());
    }
    res
}

// Validation
pub fn validate_positive_float_parameter(value: f64, parameter: &str) -> Result<(), CausalBenchError> {
    validate_float_parameter(value, 0.0, f64::INFINITY, parameter)
}

pub fn validate_probability_parameter(value: f64, parameter: &str) -> Result<(), CausalBenchError> {
    validate_float_parameter(value, 0.0, 1.0, parameter)
}

pub fn validate_float_parameter(value: f64, min: f64, max: f64, parameter: &str) -> Result<(), CausalBenchError> {
    if value.is_nan() || value < min || max < value {
        let ex_msg = format!("real value within range {} and {}", min, max);
        Err(CausalBenchError::InvalidParameter(
            parameter.to_string(),
            ex_msg,
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Arithmetic mean, `None` for an empty slice.
#[inline]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[inline]
pub fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

/// Fail with `NonFiniteValue` unless `value` is a real number.
#[inline]
pub fn ensure_finite(value: f64, function: &str, row: usize) -> Result<f64, CausalBenchError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CausalBenchError::NonFiniteValue {
            function: function.to_string(),
            row,
            value,
        })
    }
}
