pub const DEFAULT_SAMPLE_SIZE: usize = 500;
pub const DEFAULT_EXPERIMENT_ROOT: &str = "experiments";
pub const FINAL_TABLE_NAME: &str = "final_table";
pub const SPECIFIC_TABLE_PREFIX: &str = "table_comparing_specific_value";
pub const INDEX_NAME: &str = "method_name";
pub const TREATMENT_COLUMN: &str = "treatment";
pub const OUTCOME_COLUMN: &str = "outcome";
pub const TRUE_EFFECT_COLUMN: &str = "true_effect";
pub const PROXY_COLUMN_PREFIX: &str = "proxy";
pub const DEFAULT_RIDGE_ALPHA: f64 = 1.0;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
