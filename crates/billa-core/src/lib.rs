pub mod app_config;
pub mod changes;
pub mod compare;
pub mod config;
pub mod diff;
pub mod record;
pub mod run_log;

pub use app_config::{AppConfig, Environment};
pub use changes::{ChangeSet, FieldDiff};
pub use compare::{
    normalize_for_compare, strategy_for, values_equivalent, CompareStrategy, NormalizedValue,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use diff::{
    diff_snapshot, find_differences, latest_by_sku, rows_for_run, rows_to_append, seed_rows,
};
pub use record::{FieldValue, PriceField, PriceRecord};
pub use run_log::{Differences, RunLogEntry, NO_DIFFERENCES_MESSAGE};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
