use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Runtime settings for a single tracker run.
///
/// Every value has a default matching the historical constants, so an empty
/// environment yields a working configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Catalog endpoint including the fixed query (`sortBy`, `page`, `pageSize`).
    pub start_url: String,
    pub page_size: u32,
    /// Local CSV holding the full price history.
    pub history_path: PathBuf,
    /// Fallback location of the history CSV; `None` disables the fallback.
    pub history_remote_url: Option<String>,
    pub run_log_path: PathBuf,
    pub report_path: PathBuf,
    /// Seed an empty history with the whole scrape. A non-empty history only
    /// ever receives rows of changed skus.
    pub seed_empty_history: bool,
    pub scraper_request_timeout_secs: u64,
    pub scraper_inter_page_delay_ms: u64,
    /// Total attempts per page, including the first one.
    pub scraper_max_attempts: u32,
    pub scraper_retry_delay_ms: u64,
}
