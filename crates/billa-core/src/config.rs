use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_START_URL: &str =
    "https://shop.billa.at/api/products?sortBy=relevance&page=0&pageSize=100";
pub const DEFAULT_HISTORY_REMOTE_URL: &str =
    "https://raw.githubusercontent.com/ultralazr/billatracker/main/updated_combined_dataframe.csv";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let positive = |var: &str, value: u32| -> Result<u32, ConfigError> {
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(value)
    };

    let env = parse_environment(&or_default("BILLA_ENV", "development"));
    let log_level = or_default("BILLA_LOG_LEVEL", "info");
    let start_url = or_default("BILLA_START_URL", DEFAULT_START_URL);
    let page_size = positive("BILLA_PAGE_SIZE", parse_u32("BILLA_PAGE_SIZE", "100")?)?;

    let history_path = PathBuf::from(or_default(
        "BILLA_HISTORY_PATH",
        "updated_combined_dataframe.csv",
    ));
    // An explicitly empty value turns the remote fallback off.
    let history_remote_url = Some(or_default(
        "BILLA_HISTORY_REMOTE_URL",
        DEFAULT_HISTORY_REMOTE_URL,
    ))
    .filter(|s| !s.trim().is_empty());
    let run_log_path = PathBuf::from(or_default("BILLA_RUN_LOG_PATH", "scraping_log.json"));
    let report_path = PathBuf::from(or_default("BILLA_REPORT_PATH", "scraping_summary.html"));

    let seed_empty_history = parse_bool(
        "BILLA_SEED_EMPTY_HISTORY",
        &or_default("BILLA_SEED_EMPTY_HISTORY", "true"),
    )?;

    let scraper_request_timeout_secs = parse_u64("BILLA_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_inter_page_delay_ms = parse_u64("BILLA_SCRAPER_INTER_PAGE_DELAY_MS", "2000")?;
    let scraper_max_attempts = positive(
        "BILLA_SCRAPER_MAX_ATTEMPTS",
        parse_u32("BILLA_SCRAPER_MAX_ATTEMPTS", "5")?,
    )?;
    let scraper_retry_delay_ms = parse_u64("BILLA_SCRAPER_RETRY_DELAY_MS", "3000")?;

    Ok(AppConfig {
        env,
        log_level,
        start_url,
        page_size,
        history_path,
        history_remote_url,
        run_log_path,
        report_path,
        seed_empty_history,
        scraper_request_timeout_secs,
        scraper_inter_page_delay_ms,
        scraper_max_attempts,
        scraper_retry_delay_ms,
    })
}

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
