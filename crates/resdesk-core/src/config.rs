use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but holds an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files; useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup, with no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let env = parse_environment(&or_default("RESDESK_ENV", "development"))?;
    let log_level = or_default("RESDESK_LOG_LEVEL", "info");

    let data_source = or_default("RESDESK_DATA_SOURCE", "./data/processed_output.json");
    if data_source.trim().is_empty() {
        return Err(invalid("RESDESK_DATA_SOURCE", "must not be empty".to_string()));
    }

    let fetch_max_attempts = parse_u32("RESDESK_FETCH_MAX_ATTEMPTS", "3")?;
    if fetch_max_attempts == 0 {
        return Err(invalid(
            "RESDESK_FETCH_MAX_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }
    let fetch_backoff_base_ms = parse_u64("RESDESK_FETCH_BACKOFF_BASE_MS", "1000")?;
    let fetch_backoff_max_ms = parse_u64("RESDESK_FETCH_BACKOFF_MAX_MS", "5000")?;
    if fetch_backoff_max_ms < fetch_backoff_base_ms {
        return Err(invalid(
            "RESDESK_FETCH_BACKOFF_MAX_MS",
            format!("must be >= RESDESK_FETCH_BACKOFF_BASE_MS ({fetch_backoff_base_ms})"),
        ));
    }
    let fetch_timeout_secs = parse_u64("RESDESK_FETCH_TIMEOUT_SECS", "30")?;
    let fetch_retry_schema_errors = parse_bool("RESDESK_FETCH_RETRY_SCHEMA_ERRORS", "true")?;

    let relay_url = or_default("RESDESK_RELAY_URL", "http://localhost:5002");
    let relay_min_interval_ms = parse_u64("RESDESK_RELAY_MIN_INTERVAL_MS", "3000")?;
    let relay_timeout_secs = parse_u64("RESDESK_RELAY_TIMEOUT_SECS", "60")?;

    let threads_path = PathBuf::from(or_default("RESDESK_THREADS_PATH", "./data/threads.json"));
    let user_agent = or_default("RESDESK_USER_AGENT", "resdesk/0.1 (reservation-dashboard)");

    Ok(AppConfig {
        env,
        log_level,
        data_source,
        fetch_max_attempts,
        fetch_backoff_base_ms,
        fetch_backoff_max_ms,
        fetch_timeout_secs,
        fetch_retry_schema_errors,
        relay_url,
        relay_min_interval_ms,
        relay_timeout_secs,
        threads_path,
        user_agent,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "RESDESK_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
