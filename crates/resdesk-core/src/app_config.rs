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

/// Runtime settings for the reservation pipeline and its collaborators.
///
/// Built by [`crate::load_app_config`]; every field has a default so an
/// empty environment yields a usable configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Where the processed dataset lives: an `http(s)://` URL or a file path.
    pub data_source: String,
    /// Total attempts for one dataset fetch, including the first.
    pub fetch_max_attempts: u32,
    pub fetch_backoff_base_ms: u64,
    pub fetch_backoff_max_ms: u64,
    pub fetch_timeout_secs: u64,
    /// When `false`, a payload without a `reservations` array fails the fetch
    /// immediately instead of being retried like a transport failure.
    pub fetch_retry_schema_errors: bool,
    pub relay_url: String,
    pub relay_min_interval_ms: u64,
    pub relay_timeout_secs: u64,
    pub threads_path: PathBuf,
    pub user_agent: String,
}
