//! Reads the processed reservation dataset and turns it into [`ProcessedData`].
//!
//! Each attempt reads the source once and checks the envelope shape. The
//! attempt sequence is driven by [`retry_with_backoff`]; only a payload that
//! passes validation reaches the normalizer.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::{Client, Url};
use resdesk_core::normalize::{normalize_batch, normalize_metadata};
use resdesk_core::{AppConfig, ProcessedData};
use serde_json::Value;

use crate::error::FetchError;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Where the dataset is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Url(Url),
    File(PathBuf),
}

impl DataSource {
    /// `http://` and `https://` strings become URLs; anything else is a path.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidSource`] for a blank string or an
    /// unparseable URL.
    pub fn parse(source: &str) -> Result<Self, FetchError> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(FetchError::InvalidSource {
                source_str: source.to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            let url = Url::parse(trimmed).map_err(|e| FetchError::InvalidSource {
                source_str: source.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(Self::Url(url));
        }
        Ok(Self::File(PathBuf::from(trimmed)))
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Url(url) => write!(f, "{url}"),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetches the dataset with bounded retries.
pub struct ReservationFetcher {
    client: Client,
    source: DataSource,
    policy: RetryPolicy,
    retry_schema_errors: bool,
}

impl ReservationFetcher {
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        source: DataSource,
        policy: RetryPolicy,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            source,
            policy,
            retry_schema_errors: true,
        })
    }

    /// Builds a fetcher from the `RESDESK_DATA_SOURCE` and `RESDESK_FETCH_*`
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidSource`] if the data source is unusable or
    /// [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        let policy = RetryPolicy {
            max_attempts: config.fetch_max_attempts,
            base_delay: Duration::from_millis(config.fetch_backoff_base_ms),
            max_delay: Duration::from_millis(config.fetch_backoff_max_ms),
        };
        let fetcher = Self::new(
            DataSource::parse(&config.data_source)?,
            policy,
            Duration::from_secs(config.fetch_timeout_secs),
            &config.user_agent,
        )?;
        Ok(fetcher.with_retry_schema_errors(config.fetch_retry_schema_errors))
    }

    /// When `false`, an envelope without a `reservations` array fails at once
    /// instead of being retried.
    #[must_use]
    pub fn with_retry_schema_errors(mut self, retry: bool) -> Self {
        self.retry_schema_errors = retry;
        self
    }

    /// Fetches, validates and normalizes the dataset.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's [`FetchError`] once every attempt has
    /// failed, or the first non-retriable one.
    pub async fn fetch(&self) -> Result<ProcessedData, FetchError> {
        let retry_schema_errors = self.retry_schema_errors;
        let envelope = retry_with_backoff(
            &self.policy,
            |err| is_retriable(err, retry_schema_errors),
            || self.fetch_validated(),
        )
        .await?;

        let metadata = normalize_metadata(envelope.get("metadata"));
        let raw = envelope
            .get("reservations")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let reservations = normalize_batch(raw);
        tracing::info!(
            source = %self.source,
            count = reservations.len(),
            "reservation dataset loaded"
        );
        Ok(ProcessedData {
            metadata,
            reservations,
        })
    }

    async fn fetch_validated(&self) -> Result<Value, FetchError> {
        let payload = self.fetch_raw().await?;
        validate_payload(&payload)?;
        Ok(payload)
    }

    /// One read of the source, decoded as JSON.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Http`] on network failure.
    /// - [`FetchError::UnexpectedStatus`] on a non-2xx response.
    /// - [`FetchError::Io`] if the file cannot be read.
    /// - [`FetchError::Deserialize`] if the body is not JSON.
    pub async fn fetch_raw(&self) -> Result<Value, FetchError> {
        let body = match &self.source {
            DataSource::Url(url) => {
                let response = self.client.get(url.clone()).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }
                response.text().await?
            }
            DataSource::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| FetchError::Io {
                        path: path.clone(),
                        source,
                    })?
            }
        };
        serde_json::from_str(&body).map_err(|source| FetchError::Deserialize {
            context: self.source.to_string(),
            source,
        })
    }
}

/// Checks that `payload` is an object carrying a `reservations` array.
///
/// # Errors
///
/// Returns [`FetchError::InvalidFormat`] describing what is wrong.
pub fn validate_payload(payload: &Value) -> Result<(), FetchError> {
    let Some(envelope) = payload.as_object() else {
        return Err(FetchError::InvalidFormat(
            "expected a JSON object at the top level".to_string(),
        ));
    };
    match envelope.get("reservations") {
        Some(Value::Array(_)) => Ok(()),
        Some(_) => Err(FetchError::InvalidFormat(
            "`reservations` is not an array".to_string(),
        )),
        None => Err(FetchError::InvalidFormat(
            "missing `reservations` array".to_string(),
        )),
    }
}

fn is_retriable(err: &FetchError, retry_schema_errors: bool) -> bool {
    match err {
        FetchError::InvalidFormat(_) => retry_schema_errors,
        FetchError::InvalidSource { .. } => false,
        FetchError::Http(_)
        | FetchError::Io { .. }
        | FetchError::UnexpectedStatus { .. }
        | FetchError::Deserialize { .. } => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_recognizes_urls_and_paths() {
        assert!(matches!(
            DataSource::parse("https://example.com/processed_output.json").unwrap(),
            DataSource::Url(_)
        ));
        assert_eq!(
            DataSource::parse(" ./data/processed_output.json ").unwrap(),
            DataSource::File(PathBuf::from("./data/processed_output.json"))
        );
    }

    #[test]
    fn parse_rejects_blank_and_malformed_urls() {
        assert!(matches!(
            DataSource::parse("  "),
            Err(FetchError::InvalidSource { .. })
        ));
        assert!(matches!(
            DataSource::parse("http://"),
            Err(FetchError::InvalidSource { .. })
        ));
    }

    #[test]
    fn validate_payload_accepts_envelope() {
        let payload = json!({ "metadata": {}, "reservations": [] });
        assert!(validate_payload(&payload).is_ok());
    }

    #[test]
    fn validate_payload_rejects_bad_shapes() {
        for payload in [
            json!([]),
            json!({ "metadata": {} }),
            json!({ "reservations": { "0": {} } }),
            json!("reservations"),
        ] {
            assert!(
                matches!(validate_payload(&payload), Err(FetchError::InvalidFormat(_))),
                "expected InvalidFormat for {payload}"
            );
        }
    }

    #[test]
    fn schema_errors_follow_the_configured_policy() {
        let err = FetchError::InvalidFormat("x".to_string());
        assert!(is_retriable(&err, true));
        assert!(!is_retriable(&err, false));
    }

    #[test]
    fn transport_errors_are_retriable() {
        let status = FetchError::UnexpectedStatus {
            status: 503,
            url: "https://example.com".to_string(),
        };
        assert!(is_retriable(&status, false));
        let io = FetchError::Io {
            path: PathBuf::from("missing.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(is_retriable(&io, false));
    }
}
