//! HTTP client for the message-generation relay.
//!
//! Every call passes through a shared [`MessageRateLimiter`] first. A call
//! that clears the gate has used its slot even if the relay then fails.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use resdesk_core::{AppConfig, Reservation};
use serde::Serialize;
use serde_json::Value;

use crate::error::RelayError;
use crate::rate_limit::MessageRateLimiter;

const GENERATE_PATH: &str = "api/messages/generate";
const DEFAULT_SERVICE_ERROR: &str = "Failed to generate message";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    message: &'a str,
    reservation_context: &'a Reservation,
}

pub struct RelayClient {
    client: Client,
    endpoint: Url,
    limiter: Arc<MessageRateLimiter>,
}

impl RelayClient {
    /// # Errors
    ///
    /// Returns [`RelayError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`RelayError::InvalidUrl`] if `base_url` is not a valid URL.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        user_agent: &str,
        limiter: Arc<MessageRateLimiter>,
    ) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join(GENERATE_PATH))
            .map_err(|e| RelayError::InvalidUrl {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint,
            limiter,
        })
    }

    /// Builds a client from the `RESDESK_RELAY_*` settings, owning a fresh
    /// limiter with the configured interval.
    ///
    /// # Errors
    ///
    /// See [`RelayClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, RelayError> {
        let limiter = Arc::new(MessageRateLimiter::new(Duration::from_millis(
            config.relay_min_interval_ms,
        )));
        Self::new(
            &config.relay_url,
            Duration::from_secs(config.relay_timeout_secs),
            &config.user_agent,
            limiter,
        )
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Asks the relay to draft a reply to `message` about `reservation`.
    ///
    /// # Errors
    ///
    /// - [`RelayError::EmptyMessage`] for a blank message; no slot is used.
    /// - [`RelayError::RateLimited`] when the gate rejects the call.
    /// - [`RelayError::Unreachable`] when the request cannot be delivered.
    /// - [`RelayError::NonJsonResponse`] if the reply is not declared JSON.
    /// - [`RelayError::Service`] on a non-2xx status, whatever the body.
    /// - [`RelayError::MalformedReply`] if a 2xx body has no `response` text.
    pub async fn generate_reply(
        &self,
        message: &str,
        reservation: &Reservation,
    ) -> Result<String, RelayError> {
        if message.trim().is_empty() {
            return Err(RelayError::EmptyMessage);
        }
        self.limiter.try_acquire()?;

        let body = GenerateRequest {
            message,
            reservation_context: reservation,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("application/json") {
            return Err(RelayError::NonJsonResponse { content_type });
        }

        let text = response.text().await.map_err(classify_send_error)?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|payload| {
                    payload
                        .get("error")
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| DEFAULT_SERVICE_ERROR.to_string());
            tracing::warn!(status = status.as_u16(), %message, "relay returned an error");
            return Err(RelayError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let payload: Value = serde_json::from_str(&text)
            .map_err(|e| RelayError::MalformedReply(format!("invalid JSON body: {e}")))?;

        match payload.get("response").and_then(Value::as_str) {
            Some(reply) if !reply.is_empty() => Ok(reply.to_string()),
            _ => Err(RelayError::MalformedReply(
                "missing `response` field".to_string(),
            )),
        }
    }
}

fn classify_send_error(err: reqwest::Error) -> RelayError {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        RelayError::Unreachable(err)
    } else {
        RelayError::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> RelayClient {
        RelayClient::new(
            base_url,
            Duration::from_secs(5),
            "resdesk-test",
            Arc::new(MessageRateLimiter::default()),
        )
        .expect("client construction should not fail")
    }

    #[test]
    fn endpoint_appends_generate_path() {
        assert_eq!(
            client("http://localhost:5002").endpoint().as_str(),
            "http://localhost:5002/api/messages/generate"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_and_strips_trailing_slash() {
        assert_eq!(
            client("https://relay.example.com/v1/").endpoint().as_str(),
            "https://relay.example.com/v1/api/messages/generate"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = RelayClient::new(
            "not a url",
            Duration::from_secs(5),
            "resdesk-test",
            Arc::new(MessageRateLimiter::default()),
        );
        assert!(matches!(result, Err(RelayError::InvalidUrl { .. })));
    }
}
