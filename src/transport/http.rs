//! HTTP transport: POSTs a [`WirePayload`] to the configured endpoint,
//! retrying transient failures and mapping HTTP statuses to errors.
//!
//! # Status Mapping
//!
//! | Response | Outcome |
//! |----------|---------|
//! | 2xx | [`RawResponse`] handed to the adapter |
//! | 401, 403 | [`ProtoPredError::Authentication`], not retried |
//! | other 4xx | [`ProtoPredError::Validation`] with the server message, not retried |
//! | 5xx | retried; [`ProtoPredError::Api`] once retries run out |
//! | anything else | [`ProtoPredError::Api`] (redirects are not followed) |

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, redirect};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::retry::{RetryDecision, RetryPolicy, classify_error};
use crate::config::ClientConfig;
use crate::constants::{EXTRA_JSON_HEADER, INPUT_DATA_FIELD};
use crate::error::ProtoPredError;
use crate::request::{InputData, WirePayload};
use crate::user_agent;

/// Longest server message kept from a non-JSON error body.
const MAX_ERROR_TEXT: usize = 200;

/// A successful (2xx) response, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header, if present.
    pub content_type: Option<String>,
    /// `X-Extra-JSON` header, if present.
    pub extra_json: Option<String>,
    /// Response body bytes.
    pub body: Vec<u8>,
}

/// Sends requests with retry and backoff. Created once per client and
/// reused so connections are pooled.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    timeout: Duration,
    policy: RetryPolicy,
}

impl HttpTransport {
    /// Builds the transport from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoPredError::Validation`] if the configuration is
    /// invalid or the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ProtoPredError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .redirect(redirect::Policy::none())
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .map_err(|e| ProtoPredError::validation(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            timeout: config.timeout(),
            policy: RetryPolicy::new(config.max_retries(), config.retry_delay()),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sends `payload`, retrying transient failures per the retry policy.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt; see the module docs for the
    /// status mapping.
    #[instrument(skip(self, payload), fields(url = %self.base_url))]
    pub async fn send(&self, payload: &WirePayload) -> Result<RawResponse, ProtoPredError> {
        debug!(fields = ?payload.loggable_fields(), "sending prediction request");
        let mut attempt = 1;
        loop {
            match self.send_once(payload, attempt).await {
                Ok(response) => {
                    if attempt > 1 {
                        info!(attempt, "request succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(error) => {
                    let failure_type = classify_error(&error);
                    match self.policy.should_retry(failure_type, attempt) {
                        RetryDecision::Retry {
                            delay,
                            attempt: next_attempt,
                        } => {
                            warn!(
                                attempt = next_attempt,
                                max_attempts = self.policy.max_attempts(),
                                delay_ms = delay.as_millis(),
                                error = %error,
                                "retrying request"
                            );
                            tokio::time::sleep(delay).await;
                            attempt = next_attempt;
                        }
                        RetryDecision::DoNotRetry { reason } => {
                            debug!(%reason, attempt, "not retrying request");
                            return Err(error);
                        }
                    }
                }
            }
        }
    }

    async fn send_once(
        &self,
        payload: &WirePayload,
        attempt: u32,
    ) -> Result<RawResponse, ProtoPredError> {
        let action = format!("POST {}", self.base_url);
        let request = self.client.post(&self.base_url);
        let request = match payload.input_data() {
            InputData::Text(_) => request.form(&payload.form_pairs()),
            InputData::Json(_) => request.json(&payload.json_body()),
            InputData::File(_) => request.multipart(multipart_form(payload)?),
        };

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(&action, attempt, e))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&action, attempt, e))?
            .to_vec();
        debug!(status, bytes = body.len(), attempt, "response received");

        match status {
            200..=299 => Ok(RawResponse {
                status,
                content_type: header_string(&headers, CONTENT_TYPE.as_str()),
                extra_json: header_string(&headers, EXTRA_JSON_HEADER),
                body,
            }),
            401 | 403 => Err(ProtoPredError::authentication(
                status,
                server_message(&body, status),
            )),
            400..=499 => Err(ProtoPredError::rejected(status, server_message(&body, status))),
            _ => Err(ProtoPredError::api(Some(status), server_message(&body, status))),
        }
    }

    fn transport_error(&self, action: &str, attempt: u32, error: reqwest::Error) -> ProtoPredError {
        if error.is_timeout() {
            ProtoPredError::timeout(action, attempt, self.timeout)
        } else {
            ProtoPredError::network(action, attempt, error)
        }
    }
}

/// Builds a fresh multipart form; forms are consumed on send.
fn multipart_form(payload: &WirePayload) -> Result<Form, ProtoPredError> {
    let InputData::File(upload) = payload.input_data() else {
        return Err(ProtoPredError::validation("multipart request without a file part"));
    };
    let part = Part::bytes(upload.bytes.clone())
        .file_name(upload.file_name.clone())
        .mime_str(upload.mime)
        .map_err(|e| ProtoPredError::validation(format!("invalid upload MIME type: {e}")))?;
    let form = payload
        .fields()
        .iter()
        .fold(Form::new(), |form, (name, value)| form.text(*name, value.clone()));
    Ok(form.part(INPUT_DATA_FIELD, part))
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Extracts a human-readable message from an error response body.
///
/// Prefers the JSON `error`, `message` or `detail` string; falls back to
/// the trimmed body text, then to the status reason phrase.
pub(crate) fn server_message(body: &[u8], status: u16) -> String {
    if let Ok(Value::Object(object)) = serde_json::from_slice::<Value>(body) {
        for key in ["error", "message", "detail"] {
            if let Some(Value::String(message)) = object.get(key) {
                return message.clone();
            }
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if !text.is_empty() {
        return text.chars().take(MAX_ERROR_TEXT).collect();
    }

    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map_or_else(|| format!("HTTP {status}"), str::to_string)
}
