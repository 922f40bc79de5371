//! Account credentials and client tunables.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::constants::{BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT};
use crate::error::ProtoPredError;

/// Environment variable holding the account token.
pub const ENV_ACCOUNT_TOKEN: &str = "PROTOPRED_ACCOUNT_TOKEN";
/// Environment variable holding the account secret key.
pub const ENV_SECRET_KEY: &str = "PROTOPRED_SECRET_KEY";
/// Environment variable holding the account user name.
pub const ENV_ACCOUNT_USER: &str = "PROTOPRED_ACCOUNT_USER";

/// ProtoPRED account credentials, sent with every request.
///
/// `Debug` output redacts the token and secret key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
    secret_key: String,
    user: String,
}

impl Credentials {
    /// Creates credentials, rejecting blank values.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoPredError::Validation`] naming the first blank field.
    pub fn new(
        token: impl Into<String>,
        secret_key: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<Self, ProtoPredError> {
        let credentials = Self {
            token: token.into(),
            secret_key: secret_key.into(),
            user: user.into(),
        };
        for (field, value) in [
            ("account_token", &credentials.token),
            ("account_secret_key", &credentials.secret_key),
            ("account_user", &credentials.user),
        ] {
            if value.trim().is_empty() {
                return Err(ProtoPredError::validation(format!(
                    "{field} must not be empty"
                )));
            }
        }
        Ok(credentials)
    }

    /// Reads credentials from `PROTOPRED_ACCOUNT_TOKEN`,
    /// `PROTOPRED_SECRET_KEY` and `PROTOPRED_ACCOUNT_USER`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoPredError::Validation`] if a variable is unset or blank.
    pub fn from_env() -> Result<Self, ProtoPredError> {
        let read = |name: &str| {
            std::env::var(name).map_err(|_| {
                ProtoPredError::validation(format!("environment variable {name} is not set"))
            })
        };
        Self::new(
            read(ENV_ACCOUNT_TOKEN)?,
            read(ENV_SECRET_KEY)?,
            read(ENV_ACCOUNT_USER)?,
        )
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// Client tunables.
///
/// # Default Values
///
/// - `base_url`: [`BASE_URL`]
/// - `timeout`: 30 seconds per attempt
/// - `max_retries`: 3
/// - `retry_delay`: 1 second
/// - `validate_models`: true
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
    validate_models: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            validate_models: true,
        }
    }
}

impl ClientConfig {
    /// Sets the endpoint. The URL is used byte-for-byte; a missing
    /// trailing slash is not added.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how many times a transient failure is retried.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the backoff base: retry `n` (from 0) waits `retry_delay * 2^n`.
    #[must_use]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Enables or disables the built-in model catalog check.
    #[must_use]
    pub fn with_model_validation(mut self, enabled: bool) -> Self {
        self.validate_models = enabled;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    #[must_use]
    pub fn validate_models(&self) -> bool {
        self.validate_models
    }

    /// Checks the base URL is an absolute http(s) URL and the timeout is non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoPredError::Validation`] describing the bad value.
    pub fn validate(&self) -> Result<(), ProtoPredError> {
        let parsed = Url::parse(&self.base_url).map_err(|e| {
            ProtoPredError::validation(format!("invalid base URL '{}': {e}", self.base_url))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProtoPredError::validation(format!(
                "base URL '{}' must use http or https",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(ProtoPredError::validation("timeout must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_reject_blank_fields() {
        let err = Credentials::new("token", " ", "user").unwrap_err();
        assert!(err.to_string().contains("account_secret_key"));
        assert!(Credentials::new("", "secret", "user").is_err());
        assert!(Credentials::new("token", "secret", "").is_err());
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let credentials = Credentials::new("tok-123", "sec-456", "alice").unwrap();
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("tok-123"));
        assert!(!debug.contains("sec-456"));
        assert!(debug.contains("alice"));
    }

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url(), "https://protopred.protoqsar.com/API/v2/");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_retries(), 3);
        assert_eq!(config.retry_delay(), Duration::from_secs(1));
        assert!(config.validate_models());
    }

    #[test]
    fn test_base_url_is_not_rewritten() {
        let config = ClientConfig::default().with_base_url("https://example.com/API/v2");
        assert_eq!(config.base_url(), "https://example.com/API/v2");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ClientConfig::default().with_base_url("not a url").validate().is_err());
        assert!(ClientConfig::default().with_base_url("ftp://example.com/").validate().is_err());
        assert!(ClientConfig::default().with_timeout(Duration::ZERO).validate().is_err());
    }
}
