//! Retry logic with exponential backoff for transient API failures.
//!
//! A failed attempt is classified into a [`FailureType`]:
//! - [`FailureType::Transient`] - connection failures, timeouts, 5xx responses
//! - [`FailureType::Permanent`] - rejected input, malformed responses, local errors
//! - [`FailureType::NeedsAuth`] - 401/403; retrying with the same credentials cannot help
//!
//! [`RetryPolicy`] then decides whether another attempt is made and how long
//! to wait first.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use protopred::transport::{RetryDecision, RetryPolicy, FailureType};
//!
//! let policy = RetryPolicy::new(3, Duration::from_secs(1));
//! match policy.should_retry(FailureType::Transient, 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         assert_eq!(delay, Duration::from_secs(1));
//!         assert_eq!(attempt, 2);
//!     }
//!     RetryDecision::DoNotRetry { reason } => panic!("{reason}"),
//! }
//! ```

use std::time::Duration;

use tracing::{debug, instrument};

use crate::constants::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY};
use crate::error::ProtoPredError;

/// Classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// May succeed on retry: connection errors, timeouts, 5xx.
    Transient,

    /// Will not succeed regardless of retries.
    Permanent,

    /// Credentials were rejected.
    NeedsAuth,
}

/// Decision on whether to make another attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Give up and surface the error.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Exponential backoff without jitter.
///
/// # Delay Calculation
///
/// ```text
/// delay = base_delay * 2^retry      (retry counted from 0)
/// ```
///
/// With defaults, delays are 1s, 2s, 4s and at most 4 attempts are made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the initial attempt.
    max_retries: u32,

    /// Delay before the first retry.
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts allowed, including the initial one.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Decides whether to retry after `attempt` (1-indexed) failed.
    #[instrument(skip(self), fields(max_retries = self.max_retries))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        match failure_type {
            FailureType::Permanent => {
                return RetryDecision::DoNotRetry {
                    reason: "permanent failure - retry would not help".to_string(),
                };
            }
            FailureType::NeedsAuth => {
                return RetryDecision::DoNotRetry {
                    reason: "credentials rejected - retry would not help".to_string(),
                };
            }
            FailureType::Transient => {}
        }

        if attempt >= self.max_attempts() {
            debug!(attempt, max = self.max_attempts(), "retries exhausted");
            return RetryDecision::DoNotRetry {
                reason: format!("max retries ({}) exhausted", self.max_retries),
            };
        }

        let delay = self.delay_for_retry(attempt.saturating_sub(1));
        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Delay before retry number `retry` (0-indexed): `base_delay * 2^retry`.
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Classifies a failed attempt for retry decisions.
///
/// # Classification
///
/// | Error | Type | Rationale |
/// |-------|------|-----------|
/// | Network (most) | Transient | Connection may recover |
/// | Network (TLS) | Permanent | Certificate/config issue |
/// | Timeout | Transient | Server may answer next time |
/// | Api with 5xx | Transient | Server error - may be temporary |
/// | Api otherwise | Permanent | Error payload or malformed body |
/// | Authentication | NeedsAuth | Same credentials fail again |
/// | Validation | Permanent | Includes every 4xx other than 401/403, 429 too |
/// | File | Permanent | Local file system issue |
#[instrument(skip(error), fields(error = %error))]
pub fn classify_error(error: &ProtoPredError) -> FailureType {
    match error {
        ProtoPredError::Network { source, .. } => {
            if is_tls_error(source) {
                FailureType::Permanent
            } else {
                FailureType::Transient
            }
        }

        ProtoPredError::Timeout { .. } => FailureType::Transient,

        ProtoPredError::Api {
            status: Some(status),
            ..
        } if (500..600).contains(status) => FailureType::Transient,

        ProtoPredError::Authentication { .. } => FailureType::NeedsAuth,

        ProtoPredError::Api { .. } | ProtoPredError::Validation { .. } | ProtoPredError::File { .. } => {
            FailureType::Permanent
        }
    }
}

/// Checks if a reqwest error is a TLS/certificate error.
fn is_tls_error(error: &reqwest::Error) -> bool {
    let mut messages = vec![error.to_string().to_lowercase()];
    let mut source = std::error::Error::source(error);
    while let Some(inner) = source {
        messages.push(inner.to_string().to_lowercase());
        source = std::error::Error::source(inner);
    }
    messages.iter().any(|message| {
        message.contains("certificate")
            || message.contains("tls")
            || message.contains("ssl")
            || message.contains("handshake")
    })
}
