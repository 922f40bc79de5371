//! Network transport for the ProtoPRED API.
//!
//! - [`HttpTransport`] sends built payloads and maps HTTP statuses to errors
//! - [`RetryPolicy`] and [`classify_error`] decide which failures are retried

mod http;
mod retry;

pub use http::{HttpTransport, RawResponse};
pub use retry::{FailureType, RetryDecision, RetryPolicy, classify_error};
