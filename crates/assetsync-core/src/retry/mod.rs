//! Caller-side retry and backoff.
//!
//! The engine never retries. This layer sits outside it: it classifies a
//! terminal `AssetError` (timeouts, throttling, connection failures) and
//! decides whether to run the whole transfer again after a backoff. Only
//! network transfer failures are ever retried; integrity, decryption, and
//! rejection errors are final.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_channel_error, classify_curl_error, classify_http_status};
pub use policy::{FailureKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
