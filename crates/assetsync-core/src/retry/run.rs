//! Retry loop: run a closure until success or policy says stop.

use super::classify;
use super::policy::{RetryDecision, RetryPolicy};
use crate::error::AssetError;

/// Runs a closure until it succeeds or the retry policy says to stop.
/// On retryable failure, sleeps for the backoff duration then tries again.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, mut f: F) -> Result<T, AssetError>
where
    F: FnMut() -> Result<T, AssetError>,
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(d) => {
                        tracing::info!(attempt, ?kind, "transfer failed, retrying in {:?}: {}", d, e);
                        std::thread::sleep(d);
                        attempt += 1;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelError;
    use std::time::Duration;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[test]
    fn retries_network_failures_until_success() {
        let mut calls = 0;
        let out = run_with_retry(&fast_policy(5), || {
            calls += 1;
            if calls < 3 {
                Err(AssetError::NetworkTransfer(ChannelError::Http(502)))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(out.unwrap(), 3);
    }

    #[test]
    fn does_not_retry_final_errors() {
        let mut calls = 0;
        let out: Result<(), _> = run_with_retry(&fast_policy(5), || {
            calls += 1;
            Err(AssetError::Cancelled)
        });
        assert!(matches!(out, Err(AssetError::Cancelled)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut calls = 0;
        let out: Result<(), _> = run_with_retry(&fast_policy(3), || {
            calls += 1;
            Err(AssetError::NetworkTransfer(ChannelError::Http(503)))
        });
        assert!(out.is_err());
        assert_eq!(calls, 3);
    }
}
