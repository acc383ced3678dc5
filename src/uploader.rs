//! Bounded-retry delivery combinator.
//!
//! Artifact delivery tolerates the sink being transiently unavailable:
//! each call is retried up to a fixed number of attempts with a fixed wait
//! between them. The caller decides whether an exhausted budget is fatal.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use log::{info, warn};
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;

use crate::config::{UPLOAD_MAX_ATTEMPTS, UPLOAD_RETRY_WAIT_SECS};

/// How persistently a single artifact delivery is retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub max_attempts: usize,
    /// Fixed wait between attempts.
    pub wait: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, wait: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            wait,
        }
    }

    /// Fixed-interval retry schedule: one wait between each pair of
    /// attempts, none before the first.
    fn strategy(&self) -> impl Iterator<Item = Duration> {
        FixedInterval::new(self.wait).take(self.max_attempts.saturating_sub(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(
            UPLOAD_MAX_ATTEMPTS,
            Duration::from_secs(UPLOAD_RETRY_WAIT_SECS),
        )
    }
}

/// Invokes `op` until it succeeds or the retry budget is exhausted.
///
/// Returns the first success value; after the final failed attempt the
/// last error is returned so the caller can decide whether that artifact's
/// loss is fatal. Attempt bookkeeping is transient and never persisted.
pub async fn try_upload<T, E, F, Fut>(what: &str, policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = AtomicUsize::new(0);
    let max_attempts = policy.max_attempts;

    Retry::spawn(policy.strategy(), || {
        let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
        info!("Delivering {what} (attempt {attempt}/{max_attempts})");
        let fut = op();
        async move {
            match fut.await {
                Ok(value) => Ok(value),
                Err(e) => {
                    warn!("Delivery of {what} failed (attempt {attempt}/{max_attempts}): {e}");
                    Err(e)
                }
            }
        }
    })
    .await
}
