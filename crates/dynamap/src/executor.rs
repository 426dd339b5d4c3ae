//! Resilient execution of store calls.
//!
//! Every remote call in this crate goes through [`Executor::execute`] (or
//! its passthrough variant). Failures are classified on every attempt by
//! [`dynamap_core::retry::classify`]; retryable failures back off
//! exponentially until the wall-clock budget measured from the first
//! attempt runs out.

use std::future::Future;
use std::sync::Arc;

use tokio::time::{sleep, Instant};

use dynamap_core::retry::{classify, Disposition, RetryPolicy};
use dynamap_core::store::{StoreError, StoreResult};
use dynamap_core::{Error, Result};

/// Retrying wrapper around store calls. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    policy: Arc<RetryPolicy>,
}

impl Executor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `operation` until it succeeds, fails fatally or the retry budget
    /// is spent.
    pub async fn execute<T, F, Fut>(&self, op: &str, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        self.execute_passthrough(op, &[], operation).await
    }

    /// Like [`execute`](Self::execute), but errors whose code is listed in
    /// `passthrough` are returned unchanged as [`Error::Store`] without retry.
    pub async fn execute_passthrough<T, F, Fut>(
        &self,
        op: &str,
        passthrough: &[&str],
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let started = Instant::now();
        let mut attempts: u32 = 0;
        let mut first: Option<StoreError> = None;

        loop {
            attempts += 1;
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            match classify(&err, &self.policy, passthrough) {
                Disposition::Rethrow => return Err(Error::Store(err)),
                Disposition::Fatal => {
                    tracing::error!(op, attempt = attempts, code = %err.code, error = %err, "Store rejected request");
                    return Err(Error::ClientRejected(err));
                }
                Disposition::Retry => {}
            }

            let elapsed = started.elapsed();
            if attempts > 1 && elapsed >= self.policy.timeout {
                let first = first.unwrap_or(err);
                tracing::error!(op, attempts, ?elapsed, code = %first.code, "Retry budget exhausted");
                return Err(Error::Timeout {
                    first,
                    attempts,
                    elapsed,
                });
            }

            let remaining = self.policy.timeout.saturating_sub(elapsed);
            let delay = self.policy.backoff(attempts - 1).min(remaining);
            tracing::warn!(op, attempt = attempts, code = %err.code, ?delay, "Retrying store call");

            if first.is_none() {
                first = Some(err);
            }
            sleep(delay).await;
        }
    }
}
