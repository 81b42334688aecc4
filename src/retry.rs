//! Retry utilities with exponential backoff and jitter.
//!
//! A single generic helper parameterized by the error's retry classification
//! (`Error::is_retriable`), an attempt budget, and a backoff schedule —
//! rather than scattering ad-hoc retry loops through the LLM client and
//! browser tool.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

use crate::error::Error;

/// Backoff schedule: base delay doubles each attempt, capped, with +/-20%
/// jitter to avoid thundering-herd retries against the same endpoint.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
    pub max_attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(250),
            max: Duration::from_secs(8),
            max_attempts: 3,
        }
    }
}

impl Backoff {
    fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.base.saturating_mul(1u32 << attempt.min(10));
        let capped = exp.min(self.max);
        let jitter_frac = rand::thread_rng().gen_range(0.8..1.2);
        Duration::from_secs_f64(capped.as_secs_f64() * jitter_frac)
    }
}

/// Run `op` up to `backoff.max_attempts` times, retrying only while the
/// returned error is classified retriable by `Error::is_retriable`. Sleeps
/// between attempts using the jittered exponential schedule. Returns the
/// last error once attempts are exhausted or a non-retriable error occurs.
pub async fn retry_with_backoff<T, F, Fut>(backoff: Backoff, mut op: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retriable() && attempt + 1 < backoff.max_attempts => {
                let delay = backoff.delay_for(attempt);
                log::warn!(
                    "retrying after error (attempt {}/{}, kind={}): {}",
                    attempt + 1,
                    backoff.max_attempts,
                    err.kind(),
                    err
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn retries_transient_errors_up_to_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();
        let backoff = Backoff {
            base: Duration::from_millis(1),
            max: Duration::from_millis(5),
            max_attempts: 3,
        };

        let result: Result<(), Error> = retry_with_backoff(backoff, move || {
            let calls = calls2.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::transient_network("boom"))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls2 = calls.clone();
        let backoff = Backoff::default();

        let result: Result<(), Error> = retry_with_backoff(backoff, move || {
            let calls = calls2.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::llm_contract("bad shape"))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_without_retry_when_first_attempt_ok() {
        let result = retry_with_backoff(Backoff::default(), || async { Ok::<_, Error>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }
}
