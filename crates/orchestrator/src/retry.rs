//! Backoff for transient stage failures. A stage executor tags
//! its own errors transient or permanent; only transient ones get retried.

use crate::executor::StageError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY: Duration = Duration::from_millis(250);

/// `RetryAttempts`/`RetryDelay` from spec 4.8, configurable per
/// [`crate::Orchestrator`] instance rather than baked into the constants
/// above (which remain the defaults and back the existing unit tests).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
	pub max_attempts: u32,
	pub base_delay: Duration,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self { max_attempts: MAX_ATTEMPTS, base_delay: BASE_DELAY }
	}
}

/// Outcome of a retry loop that was asked to stop early via cancellation.
pub enum RetryOutcome<T> {
	Done(T),
	Cancelled,
}

/// Retries `f` up to [`RetryPolicy::max_attempts`] times with exponential
/// backoff, stopping immediately on a permanent error or on `cancel` firing.
/// A cancelled wait returns untouched.
pub async fn retry_with_backoff<F, Fut, T>(policy: RetryPolicy, cancel: &CancellationToken, mut f: F) -> RetryOutcome<Result<T, (StageError, u32)>>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, StageError>>,
{
	let mut attempt = 0;
	loop {
		attempt += 1;
		let outcome = tokio::select! {
			biased;
			_ = cancel.cancelled() => return RetryOutcome::Cancelled,
			outcome = f() => outcome,
		};
		match outcome {
			Ok(value) => return RetryOutcome::Done(Ok(value)),
			Err(err) if !err.transient || attempt >= policy.max_attempts => return RetryOutcome::Done(Err((err, attempt))),
			Err(_) => {
				let delay = policy.base_delay * 2u32.pow(attempt - 1);
				tokio::select! {
					biased;
					_ = cancel.cancelled() => return RetryOutcome::Cancelled,
					_ = tokio::time::sleep(delay) => {}
				}
			}
		}
	}
}

/// Test/simple-call convenience: runs with the default policy and a token
/// that is never cancelled.
#[cfg(test)]
async fn retry_with_defaults<F, Fut, T>(f: F) -> Result<T, (StageError, u32)>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, StageError>>,
{
	match retry_with_backoff(RetryPolicy::default(), &CancellationToken::new(), f).await {
		RetryOutcome::Done(result) => result,
		RetryOutcome::Cancelled => unreachable!("token is never cancelled in this helper"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};

	#[tokio::test]
	async fn permanent_error_short_circuits_on_the_first_attempt() {
		let calls = AtomicU32::new(0);
		let result: Result<(), _> = retry_with_defaults(|| {
			calls.fetch_add(1, Ordering::SeqCst);
			async { Err(StageError::permanent("nope")) }
		})
		.await;
		assert!(result.is_err());
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn transient_error_retries_until_success() {
		let calls = AtomicU32::new(0);
		let result = retry_with_defaults(|| {
			let n = calls.fetch_add(1, Ordering::SeqCst);
			async move { if n < 2 { Err(StageError::transient("flaky")) } else { Ok(42) } }
		})
		.await;
		assert_eq!(result.unwrap(), 42);
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn transient_error_gives_up_after_max_attempts() {
		let calls = AtomicU32::new(0);
		let result: Result<(), _> = retry_with_defaults(|| {
			calls.fetch_add(1, Ordering::SeqCst);
			async { Err(StageError::transient("always flaky")) }
		})
		.await;
		let (_, attempts) = result.unwrap_err();
		assert_eq!(attempts, MAX_ATTEMPTS);
		assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
	}

	#[tokio::test]
	async fn cancellation_is_observed_immediately() {
		let cancel = CancellationToken::new();
		cancel.cancel();
		let calls = AtomicU32::new(0);
		let outcome = retry_with_backoff(RetryPolicy::default(), &cancel, || {
			calls.fetch_add(1, Ordering::SeqCst);
			async { Err(StageError::transient("flaky")) }
		})
		.await;
		assert!(matches!(outcome, RetryOutcome::Cancelled));
	}
}
