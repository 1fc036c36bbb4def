// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Retry logic with exponential backoff for idempotent HTTP requests.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::warn;

/// Status codes that indicate a transient upstream condition.
pub const RETRYABLE_STATUSES: [StatusCode; 6] = [
	StatusCode::TOO_MANY_REQUESTS,
	StatusCode::REQUEST_TIMEOUT,
	StatusCode::INTERNAL_SERVER_ERROR,
	StatusCode::BAD_GATEWAY,
	StatusCode::SERVICE_UNAVAILABLE,
	StatusCode::GATEWAY_TIMEOUT,
];

/// Backoff policy for [`retry`].
#[derive(Debug, Clone)]
pub struct RetryConfig {
	/// Total attempts including the first one. `1` disables retrying.
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub backoff_factor: f64,
	/// Scale each delay by a random factor in `[0.5, 1.5)`.
	pub jitter: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_millis(200),
			max_delay: Duration::from_secs(5),
			backoff_factor: 2.0,
			jitter: true,
		}
	}
}

impl RetryConfig {
	/// A policy that sends exactly once.
	pub fn no_retry() -> Self {
		Self {
			max_attempts: 1,
			..Self::default()
		}
	}

	/// Delay before retry number `retry_index` (zero-based).
	pub fn delay_for(&self, retry_index: u32) -> Duration {
		let exponent = i32::try_from(retry_index).unwrap_or(i32::MAX);
		let raw = self.base_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
		let capped = raw.min(self.max_delay.as_secs_f64());

		let scaled = if self.jitter {
			capped * (0.5 + fastrand::f64())
		} else {
			capped
		};

		Duration::from_secs_f64(scaled)
	}
}

/// Decides whether a failed attempt is worth repeating.
pub trait RetryableError {
	fn is_retryable(&self) -> bool;
}

impl RetryableError for reqwest::Error {
	fn is_retryable(&self) -> bool {
		if self.is_timeout() || self.is_connect() {
			return true;
		}

		self
			.status()
			.map(|status| RETRYABLE_STATUSES.contains(&status))
			.unwrap_or(false)
	}
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempt budget in `cfg` is spent.
pub async fn retry<F, Fut, T, E>(cfg: &RetryConfig, mut op: F) -> Result<T, E>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
	E: RetryableError + std::fmt::Debug,
{
	let max_attempts = cfg.max_attempts.max(1);
	let mut attempt = 0;

	loop {
		let err = match op().await {
			Ok(value) => return Ok(value),
			Err(err) => err,
		};
		attempt += 1;

		if !err.is_retryable() {
			return Err(err);
		}

		if attempt >= max_attempts {
			warn!(error = ?err, attempt, max_attempts, "max retry attempts exhausted");
			return Err(err);
		}

		let delay = cfg.delay_for(attempt - 1);
		warn!(
			error = ?err,
			attempt,
			max_attempts,
			delay_ms = delay.as_millis() as u64,
			"retrying after transient error"
		);
		tokio::time::sleep(delay).await;
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicU32, Ordering};

	use proptest::prelude::*;

	use super::*;

	#[derive(Debug)]
	struct Flaky {
		transient: bool,
	}

	impl RetryableError for Flaky {
		fn is_retryable(&self) -> bool {
			self.transient
		}
	}

	fn fast() -> RetryConfig {
		RetryConfig {
			max_attempts: 4,
			base_delay: Duration::from_millis(1),
			max_delay: Duration::from_millis(4),
			backoff_factor: 2.0,
			jitter: false,
		}
	}

	#[tokio::test]
	async fn permanent_error_is_returned_after_one_attempt() {
		let counter = AtomicU32::new(0);
		let calls = &counter;

		let result: Result<(), Flaky> = retry(&fast(), || async move {
			calls.fetch_add(1, Ordering::SeqCst);
			Err(Flaky { transient: false })
		})
		.await;

		assert!(result.is_err());
		assert_eq!(counter.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn transient_error_exhausts_budget() {
		let counter = AtomicU32::new(0);
		let calls = &counter;

		let result: Result<(), Flaky> = retry(&fast(), || async move {
			calls.fetch_add(1, Ordering::SeqCst);
			Err(Flaky { transient: true })
		})
		.await;

		assert!(result.is_err());
		assert_eq!(counter.load(Ordering::SeqCst), 4);
	}

	#[tokio::test]
	async fn recovers_once_upstream_is_back() {
		let counter = AtomicU32::new(0);
		let calls = &counter;

		let result: Result<u32, Flaky> = retry(&fast(), || async move {
			let n = calls.fetch_add(1, Ordering::SeqCst);
			if n < 2 {
				Err(Flaky { transient: true })
			} else {
				Ok(n)
			}
		})
		.await;

		assert_eq!(result.unwrap(), 2);
	}

	#[tokio::test]
	async fn no_retry_policy_sends_once() {
		let counter = AtomicU32::new(0);
		let calls = &counter;

		let _: Result<(), Flaky> = retry(&RetryConfig::no_retry(), || async move {
			calls.fetch_add(1, Ordering::SeqCst);
			Err(Flaky { transient: true })
		})
		.await;

		assert_eq!(counter.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn delays_grow_geometrically_without_jitter() {
		let cfg = RetryConfig {
			jitter: false,
			..RetryConfig::default()
		};

		for (index, expected) in [(0, 0.2), (1, 0.4), (2, 0.8), (10, 5.0)] {
			let actual = cfg.delay_for(index).as_secs_f64();
			assert!((actual - expected).abs() < 1e-6, "retry {index}: {actual}");
		}
	}

	proptest! {
		#[test]
		fn delay_never_exceeds_jittered_cap(index in 0u32..64) {
			let cfg = RetryConfig::default();
			prop_assert!(cfg.delay_for(index) <= cfg.max_delay.mul_f64(1.5));
		}
	}
}
