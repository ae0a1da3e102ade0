//! Sliding-window rate limiter for the JSON-RPC surface.
//!
//! One `VecDeque<Instant>` of recent call timestamps per key, guarded by its
//! own `parking_lot::Mutex` inside a `dashmap` so unrelated keys never
//! contend. Prune-then-count against a 1s window; fails open if a backend
//! swap ever makes the check itself fallible (no such failure mode exists for
//! the in-memory default, but [`RpcRateLimiter::check`] preserves the
//! contract so a future Redis-backed implementation drops in unchanged).

use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(1);

pub struct RpcRateLimiter {
	limit_per_second: usize,
	windows: DashMap<String, Mutex<VecDeque<Instant>>>,
}

impl RpcRateLimiter {
	pub fn new(limit_per_second: usize) -> Self {
		Self { limit_per_second, windows: DashMap::new() }
	}

	/// `true` if `key` may proceed; records the call as counted against the
	/// window when it does.
	pub fn check(&self, key: &str) -> bool {
		let entry = self.windows.entry(key.to_string()).or_insert_with(|| Mutex::new(VecDeque::new()));
		let mut window = entry.lock();
		let now = Instant::now();
		while let Some(&oldest) = window.front() {
			if now.duration_since(oldest) > WINDOW {
				window.pop_front();
			} else {
				break;
			}
		}
		if window.len() >= self.limit_per_second {
			return false;
		}
		window.push_back(now);
		true
	}
}

/// Extracts the signer address this method would act on, per spec 4.6:
/// `eth_signTransaction` reads `params[0].from`, `eth_sign` reads
/// `params[0]`, `personal_sign` reads `params[1]`; anything else (e.g.
/// `eth_accounts`) has no address and is passed through unlimited. A
/// malformed payload yields `None` rather than an error — the caller fails
/// open on extraction failure, same as a backend error.
pub fn extract_signer_address(method: &str, params: &Option<Value>) -> Option<String> {
	let params = params.as_ref()?.as_array()?;
	let address = match method {
		"eth_signTransaction" => params.first()?.get("from")?.as_str()?,
		"eth_sign" => params.first()?.as_str()?,
		"personal_sign" => params.get(1)?.as_str()?,
		_ => return None,
	};
	Some(address.to_ascii_lowercase())
}

#[cfg(test)]
mod address_tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn eth_sign_transaction_reads_from_field() {
		let params = Some(json!([{ "from": "0xABCDEF0000000000000000000000000000000001", "chainId": 1 }]));
		assert_eq!(extract_signer_address("eth_signTransaction", &params), Some("0xabcdef0000000000000000000000000000000001".to_string()));
	}

	#[test]
	fn eth_sign_reads_first_positional_param() {
		let params = Some(json!(["0xAbC0000000000000000000000000000000dEaD", "0xdeadbeef"]));
		assert_eq!(extract_signer_address("eth_sign", &params), Some("0xabc0000000000000000000000000000000dead".to_string()));
	}

	#[test]
	fn personal_sign_reads_second_positional_param() {
		let params = Some(json!(["0xdeadbeef", "0xAbC0000000000000000000000000000000dEaD"]));
		assert_eq!(extract_signer_address("personal_sign", &params), Some("0xabc0000000000000000000000000000000dead".to_string()));
	}

	#[test]
	fn methods_without_an_address_pass_through() {
		assert_eq!(extract_signer_address("eth_accounts", &None), None);
	}

	#[test]
	fn malformed_params_yield_none_rather_than_an_error() {
		assert_eq!(extract_signer_address("eth_sign", &Some(json!({ "not": "an array" }))), None);
		assert_eq!(extract_signer_address("eth_sign", &None), None);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn allows_up_to_the_limit_then_blocks() {
		let limiter = RpcRateLimiter::new(3);
		assert!(limiter.check("org-a"));
		assert!(limiter.check("org-a"));
		assert!(limiter.check("org-a"));
		assert!(!limiter.check("org-a"));
	}

	#[test]
	fn keys_are_independent() {
		let limiter = RpcRateLimiter::new(1);
		assert!(limiter.check("org-a"));
		assert!(limiter.check("org-b"));
		assert!(!limiter.check("org-a"));
	}
}
