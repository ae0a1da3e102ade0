//! Session cookie construction. Framework-agnostic: callers in
//! `sigil-api` attach the returned header value to their response type.

use crate::credentials::SESSION_COOKIE_NAME;
use chrono::Duration;

pub const SESSION_TTL: Duration = Duration::hours(24);

/// `Set-Cookie` value for a freshly established session.
pub fn set_cookie_header(token: &str) -> String {
	format!(
		"{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={}",
		SESSION_TTL.num_seconds()
	)
}

/// `Set-Cookie` value that clears the session cookie on logout: an empty
/// value with `Max-Age=-1` tells the browser to drop it immediately.
pub fn clear_cookie_header() -> String {
	format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age=-1")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clear_cookie_uses_negative_max_age() {
		assert!(clear_cookie_header().contains("Max-Age=-1"));
	}

	#[test]
	fn set_cookie_carries_the_token() {
		assert!(set_cookie_header("tok123").contains("sigil_session=tok123"));
	}
}
