//! Credential extraction from request headers/cookies.
//!
//! Kept free of any HTTP framework type so it can be unit tested and reused
//! by both the REST surface and the JSON-RPC POST endpoint: callers pass in
//! the raw header strings they already have in hand.

/// Prefix every minted API key secret carries, used to recognize an API key
/// presented in the `Authorization: Bearer` slot.
pub const API_KEY_PREFIX: &str = "sk_live_";

pub const SESSION_COOKIE_NAME: &str = "sigil_session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawCredential {
	ApiKey(String),
	SessionToken(String),
}

pub struct CredentialSources<'a> {
	pub authorization: Option<&'a str>,
	pub x_api_key_header: Option<&'a str>,
	pub cookie_header: Option<&'a str>,
}

/// Resolution order: `Authorization: Bearer sk_live_...` (an API key in the
/// bearer slot) → `Authorization: ApiKey <key>` → `X-API-Key` header →
/// session cookie → `Authorization: Bearer <session token>` as a last
/// resort. The first populated slot wins; nothing is merged across slots.
pub fn extract_credential(sources: CredentialSources<'_>) -> Option<RawCredential> {
	if let Some(bearer) = bearer_token(sources.authorization) {
		if bearer.starts_with(API_KEY_PREFIX) {
			return Some(RawCredential::ApiKey(bearer.to_string()));
		}
	}
	if let Some(key) = api_key_scheme(sources.authorization) {
		return Some(RawCredential::ApiKey(key.to_string()));
	}
	if let Some(key) = non_empty(sources.x_api_key_header) {
		return Some(RawCredential::ApiKey(key.to_string()));
	}
	if let Some(token) = session_cookie(sources.cookie_header) {
		return Some(RawCredential::SessionToken(token));
	}
	if let Some(bearer) = bearer_token(sources.authorization) {
		return Some(RawCredential::SessionToken(bearer.to_string()));
	}
	None
}

fn bearer_token(authorization: Option<&str>) -> Option<&str> {
	let header = non_empty(authorization)?;
	header.strip_prefix("Bearer ").map(str::trim).filter(|s| !s.is_empty())
}

fn api_key_scheme(authorization: Option<&str>) -> Option<&str> {
	let header = non_empty(authorization)?;
	header.strip_prefix("ApiKey ").map(str::trim).filter(|s| !s.is_empty())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|s| !s.is_empty())
}

fn session_cookie(cookie_header: Option<&str>) -> Option<String> {
	let header = non_empty(cookie_header)?;
	header.split(';').map(str::trim).find_map(|pair| {
		let (name, value) = pair.split_once('=')?;
		(name.trim() == SESSION_COOKIE_NAME).then(|| value.trim().to_string())
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sources<'a>(
		authorization: Option<&'a str>,
		x_api_key_header: Option<&'a str>,
		cookie_header: Option<&'a str>,
	) -> CredentialSources<'a> {
		CredentialSources { authorization, x_api_key_header, cookie_header }
	}

	#[test]
	fn bearer_api_key_wins_over_everything() {
		let got = extract_credential(sources(
			Some("Bearer sk_live_abc123"),
			Some("other-key-2"),
			Some("sigil_session=deadbeef"),
		));
		assert_eq!(got, Some(RawCredential::ApiKey("sk_live_abc123".to_string())));
	}

	#[test]
	fn authorization_api_key_scheme_beats_x_api_key_and_cookie() {
		let got = extract_credential(sources(Some("ApiKey key-a"), Some("key-b"), Some("sigil_session=tok")));
		assert_eq!(got, Some(RawCredential::ApiKey("key-a".to_string())));
	}

	#[test]
	fn x_api_key_header_beats_cookie() {
		let got = extract_credential(sources(None, Some("key-b"), Some("sigil_session=tok")));
		assert_eq!(got, Some(RawCredential::ApiKey("key-b".to_string())));
	}

	#[test]
	fn session_cookie_beats_bearer_session_fallback() {
		let got = extract_credential(sources(Some("Bearer sometoken"), None, Some("sigil_session=cookietok")));
		assert_eq!(got, Some(RawCredential::SessionToken("cookietok".to_string())));
	}

	#[test]
	fn bearer_session_is_the_last_resort() {
		let got = extract_credential(sources(Some("Bearer sometoken"), None, None));
		assert_eq!(got, Some(RawCredential::SessionToken("sometoken".to_string())));
	}

	#[test]
	fn nothing_present_yields_none() {
		assert_eq!(extract_credential(sources(None, None, None)), None);
	}
}
