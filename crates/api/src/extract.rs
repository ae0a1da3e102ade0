//! Pulls the caller's [`AuthContext`] out of request headers/cookies via
//! `sigil_auth`'s framework-agnostic extraction, so every handler that needs
//! an identity just takes one as an argument.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use sigil_auth::{extract_credential, AuthContext, AuthError, CredentialSources};

pub struct Authenticated(pub AuthContext);

impl<S> FromRequestParts<S> for Authenticated
where
	AppState: FromRef<S>,
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		let app_state = AppState::from_ref(state);
		let authorization = parts.headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok());
		let x_api_key_header = parts.headers.get("X-API-Key").and_then(|v| v.to_str().ok());
		let cookie_header = parts.headers.get(axum::http::header::COOKIE).and_then(|v| v.to_str().ok());

		let credential = extract_credential(CredentialSources { authorization, x_api_key_header, cookie_header })
			.ok_or(AuthError::MissingCredential)?;
		let ctx = app_state.authenticator.resolve(credential).await?;
		Ok(Authenticated(ctx))
	}
}
