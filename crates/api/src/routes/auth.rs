//! `/v1/auth/*`: session-establishing routes take no scope.

use crate::error::{ok, ApiError};
use crate::extract::Authenticated;
use crate::state::AppState;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use sigil_auth::{clear_cookie_header, hash_api_key as hash_password, set_cookie_header, verify_api_key as verify_password};
use sigil_repository::{Session, User};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/register", post(register))
		.route("/login", post(login))
		.route("/logout", post(logout))
		.route("/me", get(me))
}

#[derive(Deserialize)]
struct RegisterRequest {
	email: String,
	password: String,
	organization_name: String,
}

async fn register(State(state): State<AppState>, Json(req): Json<RegisterRequest>) -> Result<impl IntoResponse, ApiError> {
	let org = state.repository.create_organization(&req.organization_name, sigil_repository::Plan::Free).await?;
	let password_hash = hash_password(&req.password);
	let user = state.repository.create_user(&req.email, &password_hash).await?;
	state.repository.upsert_membership(org.id, user.id, sigil_primitives::Role::Owner).await?;
	let (headers, body) = issue_session(&state, &user, org.id).await?;
	Ok((StatusCode::CREATED, headers, body))
}

#[derive(Deserialize)]
struct LoginRequest {
	email: String,
	password: String,
	organization_id: Uuid,
}

async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Result<impl IntoResponse, ApiError> {
	let user = state.repository.get_user_by_email(&req.email).await.map_err(|_| sigil_primitives::ErrorKind::Unauthorized)?;
	verify_password(&req.password, &user.password_hash).map_err(|_| sigil_primitives::ErrorKind::Unauthorized)?;
	state.repository.get_membership(req.organization_id, user.id).await.map_err(|_| sigil_primitives::ErrorKind::Unauthorized)?;
	let (headers, body) = issue_session(&state, &user, req.organization_id).await?;
	Ok((StatusCode::OK, headers, body))
}

async fn issue_session(state: &AppState, user: &User, org_id: Uuid) -> Result<(HeaderMap, Json<serde_json::Value>), ApiError> {
	let token = Uuid::new_v4().to_string();
	state
		.repository
		.create_session(Session { token: token.clone(), user_id: user.id, org_id, expires_at: chrono::Utc::now() + sigil_auth::SESSION_TTL })
		.await?;
	let mut headers = HeaderMap::new();
	headers.insert(header::SET_COOKIE, HeaderValue::from_str(&set_cookie_header(&token)).expect("cookie header value is valid ASCII"));
	Ok((headers, ok(serde_json::json!({ "user_id": user.id, "org_id": org_id }))))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
	if let Some(cookie) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) {
		if let Some(token) = cookie.split(';').map(str::trim).find_map(|p| p.strip_prefix("sigil_session=")) {
			let _ = state.repository.delete_session(token).await;
		}
	}
	let mut out = HeaderMap::new();
	out.insert(header::SET_COOKIE, HeaderValue::from_str(&clear_cookie_header()).expect("cookie header value is valid ASCII"));
	(out, ok(serde_json::json!({})))
}

async fn me(Authenticated(ctx): Authenticated) -> impl IntoResponse {
	ok(serde_json::json!({
		"org_id": ctx.org_id,
		"role": ctx.role,
		"scopes": ctx.scopes,
	}))
}
