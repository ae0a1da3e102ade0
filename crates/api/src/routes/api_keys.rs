//! `/v1/api-keys*`, scope `keys:admin`.

use crate::error::{ok, ApiError};
use crate::extract::Authenticated;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use sigil_auth::mint_api_key;
use sigil_repository::ApiKey;
use uuid::Uuid;

const SCOPE: &str = "keys:admin";

pub fn router() -> Router<AppState> {
	Router::new().route("/", get(list).post(create)).route("/:id/revoke", post(revoke))
}

#[derive(Deserialize)]
struct CreateApiKeyRequest {
	name: String,
	scopes: Vec<String>,
	expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

async fn list(Authenticated(ctx): Authenticated, State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_scope(SCOPE)?;
	let keys = state.repository.list_api_keys(ctx.org_id).await?;
	Ok(ok(keys.into_iter().map(redact).collect::<Vec<_>>()))
}

async fn create(
	Authenticated(ctx): Authenticated,
	State(state): State<AppState>,
	Json(req): Json<CreateApiKeyRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_scope(SCOPE)?;
	let minted = mint_api_key();
	let key = ApiKey {
		id: Uuid::new_v4(),
		org_id: ctx.org_id,
		user_id: None,
		name: req.name,
		key_prefix: minted.key_prefix.clone(),
		key_hash: minted.key_hash.clone(),
		scopes: req.scopes,
		last_used_at: None,
		expires_at: req.expires_at,
		revoked_at: None,
	};
	state.repository.create_api_key(key.clone()).await?;
	// The raw secret is returned exactly once, here; it is never persisted
	// or retrievable again.
	let mut body = serde_json::to_value(redact(key)).expect("ApiKey serializes");
	body["secret"] = serde_json::Value::String(minted.raw_secret);
	Ok(ok(body))
}

async fn revoke(Authenticated(ctx): Authenticated, State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_scope(SCOPE)?;
	state.repository.revoke_api_key(ctx.org_id, id).await?;
	Ok(ok(serde_json::json!({ "id": id, "revoked": true })))
}

/// Strips `key_hash` from the wire representation; callers never see it.
fn redact(mut key: ApiKey) -> ApiKey {
	key.key_hash = String::new();
	key
}
