//! `/v1/webhooks*`, scope `webhooks:admin`.

use crate::error::{ok, ApiError};
use crate::extract::Authenticated;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use rand::RngCore;
use serde::Deserialize;
use sigil_repository::Webhook;
use uuid::Uuid;

const SCOPE: &str = "webhooks:admin";

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/", get(list).post(create))
		.route("/:id", get(get_one).put(update).delete(remove))
		.route("/:id/rotate-secret", post(rotate_secret))
		.route("/:id/deliveries", get(deliveries))
		.route("/:id/deliveries/:delivery_id/retry", post(retry_delivery))
}

fn new_secret() -> String {
	let mut bytes = [0u8; 32];
	rand::thread_rng().fill_bytes(&mut bytes);
	hex::encode(bytes)
}

#[derive(Deserialize)]
struct CreateWebhookRequest {
	url: String,
	events: Vec<String>,
}

async fn list(Authenticated(ctx): Authenticated, State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_scope(SCOPE)?;
	let hooks = state.repository.list_webhooks(ctx.org_id).await?;
	Ok(ok(hooks))
}

async fn create(
	Authenticated(ctx): Authenticated,
	State(state): State<AppState>,
	Json(req): Json<CreateWebhookRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_scope(SCOPE)?;
	let webhook =
		Webhook { id: Uuid::new_v4(), org_id: ctx.org_id, url: req.url, secret: new_secret(), events: req.events, enabled: true, failure_count: 0, last_triggered_at: None };
	state.repository.create_webhook(webhook.clone()).await?;
	Ok(ok(webhook))
}

async fn get_one(Authenticated(ctx): Authenticated, State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_scope(SCOPE)?;
	let webhook = state.repository.get_webhook(ctx.org_id, id).await?;
	Ok(ok(webhook))
}

#[derive(Deserialize)]
struct UpdateWebhookRequest {
	url: Option<String>,
	events: Option<Vec<String>>,
	enabled: Option<bool>,
}

async fn update(
	Authenticated(ctx): Authenticated,
	State(state): State<AppState>,
	Path(id): Path<Uuid>,
	Json(req): Json<UpdateWebhookRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_scope(SCOPE)?;
	let mut webhook = state.repository.get_webhook(ctx.org_id, id).await?;
	if let Some(url) = req.url {
		webhook.url = url;
	}
	if let Some(events) = req.events {
		webhook.events = events;
	}
	if let Some(enabled) = req.enabled {
		webhook.enabled = enabled;
	}
	state.repository.update_webhook(webhook.clone()).await?;
	Ok(ok(webhook))
}

async fn remove(Authenticated(ctx): Authenticated, State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_scope(SCOPE)?;
	state.repository.delete_webhook(ctx.org_id, id).await?;
	Ok(ok(serde_json::json!({ "id": id, "deleted": true })))
}

async fn rotate_secret(Authenticated(ctx): Authenticated, State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_scope(SCOPE)?;
	let mut webhook = state.repository.get_webhook(ctx.org_id, id).await?;
	webhook.secret = new_secret();
	state.repository.update_webhook(webhook.clone()).await?;
	Ok(ok(webhook))
}

async fn deliveries(Authenticated(ctx): Authenticated, State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_scope(SCOPE)?;
	// Confirms the webhook belongs to the caller's org before exposing any
	// delivery history (cross-tenant access is `NotFound`, not `Forbidden`).
	state.repository.get_webhook(ctx.org_id, id).await?;
	let history = state.repository.list_webhook_deliveries(id).await?;
	Ok(ok(history))
}

async fn retry_delivery(
	Authenticated(ctx): Authenticated,
	State(state): State<AppState>,
	Path((id, delivery_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_scope(SCOPE)?;
	let webhook = state.repository.get_webhook(ctx.org_id, id).await?;
	let delivery = state.repository.get_webhook_delivery(id, delivery_id).await?;
	state.webhooks.enqueue_retry(&webhook, delivery.payload).await;
	Ok(ok(serde_json::json!({ "webhook_id": id, "delivery_id": delivery_id, "requeued": true })))
}
