//! `/v1/billing/*`: external-collaborator-only surface. Routes
//! are declared with their documented request/response shapes but return
//! `501` — no payment processor is wired up here, consistent with the
//! spec's billing Non-goals.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post, put};
use axum::Router;
use serde::{Deserialize, Serialize};
use sigil_repository::Plan;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/subscription", get(unavailable).put(unavailable))
		.route("/usage", get(unavailable))
		.route("/invoices", get(unavailable))
		.route("/setup-intent", post(unavailable))
		.route("/payment-methods", get(unavailable).post(unavailable))
		.route("/payment-methods/default", put(unavailable))
}

#[derive(Serialize)]
#[allow(dead_code)]
struct SubscriptionResponse {
	plan: Plan,
	status: String,
	current_period_end: chrono::DateTime<chrono::Utc>,
}

#[derive(Deserialize)]
#[allow(dead_code)]
struct SetupIntentRequest {
	return_url: String,
}

async fn unavailable() -> impl IntoResponse {
	(
		StatusCode::NOT_IMPLEMENTED,
		Json(serde_json::json!({
			"data": null,
			"error": { "code": "BAD_REQUEST", "message": "payment processor is not available in this deployment" },
		})),
	)
}
