//! The JSON-RPC signing endpoint: HTTP POST only, single or
//! batch. Authenticates once for the whole request and
//! rate-limits per organization before dispatch.

use crate::extract::Authenticated;
use crate::state::AppState;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use serde_json::Value;
use sigil_rpc::{JsonRpcError, JsonRpcPayload, JsonRpcReply, JsonRpcResponse};

pub fn router() -> Router<AppState> {
	Router::new().route("/", post(handle))
}

/// A single response's HTTP status follows its JSON-RPC error code (only
/// the rate limiter's `-32029` maps to anything but 200, per spec 4.6). A
/// batch always rides on 200: mixed outcomes across elements have no single
/// HTTP status to report, and the caller reads per-element codes instead.
fn single_status(response: &JsonRpcResponse) -> StatusCode {
	match response.error.as_ref() {
		Some(error) if error.code == sigil_primitives::RpcErrorCode::RateLimit.code() => StatusCode::TOO_MANY_REQUESTS,
		_ => StatusCode::OK,
	}
}

fn invalid_request(message: impl Into<String>) -> Response {
	let response = JsonRpcResponse::failure(Value::Null, JsonRpcError::new(sigil_primitives::RpcErrorCode::InvalidRequest, message.into()));
	Json(response).into_response()
}

/// `Content-Type` is optional, but when present must be `application/json`
/// (ignoring a `; charset=...` suffix); anything else is `InvalidRequest`,
/// per spec 4.5.
fn content_type_is_acceptable(headers: &HeaderMap) -> bool {
	match headers.get(axum::http::header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
		Some(value) => value.split(';').next().unwrap_or("").trim().eq_ignore_ascii_case("application/json"),
		None => true,
	}
}

async fn handle(Authenticated(ctx): Authenticated, State(state): State<AppState>, headers: HeaderMap, body: axum::body::Bytes) -> Response {
	if !content_type_is_acceptable(&headers) {
		return invalid_request("Content-Type must be application/json when supplied");
	}
	if body.is_empty() {
		return invalid_request("request body must not be empty");
	}

	let payload: JsonRpcPayload = match serde_json::from_slice(&body) {
		Ok(payload) => payload,
		Err(err) => {
			// Parse failure: spec S2, a single failure response with a null id.
			let response = JsonRpcResponse::failure(
				Value::Null,
				JsonRpcError::new(sigil_primitives::RpcErrorCode::ParseError, err.to_string()),
			);
			return Json(response).into_response();
		}
	};

	match state.rpc.dispatch(payload, ctx).await {
		JsonRpcReply::Single(response) => (single_status(&response), Json(response)).into_response(),
		JsonRpcReply::Batch(responses) => Json(responses).into_response(),
		// All-notification request: no body, per spec 4.5's "a batch of
		// all-null-id requests yields HTTP 204".
		JsonRpcReply::Empty => StatusCode::NO_CONTENT.into_response(),
	}
}
