//! Maps the shared [`sigil_primitives::ErrorKind`] taxonomy into axum
//! responses, the REST mirror of `sigil_rpc::error::error_kind_to_rpc`.
//! Every handler returns `Result<T, ApiError>` and lets this `From` impl do
//! the translation, so no handler hand-rolls a status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use sigil_primitives::ErrorKind;

pub struct ApiError(ErrorKind);

impl From<ErrorKind> for ApiError {
	fn from(kind: ErrorKind) -> Self {
		Self(kind)
	}
}

impl From<sigil_repository::RepositoryError> for ApiError {
	fn from(err: sigil_repository::RepositoryError) -> Self {
		Self(err.into())
	}
}

impl From<sigil_auth::AuthError> for ApiError {
	fn from(err: sigil_auth::AuthError) -> Self {
		Self(err.into())
	}
}

impl From<sigil_orchestrator::OrchestratorError> for ApiError {
	fn from(err: sigil_orchestrator::OrchestratorError) -> Self {
		Self(err.into())
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		let code = match &self.0 {
			ErrorKind::BadRequest(_) => "BAD_REQUEST",
			ErrorKind::Unauthorized => "UNAUTHORIZED",
			ErrorKind::Forbidden => "FORBIDDEN",
			ErrorKind::NotFound(_) => "NOT_FOUND",
			ErrorKind::Conflict(_) => "CONFLICT",
			ErrorKind::Validation { .. } => "VALIDATION",
			ErrorKind::RateLimited => "RATE_LIMITED",
			ErrorKind::Internal(_) => "INTERNAL",
		};
		let body = Json(serde_json::json!({
			"data": null,
			"error": { "code": code, "message": self.0.to_string() },
		}));
		(status, body).into_response()
	}
}

/// Wraps a successful payload in the `{data, meta?, error?}` envelope every
/// REST response shares.
pub fn ok<T: serde::Serialize>(data: T) -> Json<serde_json::Value> {
	Json(serde_json::json!({ "data": data, "error": null }))
}

pub fn ok_with_meta<T: serde::Serialize, M: serde::Serialize>(data: T, meta: M) -> Json<serde_json::Value> {
	Json(serde_json::json!({ "data": data, "meta": meta, "error": null }))
}
