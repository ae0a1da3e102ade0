//! The shared error taxonomy. Every subsystem's `thiserror` enum
//! maps into this one via `From`, so the REST and JSON-RPC layers share a
//! single translation table instead of each re-deriving HTTP/JSON-RPC codes.

use crate::rpc_error::RpcErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
	#[error("bad request: {0}")]
	BadRequest(String),
	#[error("unauthorized")]
	Unauthorized,
	#[error("forbidden")]
	Forbidden,
	#[error("not found: {0}")]
	NotFound(String),
	#[error("conflict: {0}")]
	Conflict(String),
	#[error("validation failed on `{field}`: {message}")]
	Validation { field: String, message: String },
	#[error("rate limited")]
	RateLimited,
	#[error("internal error: {0}")]
	Internal(String),
}

impl ErrorKind {
	/// HTTP status code for the REST surface.
	pub fn http_status(&self) -> u16 {
		match self {
			ErrorKind::BadRequest(_) | ErrorKind::Validation { .. } => 400,
			ErrorKind::Unauthorized => 401,
			ErrorKind::Forbidden => 403,
			ErrorKind::NotFound(_) => 404,
			ErrorKind::Conflict(_) => 409,
			ErrorKind::RateLimited => 429,
			ErrorKind::Internal(_) => 500,
		}
	}

	/// JSON-RPC 2.0 error code for the signing dispatcher.
	pub fn rpc_code(&self) -> RpcErrorCode {
		match self {
			ErrorKind::BadRequest(_) | ErrorKind::Validation { .. } => RpcErrorCode::InvalidParams,
			ErrorKind::Unauthorized => RpcErrorCode::Unauthorized,
			ErrorKind::Forbidden => RpcErrorCode::Unauthorized,
			ErrorKind::NotFound(_) => RpcErrorCode::ResourceNotFound,
			ErrorKind::Conflict(_) => RpcErrorCode::ServerError,
			ErrorKind::RateLimited => RpcErrorCode::RateLimit,
			ErrorKind::Internal(_) => RpcErrorCode::InternalError,
		}
	}
}
