//! The JSON-RPC 2.0 envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sigil_primitives::RpcErrorCode;

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
	#[serde(default)]
	pub jsonrpc: Option<String>,
	pub method: String,
	#[serde(default)]
	pub params: Option<Value>,
	#[serde(default)]
	pub id: Option<Value>,
}

impl JsonRpcRequest {
	/// An `id` absent entirely (not merely `null`) marks a notification: the
	/// caller gets no response even if the call fails.
	pub fn is_notification(&self) -> bool {
		self.id.is_none()
	}

	pub fn validate_envelope(&self) -> Result<(), JsonRpcError> {
		match self.jsonrpc.as_deref() {
			Some("2.0") => {}
			_ => return Err(JsonRpcError::new(RpcErrorCode::InvalidRequest, "`jsonrpc` must be exactly \"2.0\"".to_string())),
		}
		if self.method.trim().is_empty() {
			return Err(JsonRpcError::new(RpcErrorCode::InvalidRequest, "`method` must not be empty".to_string()));
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
	pub jsonrpc: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<JsonRpcError>,
	pub id: Value,
}

impl JsonRpcResponse {
	pub fn success(id: Value, result: Value) -> Self {
		Self { jsonrpc: "2.0", result: Some(result), error: None, id }
	}

	pub fn failure(id: Value, error: JsonRpcError) -> Self {
		Self { jsonrpc: "2.0", result: None, error: Some(error), id }
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
	pub code: i64,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

impl JsonRpcError {
	pub fn new(code: RpcErrorCode, message: String) -> Self {
		Self { code: code.code(), message, data: None }
	}

	pub fn with_data(code: RpcErrorCode, message: String, data: Value) -> Self {
		Self { code: code.code(), message, data: Some(data) }
	}
}

/// Either one request or a batch, per JSON-RPC 2.0 section 6.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcPayload {
	Single(JsonRpcRequest),
	Batch(Vec<JsonRpcRequest>),
}

/// The dispatcher's reply mirrors the payload shape: a batch of only
/// notifications yields `Empty` (no HTTP body per spec 4.5).
pub enum JsonRpcReply {
	Single(JsonRpcResponse),
	Batch(Vec<JsonRpcResponse>),
	Empty,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn request(method: &str) -> JsonRpcRequest {
		JsonRpcRequest { jsonrpc: Some("2.0".to_string()), method: method.to_string(), params: None, id: Some(Value::from(1)) }
	}

	#[test]
	fn empty_method_is_invalid_request_not_method_not_found() {
		let err = request("").validate_envelope().unwrap_err();
		assert_eq!(err.code, RpcErrorCode::InvalidRequest.code());
	}

	#[test]
	fn whitespace_only_method_is_invalid_request() {
		let err = request("   ").validate_envelope().unwrap_err();
		assert_eq!(err.code, RpcErrorCode::InvalidRequest.code());
	}

	#[test]
	fn non_empty_method_passes_envelope_validation() {
		assert!(request("eth_accounts").validate_envelope().is_ok());
	}
}
