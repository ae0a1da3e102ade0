//! The JSON-RPC 2.0 method registry and request dispatch loop.
//!
//! The registry is a `parking_lot::RwLock` over a plain `HashMap`: methods
//! are registered once at startup and read on every request, so a
//! reader-biased lock outperforms an async mutex here.

use crate::rate_limiter::extract_signer_address;
use crate::types::{JsonRpcError, JsonRpcPayload, JsonRpcReply, JsonRpcRequest, JsonRpcResponse};
use crate::RpcRateLimiter;
use parking_lot::RwLock;
use serde_json::Value;
use sigil_auth::AuthContext;
use sigil_primitives::RpcErrorCode;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, JsonRpcError>> + Send>>;
pub type Handler = Arc<dyn Fn(Option<Value>, AuthContext) -> HandlerFuture + Send + Sync>;

pub struct RpcDispatcher {
	methods: RwLock<HashMap<String, Handler>>,
	rate_limiter: Option<Arc<RpcRateLimiter>>,
}

impl Default for RpcDispatcher {
	fn default() -> Self {
		Self { methods: RwLock::new(HashMap::new()), rate_limiter: None }
	}
}

impl RpcDispatcher {
	pub fn new() -> Self {
		Self::default()
	}

	/// Attaches the per-signer-address sliding-window limiter consulted by
	/// every dispatched call. Without one, the dispatcher never
	/// rate-limits — used by tests and by handlers with no address concept.
	pub fn with_rate_limiter(mut self, limiter: Arc<RpcRateLimiter>) -> Self {
		self.rate_limiter = Some(limiter);
		self
	}

	pub fn register(&self, method: impl Into<String>, handler: Handler) {
		self.methods.write().insert(method.into(), handler);
	}

	pub fn method_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.methods.read().keys().cloned().collect();
		names.sort();
		names
	}

	/// Dispatches a parsed payload against a single resolved `AuthContext`
	/// shared by every call in a batch (the whole HTTP request authenticates
	/// once, per spec 4.5/4.6).
	pub async fn dispatch(&self, payload: JsonRpcPayload, ctx: AuthContext) -> JsonRpcReply {
		match payload {
			JsonRpcPayload::Single(request) => match self.dispatch_one(request, ctx).await {
				Some(response) => JsonRpcReply::Single(response),
				None => JsonRpcReply::Empty,
			},
			JsonRpcPayload::Batch(requests) => {
				if requests.is_empty() {
					return JsonRpcReply::Single(JsonRpcResponse::failure(
						Value::Null,
						JsonRpcError::new(RpcErrorCode::InvalidRequest, "batch must not be empty".to_string()),
					));
				}
				// Elements run concurrently and land back in arbitrary order
				//; the caller correlates via `id`, not position.
				let calls = requests.into_iter().map(|request| self.dispatch_one(request, ctx.clone()));
				let responses: Vec<JsonRpcResponse> = futures_util::future::join_all(calls).await.into_iter().flatten().collect();
				if responses.is_empty() {
					JsonRpcReply::Empty
				} else {
					JsonRpcReply::Batch(responses)
				}
			}
		}
	}

	/// Returns `None` for notifications regardless of outcome: a failed
	/// notification still gets no response (JSON-RPC 2.0 section 4).
	async fn dispatch_one(&self, request: JsonRpcRequest, ctx: AuthContext) -> Option<JsonRpcResponse> {
		let is_notification = request.is_notification();
		let id = request.id.clone().unwrap_or(Value::Null);

		if let Err(error) = request.validate_envelope() {
			return (!is_notification).then(|| JsonRpcResponse::failure(id, error));
		}

		if let Some(limiter) = &self.rate_limiter {
			// Extraction failure (unparseable params, no address for this
			// method) fails open: the call proceeds unrate-limited rather
			// than erroring.
			if let Some(address) = extract_signer_address(&request.method, &request.params) {
				if !limiter.check(&address) {
					let error = JsonRpcError::new(RpcErrorCode::RateLimit, "rate limit exceeded for signer address".to_string());
					return (!is_notification).then(|| JsonRpcResponse::failure(id, error));
				}
			}
		}

		let handler = self.methods.read().get(&request.method).cloned();
		let result = match handler {
			Some(handler) => handler(request.params, ctx).await,
			None => Err(JsonRpcError::new(RpcErrorCode::MethodNotFound, format!("method not found: {}", request.method))),
		};

		if is_notification {
			return None;
		}
		Some(match result {
			Ok(value) => JsonRpcResponse::success(id, value),
			Err(error) => JsonRpcResponse::failure(id, error),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sigil_auth::Principal;

	fn test_ctx() -> AuthContext {
		AuthContext {
			org_id: uuid::Uuid::new_v4(),
			principal: Principal::ApiKey { api_key_id: uuid::Uuid::new_v4() },
			role: sigil_primitives::Role::Owner,
			scopes: vec!["*".to_string()],
		}
	}

	fn echo_handler() -> Handler {
		Arc::new(|params, _ctx| Box::pin(async move { Ok(params.unwrap_or(Value::Null)) }))
	}

	#[tokio::test]
	async fn unknown_method_is_method_not_found() {
		let dispatcher = RpcDispatcher::new();
		let request = JsonRpcRequest { jsonrpc: Some("2.0".to_string()), method: "nope".to_string(), params: None, id: Some(Value::from(1)) };
		let reply = dispatcher.dispatch(JsonRpcPayload::Single(request), test_ctx()).await;
		match reply {
			JsonRpcReply::Single(response) => {
				assert_eq!(response.error.unwrap().code, RpcErrorCode::MethodNotFound.code());
			}
			_ => panic!("expected single response"),
		}
	}

	#[tokio::test]
	async fn notification_yields_no_response_even_on_failure() {
		let dispatcher = RpcDispatcher::new();
		let request = JsonRpcRequest { jsonrpc: Some("2.0".to_string()), method: "nope".to_string(), params: None, id: None };
		let reply = dispatcher.dispatch(JsonRpcPayload::Single(request), test_ctx()).await;
		assert!(matches!(reply, JsonRpcReply::Empty));
	}

	#[tokio::test]
	async fn batch_of_all_notifications_yields_empty() {
		let dispatcher = RpcDispatcher::new();
		dispatcher.register("echo", echo_handler());
		let requests = vec![
			JsonRpcRequest { jsonrpc: Some("2.0".to_string()), method: "echo".to_string(), params: None, id: None },
			JsonRpcRequest { jsonrpc: Some("2.0".to_string()), method: "echo".to_string(), params: None, id: None },
		];
		let reply = dispatcher.dispatch(JsonRpcPayload::Batch(requests), test_ctx()).await;
		assert!(matches!(reply, JsonRpcReply::Empty));
	}

	#[tokio::test]
	async fn batch_mixes_responses_and_silent_notifications() {
		let dispatcher = RpcDispatcher::new();
		dispatcher.register("echo", echo_handler());
		let requests = vec![
			JsonRpcRequest {
				jsonrpc: Some("2.0".to_string()),
				method: "echo".to_string(),
				params: Some(Value::from(1)),
				id: Some(Value::from(1)),
			},
			JsonRpcRequest { jsonrpc: Some("2.0".to_string()), method: "echo".to_string(), params: None, id: None },
		];
		let reply = dispatcher.dispatch(JsonRpcPayload::Batch(requests), test_ctx()).await;
		match reply {
			JsonRpcReply::Batch(responses) => assert_eq!(responses.len(), 1),
			_ => panic!("expected batch response"),
		}
	}

	#[tokio::test]
	async fn bad_envelope_version_is_invalid_request() {
		let dispatcher = RpcDispatcher::new();
		let request = JsonRpcRequest { jsonrpc: Some("1.0".to_string()), method: "echo".to_string(), params: None, id: Some(Value::from(1)) };
		let reply = dispatcher.dispatch(JsonRpcPayload::Single(request), test_ctx()).await;
		match reply {
			JsonRpcReply::Single(response) => assert_eq!(response.error.unwrap().code, RpcErrorCode::InvalidRequest.code()),
			_ => panic!("expected single response"),
		}
	}

	/// Spec S5: with `RequestsPerSecond=2`, a third `personal_sign` call for
	/// the same address within the window is rejected with `-32029`.
	#[tokio::test]
	async fn third_call_for_the_same_address_is_rate_limited() {
		let dispatcher = RpcDispatcher::new().with_rate_limiter(Arc::new(crate::RpcRateLimiter::new(2)));
		dispatcher.register("personal_sign", echo_handler());
		let address = "0xabc0000000000000000000000000000000dead";
		let call = |n: i64| JsonRpcRequest {
			jsonrpc: Some("2.0".to_string()),
			method: "personal_sign".to_string(),
			params: Some(Value::from(vec![Value::from("0xdeadbeef"), Value::from(address)])),
			id: Some(Value::from(n)),
		};
		for n in 0..2 {
			let reply = dispatcher.dispatch(JsonRpcPayload::Single(call(n)), test_ctx()).await;
			match reply {
				JsonRpcReply::Single(response) => assert!(response.error.is_none(), "call {n} should be admitted"),
				_ => panic!("expected single response"),
			}
		}
		let reply = dispatcher.dispatch(JsonRpcPayload::Single(call(2)), test_ctx()).await;
		match reply {
			JsonRpcReply::Single(response) => assert_eq!(response.error.unwrap().code, RpcErrorCode::RateLimit.code()),
			_ => panic!("expected single response"),
		}
	}

	/// A method with no address concept (`eth_accounts`) is never rate
	/// limited, regardless of how many times it is called.
	#[tokio::test]
	async fn methods_without_an_address_bypass_the_limiter() {
		let dispatcher = RpcDispatcher::new().with_rate_limiter(Arc::new(crate::RpcRateLimiter::new(1)));
		dispatcher.register("eth_accounts", echo_handler());
		for n in 0..5 {
			let request = JsonRpcRequest { jsonrpc: Some("2.0".to_string()), method: "eth_accounts".to_string(), params: None, id: Some(Value::from(n)) };
			let reply = dispatcher.dispatch(JsonRpcPayload::Single(request), test_ctx()).await;
			match reply {
				JsonRpcReply::Single(response) => assert!(response.error.is_none()),
				_ => panic!("expected single response"),
			}
		}
	}
}
