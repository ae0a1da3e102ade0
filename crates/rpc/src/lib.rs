//! JSON-RPC 2.0 surface: envelope types, the method dispatcher, the sliding
//! window rate limiter, and the EVM sign handlers.

mod dispatcher;
mod error;
mod eth_tx;
mod rate_limiter;
pub mod sign_handlers;
mod types;

pub use dispatcher::{Handler, HandlerFuture, RpcDispatcher};
pub use error::{error_kind_to_rpc, keyring_error_to_rpc};
pub use rate_limiter::RpcRateLimiter;
pub use types::{JsonRpcError, JsonRpcPayload, JsonRpcReply, JsonRpcRequest, JsonRpcResponse};
