use sigil_auth::Authenticator;
use sigil_orchestrator::Orchestrator;
use sigil_repository::Repository;
use sigil_rpc::RpcDispatcher;
use sigil_telemetry::{AuditSink, UsageSink, WebhookDispatcher};
use std::sync::Arc;

/// Everything a handler needs, cloned cheaply per request (every field is an
/// `Arc` or a plain `Clone` wrapper over one). The per-signer-address rate
/// limiter lives inside `rpc` itself: it is consulted per JSON-RPC
/// call, not once per HTTP request, so it has no separate slot here.
#[derive(Clone)]
pub struct AppState {
	pub repository: Arc<dyn Repository>,
	pub authenticator: Arc<Authenticator>,
	pub rpc: Arc<RpcDispatcher>,
	pub orchestrator: Arc<Orchestrator>,
	pub audit: Arc<AuditSink>,
	pub usage: Arc<UsageSink>,
	pub webhooks: Arc<WebhookDispatcher>,
}
