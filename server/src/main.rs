//! The control plane binary: wires the repository, authenticator, RPC
//! dispatcher, orchestrator, and telemetry sinks into one `AppState`, mounts
//! `sigil_api::router()`, and runs the background staleness sweep and
//! webhook delivery loop alongside the HTTP listener.

mod config;

use sigil_api::AppState;
use sigil_auth::Authenticator;
use sigil_keyring::{Keyring, KeyringConfig};
use sigil_orchestrator::{ExecutorRegistry, Orchestrator, RepositoryStateWriter, RetryPolicy};
use sigil_repository::InMemoryRepository;
use sigil_rpc::{sign_handlers, RpcDispatcher, RpcRateLimiter};
use sigil_secretstore::SecretStoreClient;
use sigil_telemetry::{AuditSink, UsageSink, WebhookDispatcher};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

const BODY_LIMIT_BYTES: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	sigil_telemetry::init_tracing();
	let config = config::Config::from_env()?;

	let repository: Arc<dyn sigil_repository::Repository> = Arc::new(InMemoryRepository::new());
	let audit = Arc::new(AuditSink::new(repository.clone()));
	let usage = Arc::new(UsageSink::new(repository.clone()));
	let webhooks_inner = WebhookDispatcher::new(repository.clone());
	let webhooks = Arc::new(webhooks_inner.clone());
	let authenticator = Arc::new(Authenticator::new(repository.clone()));

	let store = SecretStoreClient::new(config.bao_addr.clone(), config.bao_token.clone());
	let keyring = Arc::new(
		Keyring::new(store, KeyringConfig { index_path: config.store_path.clone() })
			.await
			.map_err(|err| anyhow::anyhow!("failed to open keyring: {err}"))?,
	);

	let rate_limiter = Arc::new(RpcRateLimiter::new(config.rpc_rate_limit_per_second));
	let dispatcher = RpcDispatcher::new().with_rate_limiter(rate_limiter);
	sign_handlers::register_all(&dispatcher, keyring.clone(), audit.clone(), usage.clone());

	let mut executors = ExecutorRegistry::new();
	executors.fill_defaults();
	let state_writer = Arc::new(RepositoryStateWriter::new(repository.clone()));
	let orchestrator = Arc::new(Orchestrator::new(repository.clone(), state_writer, executors, RetryPolicy::default()));

	let state = AppState {
		repository: repository.clone(),
		authenticator,
		rpc: Arc::new(dispatcher),
		orchestrator,
		audit,
		usage,
		webhooks: webhooks.clone(),
	};

	let shutdown = CancellationToken::new();
	let staleness = sigil_orchestrator::StalenessSweep::new(repository.clone(), config.staleness_timeout, config.staleness_interval);
	let staleness_task = tokio::spawn(staleness.run(shutdown.clone()));
	let webhook_task = tokio::spawn(webhooks_inner.run(shutdown.clone()));

	let app = sigil_api::router()
		.with_state(state)
		.layer(ServiceBuilder::new().layer(CatchPanicLayer::new()).layer(TraceLayer::new_for_http()).layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES)));

	let addr: SocketAddr = config.listen_addr.parse()?;
	tracing::info!(%addr, "sigil control plane listening");
	let listener = tokio::net::TcpListener::bind(addr).await?;

	axum::serve(listener, app.into_make_service())
		.with_graceful_shutdown(async move {
			let _ = tokio::signal::ctrl_c().await;
			tracing::info!("shutdown signal received");
			shutdown.cancel();
		})
		.await?;

	staleness_task.abort();
	webhook_task.abort();
	Ok(())
}
