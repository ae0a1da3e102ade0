pub mod api_keys;
pub mod audit;
pub mod auth;
pub mod billing;
pub mod deployments;
pub mod organizations;
pub mod rpc;
pub mod webhooks;

use crate::state::AppState;
use axum::Router;

/// Nests every route group under `/v1`, the documented API version prefix.
pub fn router() -> Router<AppState> {
	Router::new().nest(
		"/v1",
		Router::new()
			.nest("/auth", auth::router())
			.nest("/api-keys", api_keys::router())
			.nest("/organizations", organizations::router())
			.nest("/webhooks", webhooks::router())
			.nest("/audit", audit::router())
			.nest("/billing", billing::router())
			.nest("/deployments", deployments::router())
			.nest("/rpc", rpc::router()),
	)
}
