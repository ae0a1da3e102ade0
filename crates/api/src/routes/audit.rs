//! `/v1/audit/logs*`, scope `audit:read`. Cursor-paginated.

use crate::error::{ok_with_meta, ApiError};
use crate::extract::Authenticated;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use sigil_repository::AuditLogFilter;
use uuid::Uuid;

const SCOPE: &str = "audit:read";

pub fn router() -> Router<AppState> {
	Router::new().route("/logs", get(list))
}

#[derive(Deserialize)]
struct AuditLogQuery {
	cursor: Option<Uuid>,
	#[serde(default = "default_limit")]
	limit: usize,
	event: Option<String>,
	resource_type: Option<String>,
}

fn default_limit() -> usize {
	50
}

async fn list(Authenticated(ctx): Authenticated, State(state): State<AppState>, Query(query): Query<AuditLogQuery>) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_scope(SCOPE)?;
	let filter = AuditLogFilter { event: query.event, resource_type: query.resource_type, ..Default::default() };
	let (entries, next_cursor) = state.repository.query_audit_logs(ctx.org_id, &filter, query.cursor, query.limit.min(200)).await?;
	Ok(ok_with_meta(entries, serde_json::json!({ "next_cursor": next_cursor })))
}
