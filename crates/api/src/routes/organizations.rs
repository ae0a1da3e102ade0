//! `/v1/organizations*`: role-gated via `Membership` level, not scopes
//!.

use crate::error::{ok, ApiError};
use crate::extract::Authenticated;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use sigil_primitives::Role;
use uuid::Uuid;

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/current", get(get_current).put(update_plan))
		.route("/current/members", get(list_members).post(upsert_member))
		.route("/current/members/:user_id", axum::routing::delete(remove_member))
}

async fn get_current(Authenticated(ctx): Authenticated, State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
	let org = state.repository.get_organization(ctx.org_id).await?;
	Ok(ok(org))
}

#[derive(Deserialize)]
struct UpdatePlanRequest {
	plan: sigil_repository::Plan,
}

async fn update_plan(
	Authenticated(ctx): Authenticated,
	State(state): State<AppState>,
	Json(req): Json<UpdatePlanRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_role(Role::Owner)?;
	let org = state.repository.set_organization_plan(ctx.org_id, req.plan).await?;
	Ok(ok(org))
}

async fn list_members(Authenticated(ctx): Authenticated, State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_role(Role::Viewer)?;
	let members = state.repository.list_memberships(ctx.org_id).await?;
	Ok(ok(members))
}

#[derive(Deserialize)]
struct UpsertMemberRequest {
	user_id: Uuid,
	role: Role,
}

async fn upsert_member(
	Authenticated(ctx): Authenticated,
	State(state): State<AppState>,
	Json(req): Json<UpsertMemberRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_role(Role::Admin)?;
	let membership = state.repository.upsert_membership(ctx.org_id, req.user_id, req.role).await?;
	Ok(ok(membership))
}

async fn remove_member(Authenticated(ctx): Authenticated, State(state): State<AppState>, Path(user_id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_role(Role::Admin)?;
	state.repository.delete_membership(ctx.org_id, user_id).await?;
	Ok(ok(serde_json::json!({ "user_id": user_id, "removed": true })))
}
