//! `/v1/deployments*`: `deployments:admin` for mutation, `deployments:read`
//! for reads; orchestration endpoints call `Orchestrator::deploy`.

use crate::error::{ok, ApiError};
use crate::extract::Authenticated;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use sigil_primitives::{DeploymentStatus, Stage};
use sigil_repository::Deployment;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const READ_SCOPE: &str = "deployments:read";
const ADMIN_SCOPE: &str = "deployments:admin";

pub fn router() -> Router<AppState> {
	Router::new()
		.route("/", get(list).post(create))
		.route("/:id", get(get_one))
		.route("/:id/deploy", post(deploy))
		.route("/:id/resume", post(deploy))
		.route("/:id/transactions", get(transactions))
		.route("/:id/artifacts", get(artifacts))
}

#[derive(Deserialize)]
struct CreateDeploymentRequest {
	chain_id: u64,
	config: serde_json::Value,
}

async fn list(Authenticated(ctx): Authenticated, State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_scope(READ_SCOPE)?;
	let deployments = state.repository.list_deployments(ctx.org_id).await?;
	Ok(ok(deployments))
}

async fn create(
	Authenticated(ctx): Authenticated,
	State(state): State<AppState>,
	Json(req): Json<CreateDeploymentRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_scope(ADMIN_SCOPE)?;
	let deployment = Deployment {
		id: Uuid::new_v4(),
		org_id: ctx.org_id,
		chain_id: req.chain_id,
		status: DeploymentStatus::Pending.into(),
		stage: Stage::Init,
		config: req.config,
		error: None,
		created_at: chrono::Utc::now(),
		updated_at: chrono::Utc::now(),
	};
	state.repository.create_deployment(deployment.clone()).await?;
	Ok(ok(deployment))
}

async fn get_one(Authenticated(ctx): Authenticated, State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_scope(READ_SCOPE)?;
	let deployment = state.repository.get_deployment(ctx.org_id, id).await?;
	Ok(ok(deployment))
}

/// Drives the deployment to completion (or to the next failure/pause
/// point) and returns the final state. Shared by both `/deploy` (fresh
/// start) and `/resume` (same call — `Orchestrator::deploy` already
/// determines the right start stage from persisted state).
async fn deploy(Authenticated(ctx): Authenticated, State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_scope(ADMIN_SCOPE)?;
	let cancel = CancellationToken::new();
	let mut stages = Vec::new();
	let result = state.orchestrator.deploy(ctx.org_id, id, &cancel, |progress| stages.push(progress.stage)).await?;
	if result.status == DeploymentStatus::Completed.into() {
		state.webhooks.dispatch(ctx.org_id, "deployment.completed", serde_json::json!({ "deployment_id": id })).await;
	}
	Ok(ok(serde_json::json!({ "deployment": result, "stages_executed": stages })))
}

async fn transactions(Authenticated(ctx): Authenticated, State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_scope(READ_SCOPE)?;
	state.repository.get_deployment(ctx.org_id, id).await?;
	let txs = state.repository.list_transactions(id).await?;
	Ok(ok(txs))
}

async fn artifacts(Authenticated(ctx): Authenticated, State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
	ctx.require_scope(READ_SCOPE)?;
	state.repository.get_deployment(ctx.org_id, id).await?;
	let artifacts = state.repository.list_artifacts(id).await?;
	Ok(ok(artifacts))
}
