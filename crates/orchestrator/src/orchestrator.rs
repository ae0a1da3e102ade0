//! The resumable staged deployment state machine.
//!
//! Each deployment walks [`sigil_primitives::STAGE_ORDER`] in a fixed
//! sequence. Every stage begins by consulting `IsStageComplete`, so a
//! re-entrant call after a crash or a deliberate `Pause` never re-executes
//! work that already landed. Failure at any stage retains the last
//! successfully recorded stage so a later `Resume` picks up exactly there.

use crate::executor::{ExecutorRegistry, StageOutcome};
use crate::retry::{retry_with_backoff, RetryOutcome, RetryPolicy};
use crate::OrchestratorError;
use crate::StateWriter;
use sigil_primitives::{Stage, StageOrder};
use sigil_repository::{Deployment, DeploymentStatus, Repository};
use sigil_telemetry::{AuditEvent, AuditSink, UsageSink};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Reported back to callers after each stage so a long-running `Deploy`
/// invocation (e.g. over a streaming RPC or webhook) can show progress
/// without polling the repository.
#[derive(Debug, Clone)]
pub struct StageProgress {
	pub deployment_id: Uuid,
	pub stage: Stage,
	pub progress: f64,
	pub description: String,
}

pub struct Orchestrator {
	repository: Arc<dyn Repository>,
	state_writer: Arc<dyn StateWriter>,
	executors: Arc<ExecutorRegistry>,
	retry_policy: RetryPolicy,
	audit: AuditSink,
	usage: UsageSink,
}

impl Orchestrator {
	pub fn new(repository: Arc<dyn Repository>, state_writer: Arc<dyn StateWriter>, executors: ExecutorRegistry, retry_policy: RetryPolicy) -> Self {
		let audit = AuditSink::new(repository.clone());
		let usage = UsageSink::new(repository.clone());
		Self { repository, state_writer, executors: Arc::new(executors), retry_policy, audit, usage }
	}

	/// `determineStartStage`: a fresh or never-started deployment begins at
	/// [`Stage::Init`]; anything resumable (`paused`, `running` after a
	/// restart, or `failed`) re-enters at its last persisted stage.
	fn determine_start_stage(deployment: &Deployment) -> Stage {
		if deployment.status.is_resumable() {
			deployment.stage
		} else {
			StageOrder::first()
		}
	}

	/// Runs (or resumes) a deployment to completion, calling `on_progress`
	/// after every stage that advances. Returns the final deployment record.
	///
	/// On a permanent stage failure the deployment is left `failed` at the
	/// stage that failed, its prior stages' artifacts untouched, so a
	/// subsequent call resumes there rather than from `Init`. On
	/// cancellation the deployment is left `paused` and the cancellation is
	/// reported to the caller untouched, not wrapped as a stage failure.
	pub async fn deploy(
		&self,
		org_id: Uuid,
		deployment_id: Uuid,
		cancel: &CancellationToken,
		mut on_progress: impl FnMut(StageProgress),
	) -> Result<Deployment, OrchestratorError> {
		let mut deployment = self.repository.get_deployment(org_id, deployment_id).await?;
		if deployment.status == DeploymentStatus::Completed {
			return Err(OrchestratorError::AlreadyCompleted(deployment_id));
		}

		let mut stage = Self::determine_start_stage(&deployment);
		loop {
			if !self.state_writer.is_stage_complete(deployment_id, stage).await {
				let executor = self.executors.get(stage).ok_or(OrchestratorError::NoExecutor(stage))?;

				let outcome = retry_with_backoff(self.retry_policy, cancel, || {
					let executor = executor.clone();
					let deployment = deployment.clone();
					async move { executor.execute(&deployment).await }
				})
				.await;

				let outcome: StageOutcome = match outcome {
					RetryOutcome::Cancelled => {
						self.state_writer.mark_paused(&deployment).await?;
						tracing::info!(%deployment_id, ?stage, "deployment cancelled, left paused for resume");
						return Err(OrchestratorError::Repository(sigil_repository::RepositoryError::Conflict(
							"cancelled".to_string(),
						)));
					}
					RetryOutcome::Done(Ok(outcome)) => outcome,
					RetryOutcome::Done(Err((err, attempts))) => {
						let message = err.to_string();
						self.state_writer.mark_failed(&deployment, &message).await?;
						self.audit.record(AuditEvent {
							org_id,
							event: "deployment.stage_failed".to_string(),
							actor_id: None,
							actor_type: sigil_repository::ActorType::System,
							resource_type: Some("deployment".to_string()),
							resource_id: Some(deployment_id.to_string()),
							ip: None,
							user_agent: None,
							metadata: serde_json::json!({ "stage": stage, "attempts": attempts }),
						});
						return Err(OrchestratorError::StageFailed { stage, attempts, source: Box::new(err) });
					}
				};

				for (artifact_type, content) in outcome.artifacts {
					self.state_writer.save_artifact(deployment_id, &artifact_type, content).await?;
				}
				self.state_writer.mark_stage_complete(deployment_id, stage).await?;
				self.usage.record(org_id, "deployment_stages");
				on_progress(StageProgress { deployment_id, stage, progress: StageOrder::progress(stage), description: outcome.description });
			}

			match StageOrder::next(stage) {
				Some(next) => {
					deployment = self.state_writer.update_stage(&deployment, next).await?;
					stage = next;
				}
				None => {
					deployment = self.state_writer.mark_complete(&deployment).await?;
					self.audit.record(AuditEvent {
						org_id,
						event: "deployment.completed".to_string(),
						actor_id: None,
						actor_type: sigil_repository::ActorType::System,
						resource_type: Some("deployment".to_string()),
						resource_id: Some(deployment_id.to_string()),
						ip: None,
						user_agent: None,
						metadata: serde_json::json!({}),
					});
					return Ok(deployment);
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::executor::{NoopExecutor, StageError, StageExecutor};
	use crate::state_writer::RepositoryStateWriter;
	use async_trait::async_trait;
	use sigil_repository::{InMemoryRepository, Plan};
	use std::sync::atomic::{AtomicU32, Ordering};

	async fn seeded(repo: &InMemoryRepository) -> (Uuid, Uuid) {
		let org = repo.create_organization("acme", Plan::Free).await.unwrap();
		let deployment = Deployment {
			id: Uuid::new_v4(),
			org_id: org.id,
			chain_id: 7668,
			status: DeploymentStatus::Pending,
			stage: Stage::Init,
			config: serde_json::json!({}),
			error: None,
			created_at: chrono::Utc::now(),
			updated_at: chrono::Utc::now(),
		};
		repo.create_deployment(deployment.clone()).await.unwrap();
		(org.id, deployment.id)
	}

	fn noop_orchestrator(repo: Arc<dyn Repository>) -> Orchestrator {
		let writer = Arc::new(RepositoryStateWriter::new(repo.clone()));
		let mut executors = ExecutorRegistry::new();
		executors.fill_defaults();
		Orchestrator::new(repo, writer, executors, RetryPolicy::default())
	}

	#[tokio::test]
	async fn deploy_walks_every_stage_to_completion() {
		let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
		let (org_id, deployment_id) = seeded(&repo).await;
		let orchestrator = noop_orchestrator(repo.clone());
		let mut seen = Vec::new();
		let result = orchestrator.deploy(org_id, deployment_id, &CancellationToken::new(), |p| seen.push(p.stage)).await.unwrap();
		assert_eq!(result.status, DeploymentStatus::Completed);
		assert_eq!(result.stage, Stage::Completed);
		// Completed itself has a noop executor too, so it appears in seen.
		assert_eq!(seen.len(), sigil_primitives::STAGE_ORDER.len());
	}

	#[tokio::test]
	async fn resume_after_failure_does_not_rerun_completed_stages() {
		struct FlakyOnce {
			calls: AtomicU32,
		}
		#[async_trait]
		impl StageExecutor for FlakyOnce {
			async fn execute(&self, _deployment: &Deployment) -> Result<crate::executor::StageOutcome, StageError> {
				if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
					Err(StageError::permanent("first attempt fails"))
				} else {
					Ok(crate::executor::StageOutcome::new("eventually ok"))
				}
			}
		}

		let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
		let (org_id, deployment_id) = seeded(&repo).await;
		let writer = Arc::new(RepositoryStateWriter::new(repo.clone()));
		let mut executors = ExecutorRegistry::new();
		executors.register(Stage::Superchain, Arc::new(FlakyOnce { calls: AtomicU32::new(0) }));
		executors.fill_defaults();
		let orchestrator = Orchestrator::new(repo.clone(), writer, executors, RetryPolicy::default());

		let first = orchestrator.deploy(org_id, deployment_id, &CancellationToken::new(), |_| {}).await;
		assert!(first.is_err());
		let after_failure = repo.get_deployment(org_id, deployment_id).await.unwrap();
		assert_eq!(after_failure.status, DeploymentStatus::Failed);
		assert_eq!(after_failure.stage, Stage::Superchain);

		let mut seen = Vec::new();
		let resumed = orchestrator.deploy(org_id, deployment_id, &CancellationToken::new(), |p| seen.push(p.stage)).await.unwrap();
		assert_eq!(resumed.status, DeploymentStatus::Completed);
		// Init's artifact already existed from the first run, so it's not
		// re-executed or reported to on_progress the second time around.
		assert!(!seen.contains(&Stage::Init));
		assert!(seen.contains(&Stage::Superchain));
	}

	#[tokio::test]
	async fn cancellation_leaves_the_deployment_paused_for_resume() {
		let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
		let (org_id, deployment_id) = seeded(&repo).await;
		let orchestrator = noop_orchestrator(repo.clone());
		let cancel = CancellationToken::new();
		cancel.cancel();
		let result = orchestrator.deploy(org_id, deployment_id, &cancel, |_| {}).await;
		assert!(result.is_err());
		let after = repo.get_deployment(org_id, deployment_id).await.unwrap();
		assert_eq!(after.status, DeploymentStatus::Paused);
	}

	#[tokio::test]
	async fn deploying_an_already_completed_deployment_is_rejected() {
		let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
		let (org_id, deployment_id) = seeded(&repo).await;
		let orchestrator = noop_orchestrator(repo.clone());
		orchestrator.deploy(org_id, deployment_id, &CancellationToken::new(), |_| {}).await.unwrap();
		let second = orchestrator.deploy(org_id, deployment_id, &CancellationToken::new(), |_| {}).await;
		assert!(matches!(second, Err(OrchestratorError::AlreadyCompleted(id)) if id == deployment_id));
	}
}
