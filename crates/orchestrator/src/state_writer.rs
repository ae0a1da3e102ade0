//! Persists orchestrator progress: stage/status transitions, transactions,
//! and artifacts. `StateWriter` is the seam so the orchestrator
//! itself never talks to the repository directly — every write goes through
//! one place that also updates `updated_at`.

use async_trait::async_trait;
use sigil_repository::{wrap_binary_artifact, Artifact, Deployment, DeploymentStatus, Repository, Transaction};
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait StateWriter: Send + Sync {
	async fn update_stage(&self, deployment: &Deployment, stage: sigil_primitives::Stage) -> Result<Deployment, sigil_repository::RepositoryError>;
	async fn mark_failed(&self, deployment: &Deployment, error: &str) -> Result<Deployment, sigil_repository::RepositoryError>;
	async fn mark_paused(&self, deployment: &Deployment) -> Result<Deployment, sigil_repository::RepositoryError>;
	async fn mark_complete(&self, deployment: &Deployment) -> Result<Deployment, sigil_repository::RepositoryError>;
	async fn record_transaction(
		&self,
		deployment_id: Uuid,
		stage: sigil_primitives::Stage,
		hash: &str,
		description: &str,
	) -> Result<(), sigil_repository::RepositoryError>;
	async fn save_artifact(&self, deployment_id: Uuid, artifact_type: &str, content: serde_json::Value) -> Result<(), sigil_repository::RepositoryError>;
	async fn save_binary_artifact(&self, deployment_id: Uuid, artifact_type: &str, bytes: &[u8]) -> Result<(), sigil_repository::RepositoryError> {
		self.save_artifact(deployment_id, artifact_type, wrap_binary_artifact(bytes)).await
	}
	/// Records that `stage` finished successfully for this deployment. The
	/// orchestrator calls this once, right after a stage's executor returns
	/// `Ok`, independent of whatever artifacts the executor itself produced.
	async fn mark_stage_complete(&self, deployment_id: Uuid, stage: sigil_primitives::Stage) -> Result<(), sigil_repository::RepositoryError>;
	/// Whether `stage` has already completed for this deployment — the
	/// idempotence check every stage begins with.
	async fn is_stage_complete(&self, deployment_id: Uuid, stage: sigil_primitives::Stage) -> bool;
}

pub struct RepositoryStateWriter {
	repository: Arc<dyn Repository>,
}

impl RepositoryStateWriter {
	pub fn new(repository: Arc<dyn Repository>) -> Self {
		Self { repository }
	}

	fn stage_artifact_type(stage: sigil_primitives::Stage) -> String {
		format!("stage_output:{stage:?}")
	}
}

#[async_trait]
impl StateWriter for RepositoryStateWriter {
	async fn update_stage(&self, deployment: &Deployment, stage: sigil_primitives::Stage) -> Result<Deployment, sigil_repository::RepositoryError> {
		let mut updated = deployment.clone();
		updated.stage = stage;
		updated.status = DeploymentStatus::Running;
		updated.error = None;
		updated.updated_at = chrono::Utc::now();
		self.repository.update_deployment(updated.clone()).await?;
		Ok(updated)
	}

	async fn mark_failed(&self, deployment: &Deployment, error: &str) -> Result<Deployment, sigil_repository::RepositoryError> {
		let mut updated = deployment.clone();
		updated.status = DeploymentStatus::Failed;
		updated.error = Some(error.to_string());
		updated.updated_at = chrono::Utc::now();
		self.repository.update_deployment(updated.clone()).await?;
		Ok(updated)
	}

	async fn mark_paused(&self, deployment: &Deployment) -> Result<Deployment, sigil_repository::RepositoryError> {
		let mut updated = deployment.clone();
		updated.status = DeploymentStatus::Paused;
		updated.updated_at = chrono::Utc::now();
		self.repository.update_deployment(updated.clone()).await?;
		Ok(updated)
	}

	async fn mark_complete(&self, deployment: &Deployment) -> Result<Deployment, sigil_repository::RepositoryError> {
		let mut updated = deployment.clone();
		updated.stage = sigil_primitives::Stage::Completed;
		updated.status = DeploymentStatus::Completed;
		updated.error = None;
		updated.updated_at = chrono::Utc::now();
		self.repository.update_deployment(updated.clone()).await?;
		Ok(updated)
	}

	async fn record_transaction(
		&self,
		deployment_id: Uuid,
		stage: sigil_primitives::Stage,
		hash: &str,
		description: &str,
	) -> Result<(), sigil_repository::RepositoryError> {
		self.repository
			.append_transaction(Transaction { deployment_id, stage, hash: hash.to_string(), description: description.to_string(), created_at: chrono::Utc::now() })
			.await
	}

	async fn save_artifact(&self, deployment_id: Uuid, artifact_type: &str, content: serde_json::Value) -> Result<(), sigil_repository::RepositoryError> {
		self.repository.put_artifact(Artifact { deployment_id, artifact_type: artifact_type.to_string(), content }).await
	}

	async fn mark_stage_complete(&self, deployment_id: Uuid, stage: sigil_primitives::Stage) -> Result<(), sigil_repository::RepositoryError> {
		self.save_artifact(deployment_id, &Self::stage_artifact_type(stage), serde_json::json!({ "completed_at": chrono::Utc::now() })).await
	}

	async fn is_stage_complete(&self, deployment_id: Uuid, stage: sigil_primitives::Stage) -> bool {
		self.repository.get_artifact(deployment_id, &Self::stage_artifact_type(stage)).await.is_ok()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sigil_repository::{InMemoryRepository, Plan};

	async fn sample_deployment(repo: &InMemoryRepository) -> Deployment {
		let org = repo.create_organization("acme", Plan::Free).await.unwrap();
		let deployment = Deployment {
			id: Uuid::new_v4(),
			org_id: org.id,
			chain_id: 7668,
			status: DeploymentStatus::Pending,
			stage: sigil_primitives::Stage::Init,
			config: serde_json::json!({}),
			error: None,
			created_at: chrono::Utc::now(),
			updated_at: chrono::Utc::now(),
		};
		repo.create_deployment(deployment.clone()).await.unwrap();
		deployment
	}

	#[tokio::test]
	async fn update_stage_clears_a_prior_error() {
		let repo = Arc::new(InMemoryRepository::new());
		let deployment = sample_deployment(&repo).await;
		let writer = RepositoryStateWriter::new(repo.clone());
		let failed = writer.mark_failed(&deployment, "boom").await.unwrap();
		assert_eq!(failed.error.as_deref(), Some("boom"));
		let resumed = writer.update_stage(&failed, sigil_primitives::Stage::Superchain).await.unwrap();
		assert!(resumed.error.is_none());
		assert_eq!(resumed.status, DeploymentStatus::Running);
	}

	#[tokio::test]
	async fn stage_completeness_tracks_marked_stages() {
		let repo = Arc::new(InMemoryRepository::new());
		let deployment = sample_deployment(&repo).await;
		let writer = RepositoryStateWriter::new(repo.clone());
		assert!(!writer.is_stage_complete(deployment.id, sigil_primitives::Stage::Init).await);
		writer.mark_stage_complete(deployment.id, sigil_primitives::Stage::Init).await.unwrap();
		assert!(writer.is_stage_complete(deployment.id, sigil_primitives::Stage::Init).await);
		// A different stage is unaffected.
		assert!(!writer.is_stage_complete(deployment.id, sigil_primitives::Stage::Superchain).await);
	}
}
