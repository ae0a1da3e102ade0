//! Background sweep that reclaims deployments stuck `running` past a
//! timeout, generalized from the bridge worker's
//! interval-driven polling loop into a plain async task over the
//! repository rather than a chain RPC.

use sigil_repository::{DeploymentStatus, Repository};
use sigil_telemetry::{AuditEvent, AuditSink};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct StalenessSweep {
	repository: Arc<dyn Repository>,
	audit: AuditSink,
	timeout: Duration,
	interval: Duration,
}

impl StalenessSweep {
	pub fn new(repository: Arc<dyn Repository>, timeout: Duration, interval: Duration) -> Self {
		let audit = AuditSink::new(repository.clone());
		Self { repository, audit, timeout, interval }
	}

	/// Runs one sweep, returning the number of deployments marked failed.
	/// Exposed separately from [`Self::run`] so tests and one-off admin
	/// commands don't need to spin up the interval loop.
	pub async fn sweep_once(&self) -> Result<usize, sigil_repository::RepositoryError> {
		let cutoff = chrono::Utc::now() - chrono::Duration::from_std(self.timeout).unwrap_or(chrono::Duration::zero());
		let stale = self.repository.list_running_deployments_older_than(cutoff).await?;
		for mut deployment in stale.iter().cloned() {
			deployment.status = DeploymentStatus::Failed;
			deployment.error = Some("deployment exceeded the staleness timeout with no progress".to_string());
			deployment.updated_at = chrono::Utc::now();
			self.repository.update_deployment(deployment.clone()).await?;
			self.audit.record(AuditEvent {
				org_id: deployment.org_id,
				event: "deployment.marked_stale".to_string(),
				actor_id: None,
				actor_type: sigil_repository::ActorType::System,
				resource_type: Some("deployment".to_string()),
				resource_id: Some(deployment.id.to_string()),
				ip: None,
				user_agent: None,
				metadata: serde_json::json!({ "stage": deployment.stage }),
			});
			tracing::warn!(deployment_id = %deployment.id, org_id = %deployment.org_id, "marked stale deployment as failed");
		}
		Ok(stale.len())
	}

	/// Polls at `interval` until `cancel` fires.
	pub async fn run(self, cancel: CancellationToken) {
		let mut ticker = tokio::time::interval(self.interval);
		loop {
			tokio::select! {
				biased;
				_ = cancel.cancelled() => {
					tracing::info!("staleness sweep shutting down");
					return;
				}
				_ = ticker.tick() => {
					if let Err(err) = self.sweep_once().await {
						tracing::warn!(error = %err, "staleness sweep failed");
					}
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sigil_primitives::Stage;
	use sigil_repository::{Deployment, InMemoryRepository, Plan};
	use uuid::Uuid;

	#[tokio::test]
	async fn sweep_fails_only_deployments_past_the_timeout() {
		let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
		let org = repo.create_organization("acme", Plan::Free).await.unwrap();
		let stale = Deployment {
			id: Uuid::new_v4(),
			org_id: org.id,
			chain_id: 1,
			status: DeploymentStatus::Running,
			stage: Stage::Genesis,
			config: serde_json::json!({}),
			error: None,
			created_at: chrono::Utc::now() - chrono::Duration::hours(1),
			updated_at: chrono::Utc::now() - chrono::Duration::hours(1),
		};
		let fresh = Deployment { id: Uuid::new_v4(), updated_at: chrono::Utc::now(), ..stale.clone() };
		repo.create_deployment(stale.clone()).await.unwrap();
		repo.create_deployment(fresh.clone()).await.unwrap();

		let sweeper = StalenessSweep::new(repo.clone(), Duration::from_secs(60), Duration::from_secs(1));
		let count = sweeper.sweep_once().await.unwrap();
		assert_eq!(count, 1);

		let reloaded_stale = repo.get_deployment(org.id, stale.id).await.unwrap();
		assert_eq!(reloaded_stale.status, DeploymentStatus::Failed);
		assert!(reloaded_stale.error.is_some());

		let reloaded_fresh = repo.get_deployment(org.id, fresh.id).await.unwrap();
		assert_eq!(reloaded_fresh.status, DeploymentStatus::Running);
	}
}
