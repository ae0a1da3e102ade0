//! Fire-and-forget audit logging: callers never block the
//! request path on a write to the audit log, and a logging failure never
//! fails the operation it describes.

use sigil_repository::{ActorType, AuditLog, Repository};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct AuditSink {
	repository: Arc<dyn Repository>,
}

pub struct AuditEvent {
	pub org_id: Uuid,
	pub event: String,
	pub actor_id: Option<Uuid>,
	pub actor_type: ActorType,
	pub resource_type: Option<String>,
	pub resource_id: Option<String>,
	pub ip: Option<String>,
	pub user_agent: Option<String>,
	pub metadata: serde_json::Value,
}

impl AuditSink {
	pub fn new(repository: Arc<dyn Repository>) -> Self {
		Self { repository }
	}

	/// Spawns the write and returns immediately; errors are logged, not
	/// propagated, since a dropped audit entry must never block signing.
	pub fn record(&self, event: AuditEvent) {
		let repository = self.repository.clone();
		tokio::spawn(async move {
			let entry = AuditLog {
				id: Uuid::new_v4(),
				org_id: event.org_id,
				event: event.event,
				actor_id: event.actor_id,
				actor_type: event.actor_type,
				resource_type: event.resource_type,
				resource_id: event.resource_id,
				ip: event.ip,
				user_agent: event.user_agent,
				metadata: event.metadata,
				created_at: chrono::Utc::now(),
			};
			if let Err(err) = repository.append_audit_log(entry).await {
				tracing::warn!(error = %err, "failed to persist audit log entry");
			}
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sigil_repository::{AuditLogFilter, InMemoryRepository, Plan};

	#[tokio::test]
	async fn record_eventually_lands_in_the_repository() {
		let repository: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
		let org = repository.create_organization("acme", Plan::Free).await.unwrap();
		let sink = AuditSink::new(repository.clone());
		sink.record(AuditEvent {
			org_id: org.id,
			event: "key.created".to_string(),
			actor_id: None,
			actor_type: ActorType::System,
			resource_type: Some("key".to_string()),
			resource_id: Some("alpha".to_string()),
			ip: None,
			user_agent: None,
			metadata: serde_json::json!({}),
		});
		// Yield so the spawned task gets a chance to run before we assert.
		tokio::task::yield_now().await;
		tokio::time::sleep(std::time::Duration::from_millis(10)).await;
		let (page, _) = repository.query_audit_logs(org.id, &AuditLogFilter::default(), None, 10).await.unwrap();
		assert_eq!(page.len(), 1);
		assert_eq!(page[0].event, "key.created");
	}
}
