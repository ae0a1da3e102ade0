//! `tokio::sync::RwLock<HashMap<..>>`-backed [`Repository`]: the shipped
//! default for tests and for operators who haven't wired a real store yet.

use crate::entities::*;
use crate::error::RepositoryError;
use crate::repository::Repository;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryRepository {
	organizations: RwLock<HashMap<Uuid, Organization>>,
	users: RwLock<HashMap<Uuid, User>>,
	memberships: RwLock<HashMap<(Uuid, Uuid), Membership>>,
	api_keys: RwLock<HashMap<Uuid, ApiKey>>,
	sessions: RwLock<HashMap<String, Session>>,
	deployments: RwLock<HashMap<Uuid, Deployment>>,
	transactions: RwLock<HashMap<Uuid, Vec<Transaction>>>,
	artifacts: RwLock<HashMap<(Uuid, String), Artifact>>,
	webhooks: RwLock<HashMap<Uuid, Webhook>>,
	webhook_deliveries: RwLock<HashMap<Uuid, Vec<WebhookDelivery>>>,
	audit_log: RwLock<Vec<AuditLog>>,
	usage: RwLock<HashMap<(Uuid, String, String), i64>>,
}

impl InMemoryRepository {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl Repository for InMemoryRepository {
	async fn create_organization(&self, name: &str, plan: Plan) -> Result<Organization, RepositoryError> {
		let org = Organization { id: Uuid::new_v4(), name: name.to_string(), plan, created_at: chrono::Utc::now() };
		self.organizations.write().await.insert(org.id, org.clone());
		Ok(org)
	}

	async fn get_organization(&self, id: Uuid) -> Result<Organization, RepositoryError> {
		self.organizations
			.read()
			.await
			.get(&id)
			.cloned()
			.ok_or_else(|| RepositoryError::NotFound(format!("organization {id}")))
	}

	async fn set_organization_plan(&self, id: Uuid, plan: Plan) -> Result<Organization, RepositoryError> {
		let mut orgs = self.organizations.write().await;
		let org = orgs.get_mut(&id).ok_or_else(|| RepositoryError::NotFound(format!("organization {id}")))?;
		org.plan = plan;
		Ok(org.clone())
	}

	async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, RepositoryError> {
		let mut users = self.users.write().await;
		if users.values().any(|u| u.email.eq_ignore_ascii_case(email)) {
			return Err(RepositoryError::Conflict(format!("user with email {email}")));
		}
		let user =
			User { id: Uuid::new_v4(), email: email.to_string(), password_hash: password_hash.to_string(), created_at: chrono::Utc::now() };
		users.insert(user.id, user.clone());
		Ok(user)
	}

	async fn get_user(&self, id: Uuid) -> Result<User, RepositoryError> {
		self.users.read().await.get(&id).cloned().ok_or_else(|| RepositoryError::NotFound(format!("user {id}")))
	}

	async fn get_user_by_email(&self, email: &str) -> Result<User, RepositoryError> {
		self.users
			.read()
			.await
			.values()
			.find(|u| u.email.eq_ignore_ascii_case(email))
			.cloned()
			.ok_or_else(|| RepositoryError::NotFound(format!("user with email {email}")))
	}

	async fn upsert_membership(
		&self,
		org_id: Uuid,
		user_id: Uuid,
		role: sigil_primitives::Role,
	) -> Result<Membership, RepositoryError> {
		let membership = Membership { org_id, user_id, role };
		self.memberships.write().await.insert((org_id, user_id), membership);
		Ok(membership)
	}

	async fn get_membership(&self, org_id: Uuid, user_id: Uuid) -> Result<Membership, RepositoryError> {
		self.memberships
			.read()
			.await
			.get(&(org_id, user_id))
			.copied()
			.ok_or_else(|| RepositoryError::NotFound(format!("membership {org_id}/{user_id}")))
	}

	async fn list_memberships(&self, org_id: Uuid) -> Result<Vec<Membership>, RepositoryError> {
		Ok(self.memberships.read().await.values().filter(|m| m.org_id == org_id).copied().collect())
	}

	async fn delete_membership(&self, org_id: Uuid, user_id: Uuid) -> Result<(), RepositoryError> {
		self.memberships
			.write()
			.await
			.remove(&(org_id, user_id))
			.map(|_| ())
			.ok_or_else(|| RepositoryError::NotFound(format!("membership {org_id}/{user_id}")))
	}

	async fn create_api_key(&self, key: ApiKey) -> Result<(), RepositoryError> {
		let mut keys = self.api_keys.write().await;
		if keys.values().any(|k| k.key_prefix == key.key_prefix) {
			return Err(RepositoryError::Conflict(format!("api key prefix {}", key.key_prefix)));
		}
		keys.insert(key.id, key);
		Ok(())
	}

	async fn get_api_key(&self, org_id: Uuid, id: Uuid) -> Result<ApiKey, RepositoryError> {
		self.api_keys
			.read()
			.await
			.get(&id)
			.filter(|k| k.org_id == org_id)
			.cloned()
			.ok_or_else(|| RepositoryError::NotFound(format!("api key {id}")))
	}

	async fn find_api_key_by_prefix(&self, key_prefix: &str) -> Result<ApiKey, RepositoryError> {
		self.api_keys
			.read()
			.await
			.values()
			.find(|k| k.key_prefix == key_prefix)
			.cloned()
			.ok_or_else(|| RepositoryError::NotFound(format!("api key prefix {key_prefix}")))
	}

	async fn list_api_keys(&self, org_id: Uuid) -> Result<Vec<ApiKey>, RepositoryError> {
		Ok(self.api_keys.read().await.values().filter(|k| k.org_id == org_id).cloned().collect())
	}

	async fn revoke_api_key(&self, org_id: Uuid, id: Uuid) -> Result<(), RepositoryError> {
		let mut keys = self.api_keys.write().await;
		let key = keys.get_mut(&id).filter(|k| k.org_id == org_id).ok_or_else(|| RepositoryError::NotFound(format!("api key {id}")))?;
		key.revoked_at = Some(chrono::Utc::now());
		Ok(())
	}

	async fn touch_api_key(&self, id: Uuid) -> Result<(), RepositoryError> {
		let mut keys = self.api_keys.write().await;
		let key = keys.get_mut(&id).ok_or_else(|| RepositoryError::NotFound(format!("api key {id}")))?;
		key.last_used_at = Some(chrono::Utc::now());
		Ok(())
	}

	async fn create_session(&self, session: Session) -> Result<(), RepositoryError> {
		self.sessions.write().await.insert(session.token.clone(), session);
		Ok(())
	}

	async fn get_session(&self, token: &str) -> Result<Session, RepositoryError> {
		self.sessions.read().await.get(token).cloned().ok_or_else(|| RepositoryError::NotFound("session".to_string()))
	}

	async fn delete_session(&self, token: &str) -> Result<(), RepositoryError> {
		self.sessions.write().await.remove(token);
		Ok(())
	}

	async fn create_deployment(&self, deployment: Deployment) -> Result<(), RepositoryError> {
		let mut deployments = self.deployments.write().await;
		if deployments.contains_key(&deployment.id) {
			return Err(RepositoryError::Conflict(format!("deployment {}", deployment.id)));
		}
		deployments.insert(deployment.id, deployment);
		Ok(())
	}

	async fn get_deployment(&self, org_id: Uuid, id: Uuid) -> Result<Deployment, RepositoryError> {
		self.deployments
			.read()
			.await
			.get(&id)
			.filter(|d| d.org_id == org_id)
			.cloned()
			.ok_or_else(|| RepositoryError::NotFound(format!("deployment {id}")))
	}

	async fn update_deployment(&self, deployment: Deployment) -> Result<(), RepositoryError> {
		let mut deployments = self.deployments.write().await;
		if !deployments.contains_key(&deployment.id) {
			return Err(RepositoryError::NotFound(format!("deployment {}", deployment.id)));
		}
		deployments.insert(deployment.id, deployment);
		Ok(())
	}

	async fn list_deployments(&self, org_id: Uuid) -> Result<Vec<Deployment>, RepositoryError> {
		Ok(self.deployments.read().await.values().filter(|d| d.org_id == org_id).cloned().collect())
	}

	async fn list_running_deployments_older_than(&self, updated_before: chrono::DateTime<chrono::Utc>) -> Result<Vec<Deployment>, RepositoryError> {
		Ok(self
			.deployments
			.read()
			.await
			.values()
			.filter(|d| d.status == DeploymentStatus::Running && d.updated_at < updated_before)
			.cloned()
			.collect())
	}

	async fn append_transaction(&self, tx: Transaction) -> Result<(), RepositoryError> {
		self.transactions.write().await.entry(tx.deployment_id).or_default().push(tx);
		Ok(())
	}

	async fn list_transactions(&self, deployment_id: Uuid) -> Result<Vec<Transaction>, RepositoryError> {
		Ok(self.transactions.read().await.get(&deployment_id).cloned().unwrap_or_default())
	}

	async fn put_artifact(&self, artifact: Artifact) -> Result<(), RepositoryError> {
		self.artifacts
			.write()
			.await
			.insert((artifact.deployment_id, artifact.artifact_type.clone()), artifact);
		Ok(())
	}

	async fn get_artifact(&self, deployment_id: Uuid, artifact_type: &str) -> Result<Artifact, RepositoryError> {
		self.artifacts
			.read()
			.await
			.get(&(deployment_id, artifact_type.to_string()))
			.cloned()
			.ok_or_else(|| RepositoryError::NotFound(format!("artifact {artifact_type} for deployment {deployment_id}")))
	}

	async fn list_artifacts(&self, deployment_id: Uuid) -> Result<Vec<Artifact>, RepositoryError> {
		Ok(self.artifacts.read().await.values().filter(|a| a.deployment_id == deployment_id).cloned().collect())
	}

	async fn create_webhook(&self, webhook: Webhook) -> Result<(), RepositoryError> {
		self.webhooks.write().await.insert(webhook.id, webhook);
		Ok(())
	}

	async fn get_webhook(&self, org_id: Uuid, id: Uuid) -> Result<Webhook, RepositoryError> {
		self.webhooks
			.read()
			.await
			.get(&id)
			.filter(|w| w.org_id == org_id)
			.cloned()
			.ok_or_else(|| RepositoryError::NotFound(format!("webhook {id}")))
	}

	async fn list_webhooks(&self, org_id: Uuid) -> Result<Vec<Webhook>, RepositoryError> {
		Ok(self.webhooks.read().await.values().filter(|w| w.org_id == org_id).cloned().collect())
	}

	async fn list_enabled_webhooks_for_event(&self, org_id: Uuid, event: &str) -> Result<Vec<Webhook>, RepositoryError> {
		Ok(self
			.webhooks
			.read()
			.await
			.values()
			.filter(|w| w.org_id == org_id && w.enabled && w.events.iter().any(|e| e == event || e == "*"))
			.cloned()
			.collect())
	}

	async fn update_webhook(&self, webhook: Webhook) -> Result<(), RepositoryError> {
		let mut webhooks = self.webhooks.write().await;
		if !webhooks.contains_key(&webhook.id) {
			return Err(RepositoryError::NotFound(format!("webhook {}", webhook.id)));
		}
		webhooks.insert(webhook.id, webhook);
		Ok(())
	}

	async fn delete_webhook(&self, org_id: Uuid, id: Uuid) -> Result<(), RepositoryError> {
		let mut webhooks = self.webhooks.write().await;
		match webhooks.get(&id) {
			Some(w) if w.org_id == org_id => {
				webhooks.remove(&id);
				Ok(())
			}
			_ => Err(RepositoryError::NotFound(format!("webhook {id}"))),
		}
	}

	async fn record_webhook_delivery(&self, delivery: WebhookDelivery) -> Result<(), RepositoryError> {
		self.webhook_deliveries.write().await.entry(delivery.webhook_id).or_default().push(delivery);
		Ok(())
	}

	async fn list_webhook_deliveries(&self, webhook_id: Uuid) -> Result<Vec<WebhookDelivery>, RepositoryError> {
		Ok(self.webhook_deliveries.read().await.get(&webhook_id).cloned().unwrap_or_default())
	}

	async fn get_webhook_delivery(&self, webhook_id: Uuid, delivery_id: Uuid) -> Result<WebhookDelivery, RepositoryError> {
		self.webhook_deliveries
			.read()
			.await
			.get(&webhook_id)
			.and_then(|deliveries| deliveries.iter().find(|d| d.id == delivery_id))
			.cloned()
			.ok_or_else(|| RepositoryError::NotFound(format!("webhook delivery {delivery_id}")))
	}

	async fn append_audit_log(&self, entry: AuditLog) -> Result<(), RepositoryError> {
		self.audit_log.write().await.push(entry);
		Ok(())
	}

	async fn query_audit_logs(
		&self,
		org_id: Uuid,
		filter: &AuditLogFilter,
		cursor: Option<Uuid>,
		limit: usize,
	) -> Result<(Vec<AuditLog>, Option<Uuid>), RepositoryError> {
		let log = self.audit_log.read().await;
		let mut matching: Vec<&AuditLog> = log
			.iter()
			.filter(|e| e.org_id == org_id)
			.filter(|e| filter.event.as_deref().map(|v| v == e.event).unwrap_or(true))
			.filter(|e| filter.resource_type.as_deref().map(|v| Some(v) == e.resource_type.as_deref()).unwrap_or(true))
			.filter(|e| filter.resource_id.as_deref().map(|v| Some(v) == e.resource_id.as_deref()).unwrap_or(true))
			.filter(|e| filter.actor_id.map(|v| Some(v) == e.actor_id).unwrap_or(true))
			.filter(|e| filter.since.map(|v| e.created_at >= v).unwrap_or(true))
			.filter(|e| filter.until.map(|v| e.created_at <= v).unwrap_or(true))
			.collect();
		// newest first
		matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

		let start = match cursor {
			None => 0,
			Some(after_id) => matching
				.iter()
				.position(|e| e.id == after_id)
				.map(|idx| idx + 1)
				.ok_or_else(|| RepositoryError::NotFound(format!("audit log cursor {after_id}")))?,
		};
		let page: Vec<AuditLog> = matching.iter().skip(start).take(limit).map(|e| (*e).clone()).collect();
		let next_cursor = if start + page.len() < matching.len() { page.last().map(|e| e.id) } else { None };
		Ok((page, next_cursor))
	}

	async fn increment_usage(&self, org_id: Uuid, metric: &str, period: &str, delta: i64) -> Result<i64, RepositoryError> {
		let mut usage = self.usage.write().await;
		let counter = usage.entry((org_id, metric.to_string(), period.to_string())).or_insert(0);
		*counter += delta;
		Ok(*counter)
	}

	async fn get_usage(&self, org_id: Uuid, metric: &str, period: &str) -> Result<i64, RepositoryError> {
		Ok(*self.usage.read().await.get(&(org_id, metric.to_string(), period.to_string())).unwrap_or(&0))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn organization_round_trips() {
		let repo = InMemoryRepository::new();
		let org = repo.create_organization("acme", Plan::Pro).await.unwrap();
		let fetched = repo.get_organization(org.id).await.unwrap();
		assert_eq!(org.id, fetched.id);
		assert_eq!(fetched.plan, Plan::Pro);
	}

	#[tokio::test]
	async fn duplicate_email_is_conflict() {
		let repo = InMemoryRepository::new();
		repo.create_user("a@example.com", "hash").await.unwrap();
		let err = repo.create_user("A@Example.com", "hash2").await.unwrap_err();
		assert!(matches!(err, RepositoryError::Conflict(_)));
	}

	#[tokio::test]
	async fn membership_role_satisfies_scopes_are_org_scoped() {
		let repo = InMemoryRepository::new();
		let org_a = repo.create_organization("a", Plan::Free).await.unwrap();
		let org_b = repo.create_organization("b", Plan::Free).await.unwrap();
		let user = repo.create_user("u@example.com", "hash").await.unwrap();
		repo.upsert_membership(org_a.id, user.id, sigil_primitives::Role::Owner).await.unwrap();
		assert!(repo.get_membership(org_a.id, user.id).await.is_ok());
		assert!(repo.get_membership(org_b.id, user.id).await.is_err());
	}

	#[tokio::test]
	async fn api_key_prefix_collision_is_conflict() {
		let repo = InMemoryRepository::new();
		let org = repo.create_organization("acme", Plan::Free).await.unwrap();
		let key_a = ApiKey {
			id: Uuid::new_v4(),
			org_id: org.id,
			user_id: None,
			name: "ci".to_string(),
			key_prefix: "sk_live_abcd".to_string(),
			key_hash: "hash-a".to_string(),
			scopes: vec!["sign".to_string()],
			last_used_at: None,
			expires_at: None,
			revoked_at: None,
		};
		repo.create_api_key(key_a.clone()).await.unwrap();
		let mut key_b = key_a.clone();
		key_b.id = Uuid::new_v4();
		let err = repo.create_api_key(key_b).await.unwrap_err();
		assert!(matches!(err, RepositoryError::Conflict(_)));
	}

	#[tokio::test]
	async fn audit_log_pagination_walks_newest_first() {
		let repo = InMemoryRepository::new();
		let org = repo.create_organization("acme", Plan::Free).await.unwrap();
		for i in 0..5 {
			repo.append_audit_log(AuditLog {
				id: Uuid::new_v4(),
				org_id: org.id,
				event: "key.created".to_string(),
				actor_id: None,
				actor_type: ActorType::System,
				resource_type: None,
				resource_id: None,
				ip: None,
				user_agent: None,
				metadata: serde_json::json!({ "i": i }),
				created_at: chrono::Utc::now() + chrono::Duration::seconds(i),
			})
			.await
			.unwrap();
		}
		let (page1, cursor1) = repo.query_audit_logs(org.id, &AuditLogFilter::default(), None, 2).await.unwrap();
		assert_eq!(page1.len(), 2);
		assert_eq!(page1[0].metadata["i"], 4);
		let cursor1 = cursor1.expect("more pages remain");
		let (page2, _) = repo.query_audit_logs(org.id, &AuditLogFilter::default(), Some(cursor1), 10).await.unwrap();
		assert_eq!(page2.len(), 3);
		assert_eq!(page2[0].metadata["i"], 2);
	}

	#[tokio::test]
	async fn usage_counter_accumulates_per_period() {
		let repo = InMemoryRepository::new();
		let org = repo.create_organization("acme", Plan::Free).await.unwrap();
		repo.increment_usage(org.id, "signatures", "2026-07", 1).await.unwrap();
		let total = repo.increment_usage(org.id, "signatures", "2026-07", 4).await.unwrap();
		assert_eq!(total, 5);
		assert_eq!(repo.get_usage(org.id, "signatures", "2026-07").await.unwrap(), 5);
		assert_eq!(repo.get_usage(org.id, "signatures", "2026-08").await.unwrap(), 0);
	}

	#[tokio::test]
	async fn stale_deployment_scan_ignores_fresh_and_non_running() {
		let repo = InMemoryRepository::new();
		let org = repo.create_organization("acme", Plan::Free).await.unwrap();
		let old_running = Deployment {
			id: Uuid::new_v4(),
			org_id: org.id,
			chain_id: 1,
			status: DeploymentStatus::Running,
			stage: sigil_primitives::Stage::Superchain,
			config: serde_json::json!({}),
			error: None,
			created_at: chrono::Utc::now() - chrono::Duration::hours(2),
			updated_at: chrono::Utc::now() - chrono::Duration::hours(2),
		};
		let fresh_running = Deployment { id: Uuid::new_v4(), updated_at: chrono::Utc::now(), ..old_running.clone() };
		let old_completed = Deployment { id: Uuid::new_v4(), status: DeploymentStatus::Completed, ..old_running.clone() };
		repo.create_deployment(old_running.clone()).await.unwrap();
		repo.create_deployment(fresh_running).await.unwrap();
		repo.create_deployment(old_completed).await.unwrap();

		let cutoff = chrono::Utc::now() - chrono::Duration::minutes(30);
		let stale = repo.list_running_deployments_older_than(cutoff).await.unwrap();
		assert_eq!(stale.len(), 1);
		assert_eq!(stale[0].id, old_running.id);
	}
}
