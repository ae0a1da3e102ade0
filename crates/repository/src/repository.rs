//! The persistence seam. The relational store itself is an external
//! collaborator; this crate only defines the shape callers program against
//! and ships [`crate::memory::InMemoryRepository`] as the default/test
//! backend.

use crate::entities::*;
use crate::error::RepositoryError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait Repository: Send + Sync {
	// -- organizations --
	async fn create_organization(&self, name: &str, plan: Plan) -> Result<Organization, RepositoryError>;
	async fn get_organization(&self, id: Uuid) -> Result<Organization, RepositoryError>;
	async fn set_organization_plan(&self, id: Uuid, plan: Plan) -> Result<Organization, RepositoryError>;

	// -- users --
	async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, RepositoryError>;
	async fn get_user(&self, id: Uuid) -> Result<User, RepositoryError>;
	async fn get_user_by_email(&self, email: &str) -> Result<User, RepositoryError>;

	// -- memberships --
	async fn upsert_membership(
		&self,
		org_id: Uuid,
		user_id: Uuid,
		role: sigil_primitives::Role,
	) -> Result<Membership, RepositoryError>;
	async fn get_membership(&self, org_id: Uuid, user_id: Uuid) -> Result<Membership, RepositoryError>;
	async fn list_memberships(&self, org_id: Uuid) -> Result<Vec<Membership>, RepositoryError>;
	async fn delete_membership(&self, org_id: Uuid, user_id: Uuid) -> Result<(), RepositoryError>;

	// -- API keys --
	async fn create_api_key(&self, key: ApiKey) -> Result<(), RepositoryError>;
	async fn get_api_key(&self, org_id: Uuid, id: Uuid) -> Result<ApiKey, RepositoryError>;
	async fn find_api_key_by_prefix(&self, key_prefix: &str) -> Result<ApiKey, RepositoryError>;
	async fn list_api_keys(&self, org_id: Uuid) -> Result<Vec<ApiKey>, RepositoryError>;
	async fn revoke_api_key(&self, org_id: Uuid, id: Uuid) -> Result<(), RepositoryError>;
	async fn touch_api_key(&self, id: Uuid) -> Result<(), RepositoryError>;

	// -- sessions --
	async fn create_session(&self, session: Session) -> Result<(), RepositoryError>;
	async fn get_session(&self, token: &str) -> Result<Session, RepositoryError>;
	async fn delete_session(&self, token: &str) -> Result<(), RepositoryError>;

	// -- deployments --
	async fn create_deployment(&self, deployment: Deployment) -> Result<(), RepositoryError>;
	async fn get_deployment(&self, org_id: Uuid, id: Uuid) -> Result<Deployment, RepositoryError>;
	async fn update_deployment(&self, deployment: Deployment) -> Result<(), RepositoryError>;
	async fn list_deployments(&self, org_id: Uuid) -> Result<Vec<Deployment>, RepositoryError>;
	/// Cross-organization scan for the staleness sweep: every `running`
	/// deployment whose `updated_at` is older than `updated_before`.
	async fn list_running_deployments_older_than(&self, updated_before: chrono::DateTime<chrono::Utc>) -> Result<Vec<Deployment>, RepositoryError>;

	// -- transactions (append-only) --
	async fn append_transaction(&self, tx: Transaction) -> Result<(), RepositoryError>;
	async fn list_transactions(&self, deployment_id: Uuid) -> Result<Vec<Transaction>, RepositoryError>;

	// -- artifacts --
	async fn put_artifact(&self, artifact: Artifact) -> Result<(), RepositoryError>;
	async fn get_artifact(&self, deployment_id: Uuid, artifact_type: &str) -> Result<Artifact, RepositoryError>;
	async fn list_artifacts(&self, deployment_id: Uuid) -> Result<Vec<Artifact>, RepositoryError>;

	// -- webhooks --
	async fn create_webhook(&self, webhook: Webhook) -> Result<(), RepositoryError>;
	async fn get_webhook(&self, org_id: Uuid, id: Uuid) -> Result<Webhook, RepositoryError>;
	async fn list_webhooks(&self, org_id: Uuid) -> Result<Vec<Webhook>, RepositoryError>;
	async fn list_enabled_webhooks_for_event(&self, org_id: Uuid, event: &str) -> Result<Vec<Webhook>, RepositoryError>;
	async fn update_webhook(&self, webhook: Webhook) -> Result<(), RepositoryError>;
	async fn delete_webhook(&self, org_id: Uuid, id: Uuid) -> Result<(), RepositoryError>;
	async fn record_webhook_delivery(&self, delivery: WebhookDelivery) -> Result<(), RepositoryError>;
	async fn list_webhook_deliveries(&self, webhook_id: Uuid) -> Result<Vec<WebhookDelivery>, RepositoryError>;
	async fn get_webhook_delivery(&self, webhook_id: Uuid, delivery_id: Uuid) -> Result<WebhookDelivery, RepositoryError>;

	// -- audit log --
	async fn append_audit_log(&self, entry: AuditLog) -> Result<(), RepositoryError>;
	/// Cursor-paginated query, newest first. `cursor` is the `id` of the last
	/// entry the caller has already seen; `None` starts from the top.
	async fn query_audit_logs(
		&self,
		org_id: Uuid,
		filter: &AuditLogFilter,
		cursor: Option<Uuid>,
		limit: usize,
	) -> Result<(Vec<AuditLog>, Option<Uuid>), RepositoryError>;

	// -- usage counters --
	async fn increment_usage(&self, org_id: Uuid, metric: &str, period: &str, delta: i64) -> Result<i64, RepositoryError>;
	async fn get_usage(&self, org_id: Uuid, metric: &str, period: &str) -> Result<i64, RepositoryError>;
}
