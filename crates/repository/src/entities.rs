//! Entities named in the data model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
	Free,
	Pro,
	Enterprise,
}

/// Quota limits a plan maps to. `-1` denotes unlimited, matching spec 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaLimits {
	pub max_keys: i64,
	pub max_signatures_per_month: i64,
	pub max_namespaces: i64,
	pub max_members: i64,
	pub audit_retention_days: i64,
}

impl Plan {
	pub fn quota_limits(&self) -> QuotaLimits {
		match self {
			Plan::Free => QuotaLimits {
				max_keys: 5,
				max_signatures_per_month: 1_000,
				max_namespaces: 1,
				max_members: 3,
				audit_retention_days: 30,
			},
			Plan::Pro => QuotaLimits {
				max_keys: 100,
				max_signatures_per_month: 1_000_000,
				max_namespaces: 10,
				max_members: 25,
				audit_retention_days: 180,
			},
			Plan::Enterprise => QuotaLimits {
				max_keys: -1,
				max_signatures_per_month: -1,
				max_namespaces: -1,
				max_members: -1,
				audit_retention_days: -1,
			},
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
	pub id: Uuid,
	pub name: String,
	pub plan: Plan,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
	pub id: Uuid,
	pub email: String,
	pub password_hash: String,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Membership {
	pub org_id: Uuid,
	pub user_id: Uuid,
	pub role: sigil_primitives::Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
	pub id: Uuid,
	pub org_id: Uuid,
	pub user_id: Option<Uuid>,
	pub name: String,
	pub key_prefix: String,
	pub key_hash: String,
	pub scopes: Vec<String>,
	pub last_used_at: Option<chrono::DateTime<chrono::Utc>>,
	pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
	pub revoked_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ApiKey {
	/// `not revoked ∧ (no expiry ∨ expiry in future)`, spec 3.
	pub fn is_valid(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
		self.revoked_at.is_none() && self.expires_at.map(|exp| exp > now).unwrap_or(true)
	}

	pub fn has_scope(&self, scope: &str) -> bool {
		self.scopes.iter().any(|s| s == scope || s == "*")
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
	pub token: String,
	pub user_id: Uuid,
	pub org_id: Uuid,
	pub expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
	Pending,
	Running,
	Paused,
	Completed,
	Failed,
}

impl DeploymentStatus {
	/// Statuses `determineStartStage` treats as resumable (re-enter the last
	/// persisted stage rather than restarting at `Init`).
	pub fn is_resumable(&self) -> bool {
		matches!(self, DeploymentStatus::Paused | DeploymentStatus::Running | DeploymentStatus::Failed)
	}
}

impl From<sigil_primitives::DeploymentStatus> for DeploymentStatus {
	fn from(s: sigil_primitives::DeploymentStatus) -> Self {
		match s {
			sigil_primitives::DeploymentStatus::Pending => DeploymentStatus::Pending,
			sigil_primitives::DeploymentStatus::Running => DeploymentStatus::Running,
			sigil_primitives::DeploymentStatus::Paused => DeploymentStatus::Paused,
			sigil_primitives::DeploymentStatus::Completed => DeploymentStatus::Completed,
			sigil_primitives::DeploymentStatus::Failed => DeploymentStatus::Failed,
		}
	}
}

impl From<DeploymentStatus> for sigil_primitives::DeploymentStatus {
	fn from(s: DeploymentStatus) -> Self {
		match s {
			DeploymentStatus::Pending => sigil_primitives::DeploymentStatus::Pending,
			DeploymentStatus::Running => sigil_primitives::DeploymentStatus::Running,
			DeploymentStatus::Paused => sigil_primitives::DeploymentStatus::Paused,
			DeploymentStatus::Completed => sigil_primitives::DeploymentStatus::Completed,
			DeploymentStatus::Failed => sigil_primitives::DeploymentStatus::Failed,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
	pub id: Uuid,
	pub org_id: Uuid,
	pub chain_id: u64,
	pub status: DeploymentStatus,
	pub stage: sigil_primitives::Stage,
	pub config: serde_json::Value,
	pub error: Option<String>,
	pub created_at: chrono::DateTime<chrono::Utc>,
	pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
	pub deployment_id: Uuid,
	pub stage: sigil_primitives::Stage,
	pub hash: String,
	pub description: String,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Binary payloads are wrapped `{"_type":"base64","data":"..."}` so they
/// survive backends that normalize JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
	pub deployment_id: Uuid,
	pub artifact_type: String,
	pub content: serde_json::Value,
}

pub fn wrap_binary_artifact(bytes: &[u8]) -> serde_json::Value {
	use base64::Engine;
	serde_json::json!({
		"_type": "base64",
		"data": base64::engine::general_purpose::STANDARD.encode(bytes),
	})
}

pub fn unwrap_binary_artifact(value: &serde_json::Value) -> Option<Vec<u8>> {
	use base64::Engine;
	let obj = value.as_object()?;
	if obj.get("_type")?.as_str()? != "base64" {
		return None;
	}
	let data = obj.get("data")?.as_str()?;
	base64::engine::general_purpose::STANDARD.decode(data).ok()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
	pub id: Uuid,
	pub org_id: Uuid,
	pub url: String,
	pub secret: String,
	pub events: Vec<String>,
	pub enabled: bool,
	pub failure_count: u32,
	pub last_triggered_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDelivery {
	pub id: Uuid,
	pub webhook_id: Uuid,
	/// The body that was (or will be) POSTed; kept so a failed delivery can
	/// be retried from `/webhooks/{id}/deliveries/{id}/retry` without the
	/// caller resupplying the original event payload.
	pub payload: serde_json::Value,
	pub status_code: Option<u16>,
	pub duration_ms: u64,
	pub success: bool,
	pub error: Option<String>,
	pub attempted_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
	User,
	ApiKey,
	System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
	pub id: Uuid,
	pub org_id: Uuid,
	pub event: String,
	pub actor_id: Option<Uuid>,
	pub actor_type: ActorType,
	pub resource_type: Option<String>,
	pub resource_id: Option<String>,
	pub ip: Option<String>,
	pub user_agent: Option<String>,
	pub metadata: serde_json::Value,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditLogFilter {
	pub event: Option<String>,
	pub resource_type: Option<String>,
	pub resource_id: Option<String>,
	pub actor_id: Option<Uuid>,
	pub since: Option<chrono::DateTime<chrono::Utc>>,
	pub until: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounter {
	pub org_id: Uuid,
	pub metric: String,
	/// Calendar month, `YYYY-MM`, per spec 3 default period.
	pub period: String,
	pub count: i64,
}

pub fn current_period() -> String {
	chrono::Utc::now().format("%Y-%m").to_string()
}
