//! Resolves an already-extracted [`RawCredential`] into an [`AuthContext`]
//! against the repository.

use crate::api_key;
use crate::context::{AuthContext, Principal};
use crate::credentials::RawCredential;
use crate::error::AuthError;
use sigil_repository::Repository;
use std::sync::Arc;

pub struct Authenticator {
	repository: Arc<dyn Repository>,
}

impl Authenticator {
	pub fn new(repository: Arc<dyn Repository>) -> Self {
		Self { repository }
	}

	pub async fn resolve(&self, credential: RawCredential) -> Result<AuthContext, AuthError> {
		match credential {
			RawCredential::ApiKey(raw) => self.resolve_api_key(&raw).await,
			RawCredential::SessionToken(token) => self.resolve_session(&token).await,
		}
	}

	async fn resolve_api_key(&self, raw: &str) -> Result<AuthContext, AuthError> {
		let prefix: String = raw.chars().take(12).collect();
		let key = self.repository.find_api_key_by_prefix(&prefix).await.map_err(|_| AuthError::InvalidCredential)?;
		if !key.is_valid(chrono::Utc::now()) {
			return Err(AuthError::Expired);
		}
		api_key::verify(raw, &key.key_hash)?;
		let _ = self.repository.touch_api_key(key.id).await;

		let role = match key.user_id {
			Some(user_id) => {
				self.repository.get_membership(key.org_id, user_id).await.map(|m| m.role).unwrap_or(sigil_primitives::Role::Viewer)
			}
			None => sigil_primitives::Role::Operator,
		};

		Ok(AuthContext { org_id: key.org_id, principal: Principal::ApiKey { api_key_id: key.id }, role, scopes: key.scopes })
	}

	async fn resolve_session(&self, token: &str) -> Result<AuthContext, AuthError> {
		let session = self.repository.get_session(token).await.map_err(|_| AuthError::InvalidCredential)?;
		if session.expires_at <= chrono::Utc::now() {
			return Err(AuthError::Expired);
		}
		let membership = self
			.repository
			.get_membership(session.org_id, session.user_id)
			.await
			.map_err(|_| AuthError::InvalidCredential)?;
		Ok(AuthContext {
			org_id: session.org_id,
			principal: Principal::User { user_id: session.user_id },
			role: membership.role,
			scopes: vec!["*".to_string()],
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sigil_repository::{ApiKey, InMemoryRepository, Plan};
	use uuid::Uuid;

	#[tokio::test]
	async fn unknown_api_key_prefix_is_invalid() {
		let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
		let auth = Authenticator::new(repo);
		let err = auth.resolve(RawCredential::ApiKey("sk_live_doesnotexist12".to_string())).await.unwrap_err();
		assert!(matches!(err, AuthError::InvalidCredential));
	}

	#[tokio::test]
	async fn revoked_api_key_is_expired() {
		let repo = Arc::new(InMemoryRepository::new());
		let org = repo.create_organization("acme", Plan::Free).await.unwrap();
		let minted = api_key::mint();
		repo.create_api_key(ApiKey {
			id: Uuid::new_v4(),
			org_id: org.id,
			user_id: None,
			name: "ci".to_string(),
			key_prefix: minted.key_prefix.clone(),
			key_hash: minted.key_hash.clone(),
			scopes: vec!["*".to_string()],
			last_used_at: None,
			expires_at: None,
			revoked_at: Some(chrono::Utc::now()),
		})
		.await
		.unwrap();
		let auth = Authenticator::new(repo as Arc<dyn Repository>);
		let err = auth.resolve(RawCredential::ApiKey(minted.raw_secret)).await.unwrap_err();
		assert!(matches!(err, AuthError::Expired));
	}

	#[tokio::test]
	async fn valid_api_key_resolves_to_its_scopes() {
		let repo = Arc::new(InMemoryRepository::new());
		let org = repo.create_organization("acme", Plan::Free).await.unwrap();
		let minted = api_key::mint();
		repo.create_api_key(ApiKey {
			id: Uuid::new_v4(),
			org_id: org.id,
			user_id: None,
			name: "ci".to_string(),
			key_prefix: minted.key_prefix.clone(),
			key_hash: minted.key_hash.clone(),
			scopes: vec!["sign:evm".to_string()],
			last_used_at: None,
			expires_at: None,
			revoked_at: None,
		})
		.await
		.unwrap();
		let auth = Authenticator::new(repo as Arc<dyn Repository>);
		let ctx = auth.resolve(RawCredential::ApiKey(minted.raw_secret)).await.unwrap();
		assert_eq!(ctx.org_id, org.id);
		assert!(ctx.has_scope("sign:evm"));
		assert!(!ctx.has_scope("keys:write"));
	}
}
