//! The resolved identity attached to a request once credentials have been
//! validated.

use crate::error::AuthError;
use sigil_primitives::Role;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum Principal {
	User { user_id: Uuid },
	ApiKey { api_key_id: Uuid },
}

#[derive(Debug, Clone)]
pub struct AuthContext {
	pub org_id: Uuid,
	pub principal: Principal,
	pub role: Role,
	pub scopes: Vec<String>,
}

impl AuthContext {
	pub fn has_scope(&self, scope: &str) -> bool {
		self.scopes.iter().any(|s| s == scope || s == "*")
	}

	pub fn has_any_scope(&self, scopes: &[&str]) -> bool {
		scopes.iter().any(|s| self.has_scope(s))
	}

	pub fn require_scope(&self, scope: &str) -> Result<(), AuthError> {
		self.has_scope(scope).then_some(()).ok_or_else(|| AuthError::MissingScope(scope.to_string()))
	}

	pub fn require_any_scope(&self, scopes: &[&str]) -> Result<(), AuthError> {
		self.has_any_scope(scopes).then_some(()).ok_or_else(|| AuthError::MissingScope(scopes.join(" or ")))
	}

	pub fn require_role(&self, required: Role) -> Result<(), AuthError> {
		self.role.satisfies(required).then_some(()).ok_or(AuthError::InsufficientRole)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ctx(scopes: &[&str], role: Role) -> AuthContext {
		AuthContext {
			org_id: Uuid::new_v4(),
			principal: Principal::User { user_id: Uuid::new_v4() },
			role,
			scopes: scopes.iter().map(|s| s.to_string()).collect(),
		}
	}

	#[test]
	fn wildcard_scope_satisfies_anything() {
		let c = ctx(&["*"], Role::Owner);
		assert!(c.require_scope("keys:write").is_ok());
	}

	#[test]
	fn missing_scope_is_rejected() {
		let c = ctx(&["keys:read"], Role::Owner);
		assert!(c.require_scope("keys:write").is_err());
	}

	#[test]
	fn role_ordering_is_respected() {
		let c = ctx(&["*"], Role::Operator);
		assert!(c.require_role(Role::Viewer).is_ok());
		assert!(c.require_role(Role::Admin).is_err());
	}
}
