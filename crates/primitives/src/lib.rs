//! Common types shared across the signing control plane: key metadata,
//! deployment stages, roles, and the error taxonomy every crate maps into.

pub mod address;
pub mod error;
pub mod key;
pub mod rpc_error;
pub mod stage;

pub use address::{batch_inbox_address, derive_eth_address, keccak256};
pub use error::ErrorKind;
pub use key::{Algorithm, KeyRecord, KeySource};
pub use rpc_error::RpcErrorCode;
pub use stage::{DeploymentStatus, Stage, StageOrder};

/// Role ordering used by `Membership` access checks: the member's level must be
/// `>=` the required role's level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	Viewer = 1,
	Operator = 2,
	Admin = 3,
	Owner = 4,
}

impl Role {
	pub fn satisfies(&self, required: Role) -> bool {
		*self >= required
	}
}

/// Sentinel returned by context accessors when no identity is present. Never
/// `panic!`/`unwrap` on a missing identity — check against this instead.
pub const NIL_ORG_ID: uuid::Uuid = uuid::Uuid::nil();

pub use uuid;
