//! Logical key metadata as stored in the keyring index.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Signing algorithm backing a logical key. Closed set — dispatch on the tag
/// rather than probing capabilities at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
	Secp256k1,
}

impl Algorithm {
	pub fn as_str(&self) -> &'static str {
		match self {
			Algorithm::Secp256k1 => "secp256k1",
		}
	}
}

/// Where a key's material originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
	Generated,
	Imported,
}

/// A single entry in the keyring index file.
///
/// Invariants: `pub_key` recomputes to `address` via
/// [`crate::derive_eth_address`]; the record exists locally iff the secret
/// store has a matching key at `store_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
	pub uid: String,
	pub name: String,
	/// 33-byte compressed public key, base64-encoded.
	pub pub_key: String,
	pub pub_key_type: Algorithm,
	pub address: String,
	pub bao_key_path: String,
	pub algorithm: Algorithm,
	pub exportable: bool,
	pub created_at: chrono::DateTime<chrono::Utc>,
	pub source: KeySource,
	/// Tenant that owns this key in the control plane; `None` for a
	/// standalone CLI keyring with no organization concept. Omitted from
	/// the serialized index when absent so the single-tenant wire shape is
	/// unchanged.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub org_id: Option<Uuid>,
}

impl KeyRecord {
	pub fn store_path(name: &str) -> String {
		format!("secp256k1/keys/{name}")
	}
}
