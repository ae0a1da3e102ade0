//! The keyring: mediates every operation that needs both store-side and
//! index-side consistency.

use crate::error::KeyringError;
use crate::index::Index;
use base64::Engine;
use sigil_primitives::{derive_eth_address, Algorithm, KeyRecord, KeySource};
use sigil_secretstore::{CreateKeyOptions, SecretStoreClient};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub struct KeyringConfig {
	pub index_path: PathBuf,
}

/// Index of logical key names -> store-backed metadata. Mutating operations
/// are serialized by an in-process mutex (the design treats the keyring as
/// process-local; cross-process concurrency is the operator's problem to
/// serialize externally, per spec 5).
pub struct Keyring {
	store: SecretStoreClient,
	index: Arc<Mutex<Index>>,
}

impl Keyring {
	/// Validates store reachability via `Health()`, then opens or creates
	/// the index file.
	pub async fn new(store: SecretStoreClient, config: KeyringConfig) -> Result<Self, KeyringError> {
		if !store.health().await {
			return Err(KeyringError::StoreUnreachable);
		}
		let index = Index::open(&config.index_path).await?;
		Ok(Self { store, index: Arc::new(Mutex::new(index)) })
	}

	/// No-op: the index is flushed after every mutation, nothing to flush on
	/// close. Present for symmetry with `New` and to give callers an
	/// explicit point to drop the handle.
	pub fn close(self) {}

	pub async fn list(&self) -> Vec<KeyRecord> {
		let index = self.index.lock().await;
		index.list().into_iter().cloned().collect()
	}

	pub async fn get_metadata(&self, name: &str) -> Result<KeyRecord, KeyringError> {
		let index = self.index.lock().await;
		index.get(name).cloned().ok_or_else(|| KeyringError::NotFound(name.to_string()))
	}

	/// Looks up a key by its signer address (case-insensitive), scoped to
	/// `org_id` so one tenant can never route a signature to another
	/// tenant's key. Used by the RPC sign handlers to route a request to
	/// its key.
	pub async fn find_by_address(&self, address: &str, org_id: Uuid) -> Result<KeyRecord, KeyringError> {
		let index = self.index.lock().await;
		index
			.list()
			.into_iter()
			.find(|r| r.address.eq_ignore_ascii_case(address) && r.org_id == Some(org_id))
			.cloned()
			.ok_or_else(|| KeyringError::NotFound(address.to_string()))
	}

	/// Underlying client, used by sign handlers to call `SignEVM` directly
	/// with a resolved `store_path`.
	pub fn store(&self) -> &SecretStoreClient {
		&self.store
	}

	/// Refuses if `name` already exists; otherwise creates in the store,
	/// derives `pub_key`/`address`, and appends to the index atomically.
	/// `org_id` is `None` for a standalone CLI keyring; the server always
	/// passes the creating tenant's id so `find_by_address` can scope to it.
	pub async fn new_account_with_options(
		&self,
		name: &str,
		exportable: bool,
		org_id: Option<Uuid>,
	) -> Result<KeyRecord, KeyringError> {
		let mut index = self.index.lock().await;
		if index.contains(name) {
			return Err(KeyringError::Conflict(name.to_string()));
		}
		let path = KeyRecord::store_path(name);
		let created = self.store.create_key(&path, CreateKeyOptions { exportable }).await?;
		let pub_key_bytes: [u8; 33] = hex::decode(created.pub_key_hex.trim_start_matches("0x"))
			.map_err(|_| KeyringError::Store(sigil_secretstore::SecretStoreError::Http(
				"secret store returned a malformed public key".into(),
			)))?
			.try_into()
			.map_err(|_| KeyringError::Store(sigil_secretstore::SecretStoreError::Http(
				"secret store returned a public key that is not 33 bytes".into(),
			)))?;
		let address = created.address.unwrap_or(derive_eth_address(&pub_key_bytes)?);
		let record = KeyRecord {
			uid: uuid::Uuid::new_v4().to_string(),
			name: name.to_string(),
			pub_key: base64::engine::general_purpose::STANDARD.encode(pub_key_bytes),
			pub_key_type: Algorithm::Secp256k1,
			address,
			bao_key_path: path,
			algorithm: Algorithm::Secp256k1,
			exportable,
			created_at: chrono::Utc::now(),
			source: KeySource::Generated,
			org_id,
		};
		index.insert(record.clone()).await?;
		Ok(record)
	}

	/// Inserts a record whose private material already lives in the store
	/// (used by [`crate::migration`] import). Fails if `name` already
	/// exists.
	pub async fn adopt_existing(&self, record: KeyRecord) -> Result<(), KeyringError> {
		let mut index = self.index.lock().await;
		if index.contains(&record.name) {
			return Err(KeyringError::Conflict(record.name));
		}
		index.insert(record).await
	}

	pub async fn rename(&self, old: &str, new: &str) -> Result<(), KeyringError> {
		let mut index = self.index.lock().await;
		if !index.contains(old) {
			return Err(KeyringError::NotFound(old.to_string()));
		}
		if index.contains(new) {
			return Err(KeyringError::Conflict(new.to_string()));
		}
		index.rename(old, new).await
	}

	/// Deletes store-side then index-side; a store 404 is treated as
	/// success so the keyring stays self-healing after a partial failure
	/// (invariant 1 in spec 8).
	pub async fn delete(&self, name: &str) -> Result<(), KeyringError> {
		let mut index = self.index.lock().await;
		let record = index.get(name).cloned().ok_or_else(|| KeyringError::NotFound(name.to_string()))?;
		self.store.delete_key(&record.bao_key_path).await?;
		index.remove(name).await?;
		Ok(())
	}

	/// Armored public-key export; never requires `exportable` — only the
	/// private-material export path ([`Self::export_key_armor`]) does.
	pub async fn export_pub_key_armor(&self, name: &str) -> Result<String, KeyringError> {
		let index = self.index.lock().await;
		let record = index.get(name).cloned().ok_or_else(|| KeyringError::NotFound(name.to_string()))?;
		Ok(self.store.export_public_armored(&record.bao_key_path).await?)
	}

	/// Armored private-key export, used only by [`crate::migration::export`].
	/// Refuses locally if the index doesn't mark the key `exportable`; the
	/// store enforces the same flag on its own side regardless.
	pub async fn export_key_armor(&self, name: &str) -> Result<String, KeyringError> {
		let index = self.index.lock().await;
		let record = index.get(name).cloned().ok_or_else(|| KeyringError::NotFound(name.to_string()))?;
		if !record.exportable {
			return Err(KeyringError::NotExportable(name.to_string()));
		}
		Ok(self.store.export_signing_key_armored(&record.bao_key_path).await?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use wiremock::matchers::{method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	async fn healthy_store() -> (MockServer, SecretStoreClient) {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/v1/sys/health"))
			.respond_with(ResponseTemplate::new(200))
			.mount(&server)
			.await;
		let client = SecretStoreClient::new(server.uri(), "token");
		(server, client)
	}

	#[tokio::test]
	async fn rename_same_name_is_conflict() {
		let (server, store) = healthy_store().await;
		Mock::given(method("POST"))
			.and(path("/v1/transit/keys/secp256k1/keys/alpha"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"pub_key_hex": "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
				"address": null,
			})))
			.mount(&server)
			.await;
		let dir = tempfile::tempdir().unwrap();
		let keyring = Keyring::new(store, KeyringConfig { index_path: dir.path().join("index.json") })
			.await
			.unwrap();
		keyring.new_account_with_options("alpha", false, None).await.unwrap();
		let err = keyring.rename("alpha", "alpha").await.unwrap_err();
		assert!(matches!(err, KeyringError::Conflict(_)));
	}

	#[tokio::test]
	async fn add_then_show_round_trips() {
		let (server, store) = healthy_store().await;
		Mock::given(method("POST"))
			.and(path("/v1/transit/keys/secp256k1/keys/alpha"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"pub_key_hex": "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
				"address": null,
			})))
			.mount(&server)
			.await;
		let dir = tempfile::tempdir().unwrap();
		let keyring = Keyring::new(store, KeyringConfig { index_path: dir.path().join("index.json") })
			.await
			.unwrap();
		let created = keyring.new_account_with_options("alpha", false, None).await.unwrap();
		let shown = keyring.get_metadata("alpha").await.unwrap();
		assert_eq!(created, shown);
	}

	#[tokio::test]
	async fn find_by_address_is_scoped_to_the_owning_org() {
		let (server, store) = healthy_store().await;
		Mock::given(method("POST"))
			.and(path("/v1/transit/keys/secp256k1/keys/alpha"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"pub_key_hex": "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
				"address": null,
			})))
			.mount(&server)
			.await;
		let dir = tempfile::tempdir().unwrap();
		let keyring = Keyring::new(store, KeyringConfig { index_path: dir.path().join("index.json") })
			.await
			.unwrap();
		let org_a = Uuid::new_v4();
		let org_b = Uuid::new_v4();
		let created = keyring.new_account_with_options("alpha", false, Some(org_a)).await.unwrap();

		let found = keyring.find_by_address(&created.address, org_a).await.unwrap();
		assert_eq!(found.name, "alpha");

		let err = keyring.find_by_address(&created.address, org_b).await.unwrap_err();
		assert!(matches!(err, KeyringError::NotFound(_)));
	}
}
