//! On-disk keyring index: `{"version":1,"keys":{name -> KeyRecord}}`,
//! written with a write-temp-then-rename pattern so a crash mid-write leaves
//! the previous contents intact.

use crate::error::KeyringError;
use sigil_primitives::KeyRecord;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IndexFile {
	pub version: u32,
	/// `BTreeMap` rather than `HashMap` so the on-disk form is stable to
	/// diff; list order is not guaranteed externally, but the file's byte
	/// layout stays deterministic.
	pub keys: BTreeMap<String, KeyRecord>,
}

impl Default for IndexFile {
	fn default() -> Self {
		Self { version: 1, keys: BTreeMap::new() }
	}
}

pub struct Index {
	path: PathBuf,
	file: IndexFile,
}

impl Index {
	/// Opens the index at `path`, creating an empty one if it doesn't exist.
	pub async fn open(path: impl AsRef<Path>) -> Result<Self, KeyringError> {
		let path = path.as_ref().to_path_buf();
		let file = match tokio::fs::read(&path).await {
			Ok(bytes) => serde_json::from_slice(&bytes)?,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => IndexFile::default(),
			Err(err) => return Err(err.into()),
		};
		let mut index = Self { path, file };
		if !index.path.exists() {
			index.persist().await?;
		}
		Ok(index)
	}

	pub fn get(&self, name: &str) -> Option<&KeyRecord> {
		self.file.keys.get(name)
	}

	pub fn list(&self) -> Vec<&KeyRecord> {
		self.file.keys.values().collect()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.file.keys.contains_key(name)
	}

	pub async fn insert(&mut self, record: KeyRecord) -> Result<(), KeyringError> {
		self.file.keys.insert(record.name.clone(), record);
		self.persist().await
	}

	pub async fn remove(&mut self, name: &str) -> Result<Option<KeyRecord>, KeyringError> {
		let removed = self.file.keys.remove(name);
		if removed.is_some() {
			self.persist().await?;
		}
		Ok(removed)
	}

	pub async fn rename(&mut self, old: &str, new: &str) -> Result<(), KeyringError> {
		let mut record = self.file.keys.remove(old).ok_or_else(|| KeyringError::NotFound(old.to_string()))?;
		record.name = new.to_string();
		self.file.keys.insert(new.to_string(), record);
		self.persist().await
	}

	/// Write-temp-then-rename: the old contents stay intact until the final
	/// `rename` succeeds, so a crash mid-write can never leave a partially
	/// written index behind.
	async fn persist(&self) -> Result<(), KeyringError> {
		let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
		tokio::fs::create_dir_all(dir).await?;
		let tmp_path = dir.join(format!(".{}.tmp", uuid::Uuid::new_v4()));
		let bytes = serde_json::to_vec_pretty(&self.file)?;
		tokio::fs::write(&tmp_path, &bytes).await?;
		tokio::fs::rename(&tmp_path, &self.path).await?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sigil_primitives::{Algorithm, KeySource};

	fn sample_record(name: &str) -> KeyRecord {
		KeyRecord {
			uid: uuid::Uuid::new_v4().to_string(),
			name: name.to_string(),
			pub_key: "base64".to_string(),
			pub_key_type: Algorithm::Secp256k1,
			address: "0xabc".to_string(),
			bao_key_path: KeyRecord::store_path(name),
			algorithm: Algorithm::Secp256k1,
			exportable: false,
			created_at: chrono::Utc::now(),
			source: KeySource::Generated,
			org_id: None,
		}
	}

	#[tokio::test]
	async fn insert_then_reopen_round_trips() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("index.json");
		{
			let mut idx = Index::open(&path).await.unwrap();
			idx.insert(sample_record("alpha")).await.unwrap();
		}
		let reopened = Index::open(&path).await.unwrap();
		assert_eq!(reopened.get("alpha").unwrap().name, "alpha");
	}

	#[tokio::test]
	async fn rename_moves_the_entry() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("index.json");
		let mut idx = Index::open(&path).await.unwrap();
		idx.insert(sample_record("alpha")).await.unwrap();
		idx.rename("alpha", "beta").await.unwrap();
		assert!(idx.get("alpha").is_none());
		assert_eq!(idx.get("beta").unwrap().name, "beta");
	}

	#[tokio::test]
	async fn rename_missing_source_fails() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("index.json");
		let mut idx = Index::open(&path).await.unwrap();
		let err = idx.rename("ghost", "beta").await.unwrap_err();
		assert!(matches!(err, KeyringError::NotFound(_)));
	}
}
