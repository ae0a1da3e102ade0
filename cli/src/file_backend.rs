//! A plain JSON file keystore: the only `--backend` `migrate import`/`export`
//! currently implement. Records hold a raw private scalar so the backend can
//! answer `sign` itself without a network round trip; this is deliberately
//! the least secure option the CLI offers, which is the point of forcing an
//! explicit confirmation phrase on the export path.

use async_trait::async_trait;
use sigil_keyring::migration::{ForeignKeySource, ForeignKeyTarget};
use sigil_keyring::KeyringError;
use sigil_primitives::keccak256;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct FileKeystoreData {
	keys: BTreeMap<String, FileKeyEntry>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct FileKeyEntry {
	/// 33-byte compressed public key, base64.
	pub_key_b64: String,
	/// Either a raw 32-byte private scalar (hex) for keys this backend can
	/// sign with, or an opaque armored blob handed back by `import`.
	material: String,
}

pub struct FileKeystore {
	path: PathBuf,
	data: Mutex<FileKeystoreData>,
}

fn io_err(err: std::io::Error) -> KeyringError {
	KeyringError::Io(err)
}

impl FileKeystore {
	pub fn open(path: PathBuf) -> Result<Self, KeyringError> {
		let data = match std::fs::read(&path) {
			Ok(bytes) => serde_json::from_slice(&bytes)?,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => FileKeystoreData::default(),
			Err(err) => return Err(io_err(err)),
		};
		Ok(Self { path, data: Mutex::new(data) })
	}

	fn persist(&self, data: &FileKeystoreData) -> Result<(), KeyringError> {
		if let Some(dir) = self.path.parent() {
			std::fs::create_dir_all(dir).map_err(io_err)?;
		}
		let bytes = serde_json::to_vec_pretty(data)?;
		let tmp_path = self.path.with_extension("tmp");
		std::fs::write(&tmp_path, &bytes).map_err(io_err)?;
		std::fs::rename(&tmp_path, &self.path).map_err(io_err)?;
		Ok(())
	}
}

#[async_trait]
impl ForeignKeySource for FileKeystore {
	async fn list_keys(&self) -> Result<Vec<String>, KeyringError> {
		Ok(self.data.lock().unwrap().keys.keys().cloned().collect())
	}

	async fn pub_key(&self, name: &str) -> Result<[u8; 33], KeyringError> {
		let data = self.data.lock().unwrap();
		let entry = data.keys.get(name).ok_or_else(|| KeyringError::NotFound(name.to_string()))?;
		let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &entry.pub_key_b64)
			.map_err(|_| KeyringError::NotFound(name.to_string()))?;
		bytes.try_into().map_err(|_| KeyringError::NotFound(name.to_string()))
	}

	async fn sign(&self, name: &str, payload: &[u8]) -> Result<Vec<u8>, KeyringError> {
		let material = {
			let data = self.data.lock().unwrap();
			let entry = data.keys.get(name).ok_or_else(|| KeyringError::NotFound(name.to_string()))?;
			entry.material.clone()
		};
		let scalar = hex::decode(material.trim_start_matches("0x"))
			.map_err(|_| KeyringError::NotExportable(name.to_string()))?;
		let secret_bytes: [u8; 32] = scalar.try_into().map_err(|_| KeyringError::NotExportable(name.to_string()))?;
		let secret_key =
			libsecp256k1::SecretKey::parse(&secret_bytes).map_err(|_| KeyringError::NotExportable(name.to_string()))?;
		let digest = keccak256(payload);
		let message = libsecp256k1::Message::parse(&digest);
		let (signature, _recovery_id) = libsecp256k1::sign(&message, &secret_key);
		Ok(signature.serialize().to_vec())
	}

	async fn delete(&self, name: &str) -> Result<(), KeyringError> {
		let mut data = self.data.lock().unwrap();
		data.keys.remove(name);
		let snapshot = data.clone();
		drop(data);
		self.persist(&snapshot)
	}
}

#[async_trait]
impl ForeignKeyTarget for FileKeystore {
	async fn import_private_material(&self, name: &str, armored: &str) -> Result<(), KeyringError> {
		let mut data = self.data.lock().unwrap();
		data.keys.insert(name.to_string(), FileKeyEntry { pub_key_b64: String::new(), material: armored.to_string() });
		let snapshot = data.clone();
		drop(data);
		self.persist(&snapshot)
	}
}
