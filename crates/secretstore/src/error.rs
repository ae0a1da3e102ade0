#[derive(Debug, thiserror::Error)]
pub enum SecretStoreError {
	#[error("secret store unreachable: {0}")]
	Unreachable(String),
	#[error("secret store is sealed")]
	Sealed,
	#[error("secret store is uninitialized")]
	Uninitialized,
	#[error("key not found at `{0}`")]
	NotFound(String),
	#[error("key already exists at `{0}`")]
	Conflict(String),
	#[error("key at `{0}` is not exportable")]
	NotExportable(String),
	#[error("secret store request failed: {0}")]
	Http(String),
}

impl From<reqwest::Error> for SecretStoreError {
	fn from(err: reqwest::Error) -> Self {
		SecretStoreError::Unreachable(err.to_string())
	}
}
