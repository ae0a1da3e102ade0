use sigil_primitives::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum KeyringError {
	#[error("key `{0}` not found")]
	NotFound(String),
	#[error("key `{0}` already exists")]
	Conflict(String),
	#[error("secret store unreachable")]
	StoreUnreachable,
	#[error("secret store error: {0}")]
	Store(#[from] sigil_secretstore::SecretStoreError),
	#[error("index file error: {0}")]
	Io(#[from] std::io::Error),
	#[error("index file is corrupt: {0}")]
	Corrupt(#[from] serde_json::Error),
	#[error("key `{0}` is not exportable")]
	NotExportable(String),
	#[error("confirmation phrase did not match")]
	ConfirmationMismatch,
	#[error("address derivation failed: {0}")]
	Address(#[from] sigil_primitives::address::AddressError),
}

impl From<KeyringError> for ErrorKind {
	fn from(err: KeyringError) -> Self {
		match err {
			KeyringError::NotFound(what) => ErrorKind::NotFound(what),
			KeyringError::Conflict(what) => ErrorKind::Conflict(what),
			KeyringError::NotExportable(_) => ErrorKind::Forbidden,
			KeyringError::ConfirmationMismatch => ErrorKind::BadRequest(err.to_string()),
			KeyringError::StoreUnreachable => ErrorKind::Internal(err.to_string()),
			KeyringError::Store(_) | KeyringError::Io(_) | KeyringError::Corrupt(_) | KeyringError::Address(_) => {
				ErrorKind::Internal(err.to_string())
			}
		}
	}
}
