use sigil_primitives::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
	#[error("not found: {0}")]
	NotFound(String),
	#[error("conflict: {0}")]
	Conflict(String),
}

impl From<RepositoryError> for ErrorKind {
	fn from(err: RepositoryError) -> Self {
		match err {
			RepositoryError::NotFound(what) => ErrorKind::NotFound(what),
			RepositoryError::Conflict(what) => ErrorKind::Conflict(what),
		}
	}
}
