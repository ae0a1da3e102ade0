use sigil_primitives::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
	#[error("no credential present on the request")]
	MissingCredential,
	#[error("credential is malformed")]
	MalformedCredential,
	#[error("credential does not match any active key or session")]
	InvalidCredential,
	#[error("credential has expired or been revoked")]
	Expired,
	#[error("caller lacks the `{0}` scope")]
	MissingScope(String),
	#[error("caller's role does not satisfy the required role for this operation")]
	InsufficientRole,
}

impl From<AuthError> for ErrorKind {
	fn from(err: AuthError) -> Self {
		match err {
			AuthError::MissingCredential | AuthError::InvalidCredential | AuthError::Expired => {
				ErrorKind::Unauthorized
			}
			AuthError::MalformedCredential => ErrorKind::BadRequest(err.to_string()),
			AuthError::MissingScope(_) | AuthError::InsufficientRole => ErrorKind::Forbidden,
		}
	}
}
