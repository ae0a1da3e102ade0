use crate::types::JsonRpcError;
use sigil_primitives::ErrorKind;

/// Bridges the shared [`ErrorKind`] taxonomy into a JSON-RPC error object.
pub fn error_kind_to_rpc(kind: ErrorKind) -> JsonRpcError {
	JsonRpcError::new(kind.rpc_code(), kind.to_string())
}

pub fn keyring_error_to_rpc(err: sigil_keyring::KeyringError) -> JsonRpcError {
	error_kind_to_rpc(err.into())
}
