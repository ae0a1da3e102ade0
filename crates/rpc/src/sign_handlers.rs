//! `eth_accounts`, `eth_sign`, `personal_sign`, `eth_signTransaction`.

use crate::dispatcher::{Handler, RpcDispatcher};
use crate::error::keyring_error_to_rpc;
use crate::eth_tx::{build_unsigned, classify, EvmTxParams};
use crate::types::JsonRpcError;
use base64::Engine;
use serde_json::Value;
use sigil_keyring::Keyring;
use sigil_primitives::{keccak256, RpcErrorCode};
use sigil_telemetry::{AuditEvent, AuditSink, UsageSink};
use std::sync::Arc;

const SIGN_SCOPE: &str = "sign:evm";
const USAGE_METRIC_SIGNATURES: &str = "signatures";

fn invalid_params(msg: impl Into<String>) -> JsonRpcError {
	JsonRpcError::new(RpcErrorCode::InvalidParams, msg.into())
}

fn unauthorized(msg: impl Into<String>) -> JsonRpcError {
	JsonRpcError::new(RpcErrorCode::Unauthorized, msg.into())
}

/// `Keccak256("\x19Ethereum Signed Message:\n" + len(data) + data)`, shared
/// by `eth_sign` and `personal_sign` — the two methods differ only in
/// parameter order, never in the digest they sign.
fn eip191_digest(message: &[u8]) -> [u8; 32] {
	let mut prefixed = format!("\x19Ethereum Signed Message:\n{}", message.len()).into_bytes();
	prefixed.extend_from_slice(message);
	keccak256(&prefixed)
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
	serde_json::from_value(params.unwrap_or(Value::Null)).map_err(|err| invalid_params(err.to_string()))
}

fn decode_message_hex(value: &str) -> Result<Vec<u8>, JsonRpcError> {
	hex::decode(value.trim_start_matches("0x")).map_err(|_| invalid_params(format!("`{value}` is not valid hex")))
}

pub fn register_all(dispatcher: &RpcDispatcher, keyring: Arc<Keyring>, audit: Arc<AuditSink>, usage: Arc<UsageSink>) {
	dispatcher.register("eth_accounts", eth_accounts(keyring.clone()));
	dispatcher.register("eth_sign", eth_sign(keyring.clone(), audit.clone(), usage.clone()));
	dispatcher.register("personal_sign", personal_sign(keyring.clone(), audit.clone(), usage.clone()));
	dispatcher.register("eth_signTransaction", eth_sign_transaction(keyring, audit, usage));
}

fn record_signing_event(audit: &AuditSink, usage: &UsageSink, ctx: &sigil_auth::AuthContext, method: &str, address: &str) {
	usage.record(ctx.org_id, USAGE_METRIC_SIGNATURES);
	let (actor_id, actor_type) = match &ctx.principal {
		sigil_auth::Principal::User { user_id } => (Some(*user_id), sigil_repository::ActorType::User),
		sigil_auth::Principal::ApiKey { api_key_id } => (Some(*api_key_id), sigil_repository::ActorType::ApiKey),
	};
	audit.record(AuditEvent {
		org_id: ctx.org_id,
		event: format!("rpc.{method}"),
		actor_id,
		actor_type,
		resource_type: Some("key".to_string()),
		resource_id: Some(address.to_string()),
		ip: None,
		user_agent: None,
		metadata: serde_json::json!({}),
	});
}

fn eth_accounts(keyring: Arc<Keyring>) -> Handler {
	Arc::new(move |_params, ctx| {
		let keyring = keyring.clone();
		Box::pin(async move {
			ctx.require_scope(SIGN_SCOPE).map_err(|err| unauthorized(err.to_string()))?;
			let addresses: Vec<Value> = keyring
				.list()
				.await
				.into_iter()
				.filter(|record| record.org_id == Some(ctx.org_id))
				.map(|record| Value::from(record.address))
				.collect();
			Ok(Value::Array(addresses))
		})
	})
}

struct EthSignParams(String, String);

fn eth_sign(keyring: Arc<Keyring>, audit: Arc<AuditSink>, usage: Arc<UsageSink>) -> Handler {
	Arc::new(move |params, ctx| {
		let keyring = keyring.clone();
		let audit = audit.clone();
		let usage = usage.clone();
		Box::pin(async move {
			ctx.require_scope(SIGN_SCOPE).map_err(|err| unauthorized(err.to_string()))?;
			let EthSignParams(address, data_hex) = parse_array_params(params)?;
			let message = decode_message_hex(&data_hex)?;
			let digest = eip191_digest(&message);
			let result = sign_digest(&keyring, &address, ctx.org_id, digest).await?;
			record_signing_event(&audit, &usage, &ctx, "eth_sign", &address);
			Ok(result)
		})
	})
}

fn personal_sign(keyring: Arc<Keyring>, audit: Arc<AuditSink>, usage: Arc<UsageSink>) -> Handler {
	Arc::new(move |params, ctx| {
		let keyring = keyring.clone();
		let audit = audit.clone();
		let usage = usage.clone();
		Box::pin(async move {
			ctx.require_scope(SIGN_SCOPE).map_err(|err| unauthorized(err.to_string()))?;
			let EthSignParams(data_hex, address) = parse_array_params(params)?;
			let message = decode_message_hex(&data_hex)?;
			let digest = eip191_digest(&message);
			let result = sign_digest(&keyring, &address, ctx.org_id, digest).await?;
			record_signing_event(&audit, &usage, &ctx, "personal_sign", &address);
			Ok(result)
		})
	})
}

/// Both `eth_sign` and `personal_sign` take a two-element positional array;
/// they only disagree on which slot holds the address.
fn parse_array_params(params: Option<Value>) -> Result<EthSignParams, JsonRpcError> {
	let value = params.unwrap_or(Value::Null);
	let array = value.as_array().ok_or_else(|| invalid_params("expected a two-element array"))?;
	if array.len() != 2 {
		return Err(invalid_params("expected exactly two parameters"));
	}
	let first = array[0].as_str().ok_or_else(|| invalid_params("expected a string parameter"))?.to_string();
	let second = array[1].as_str().ok_or_else(|| invalid_params("expected a string parameter"))?.to_string();
	Ok(EthSignParams(first, second))
}

async fn sign_digest(keyring: &Keyring, address: &str, org_id: uuid::Uuid, digest: [u8; 32]) -> Result<Value, JsonRpcError> {
	let record = keyring.find_by_address(address, org_id).await.map_err(keyring_error_to_rpc)?;
	let hash_b64 = base64::engine::general_purpose::STANDARD.encode(digest);
	let signature = keyring
		.store()
		.sign_evm(&record.bao_key_path, &hash_b64, 0)
		.await
		.map_err(|err| keyring_error_to_rpc(sigil_keyring::KeyringError::Store(err)))?;
	let rsv = signature.to_rsv_bytes().map_err(|_| JsonRpcError::new(RpcErrorCode::SigningError, "secret store returned a malformed signature".to_string()))?;
	Ok(Value::String(format!("0x{}", hex::encode(rsv))))
}

fn eth_sign_transaction(keyring: Arc<Keyring>, audit: Arc<AuditSink>, usage: Arc<UsageSink>) -> Handler {
	Arc::new(move |params, ctx| {
		let keyring = keyring.clone();
		let audit = audit.clone();
		let usage = usage.clone();
		Box::pin(async move {
			ctx.require_scope(SIGN_SCOPE).map_err(|err| unauthorized(err.to_string()))?;
			let tx_params: EvmTxParams = parse_params(params)?;
			let kind = classify(&tx_params)?;
			let unsigned = build_unsigned(&tx_params, &kind)?;
			let digest = unsigned.digest();

			let record = keyring.find_by_address(&tx_params.from, ctx.org_id).await.map_err(keyring_error_to_rpc)?;
			let hash_b64 = base64::engine::general_purpose::STANDARD.encode(digest);
			let signature = keyring
				.store()
				.sign_evm(&record.bao_key_path, &hash_b64, tx_params.chain_id)
				.await
				.map_err(|err| keyring_error_to_rpc(sigil_keyring::KeyringError::Store(err)))?;
			let rsv = signature.to_rsv_bytes().map_err(|_| {
				JsonRpcError::new(RpcErrorCode::SigningError, "secret store returned a malformed signature".to_string())
			})?;
			let mut r = [0u8; 32];
			let mut s = [0u8; 32];
			r.copy_from_slice(&rsv[0..32]);
			s.copy_from_slice(&rsv[32..64]);

			let raw = unsigned.into_signed_raw(&r, &s, signature.v);
			let tx_hash = keccak256(&raw);
			record_signing_event(&audit, &usage, &ctx, "eth_signTransaction", &tx_params.from);
			Ok(serde_json::json!({
				"raw": format!("0x{}", hex::encode(&raw)),
				"hash": format!("0x{}", hex::encode(tx_hash)),
			}))
		})
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use sigil_auth::AuthContext;

	#[test]
	fn array_params_reject_wrong_arity() {
		let err = parse_array_params(Some(Value::Array(vec![Value::from("only-one")]))).unwrap_err();
		assert_eq!(err.code, RpcErrorCode::InvalidParams.code());
	}

	/// `eth_sign` and `personal_sign` must hash an identical message the
	/// same way regardless of which positional slot carries the address.
	#[test]
	fn eth_sign_and_personal_sign_hash_the_same_message_identically() {
		let message = b"hello sigil";
		assert_eq!(eip191_digest(message), eip191_digest(message));
		assert_ne!(eip191_digest(message), keccak256(message));
	}

	#[test]
	fn missing_scope_maps_to_unauthorized() {
		let scopeless = AuthContext {
			org_id: uuid::Uuid::new_v4(),
			principal: sigil_auth::Principal::ApiKey { api_key_id: uuid::Uuid::new_v4() },
			role: sigil_primitives::Role::Viewer,
			scopes: vec!["other:scope".to_string()],
		};
		let err = scopeless.require_scope(SIGN_SCOPE).map_err(|err| unauthorized(err.to_string())).unwrap_err();
		assert_eq!(err.code, RpcErrorCode::Unauthorized.code());
	}
}
