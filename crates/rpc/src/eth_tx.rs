//! Minimal Ethereum transaction RLP encoding, just enough to build the digest
//! `eth_signTransaction` hands to the secret store and the raw signed
//! transaction it hands back. The control plane never broadcasts
//! transactions (Non-goal), so this stops at producing signed bytes.

use crate::types::JsonRpcError;
use serde::Deserialize;
use sigil_primitives::{keccak256, RpcErrorCode};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmTxParams {
	pub from: String,
	#[serde(default)]
	pub to: Option<String>,
	#[serde(default)]
	pub value: Option<String>,
	#[serde(default)]
	pub gas: Option<String>,
	#[serde(default)]
	pub gas_price: Option<String>,
	#[serde(default)]
	pub max_fee_per_gas: Option<String>,
	#[serde(default)]
	pub max_priority_fee_per_gas: Option<String>,
	#[serde(default)]
	pub nonce: Option<String>,
	#[serde(default)]
	pub data: Option<String>,
	pub chain_id: u64,
}

pub enum Classified {
	Legacy,
	Eip1559,
}

/// Both fee fields present is ambiguous, not merged — reject outright rather
/// than silently preferring one.
pub fn classify(params: &EvmTxParams) -> Result<Classified, JsonRpcError> {
	let has_legacy_fee = params.gas_price.is_some();
	let has_1559_fee = params.max_fee_per_gas.is_some() || params.max_priority_fee_per_gas.is_some();
	match (has_legacy_fee, has_1559_fee) {
		(true, true) => Err(JsonRpcError::new(
			RpcErrorCode::InvalidParams,
			"transaction specifies both `gasPrice` and `maxFeePerGas`/`maxPriorityFeePerGas`; use exactly one fee scheme".to_string(),
		)),
		(false, false) => Err(JsonRpcError::new(
			RpcErrorCode::InvalidParams,
			"transaction specifies no fee scheme: set `gasPrice` for a legacy tx or `maxFeePerGas`+`maxPriorityFeePerGas` for EIP-1559".to_string(),
		)),
		(true, false) => Ok(Classified::Legacy),
		(false, true) => Ok(Classified::Eip1559),
	}
}

fn hex_to_bytes(value: &str) -> Result<Vec<u8>, JsonRpcError> {
	let trimmed = value.trim_start_matches("0x");
	let padded = if trimmed.len() % 2 == 1 { format!("0{trimmed}") } else { trimmed.to_string() };
	hex::decode(padded).map_err(|_| JsonRpcError::new(RpcErrorCode::InvalidParams, format!("`{value}` is not valid hex")))
}

fn hex_to_u128(value: &str) -> Result<u128, JsonRpcError> {
	let bytes = hex_to_bytes(value)?;
	if bytes.len() > 16 {
		return Err(JsonRpcError::new(RpcErrorCode::InvalidParams, format!("`{value}` overflows a 128-bit integer")));
	}
	let mut buf = [0u8; 16];
	buf[16 - bytes.len()..].copy_from_slice(&bytes);
	Ok(u128::from_be_bytes(buf))
}

fn address_bytes(value: &str) -> Result<Vec<u8>, JsonRpcError> {
	let bytes = hex_to_bytes(value)?;
	if bytes.len() != 20 {
		return Err(JsonRpcError::new(RpcErrorCode::InvalidParams, format!("`{value}` is not a 20-byte address")));
	}
	Ok(bytes)
}

fn field_u128(value: &Option<String>) -> Result<u128, JsonRpcError> {
	match value {
		Some(v) => hex_to_u128(v),
		None => Ok(0),
	}
}

fn field_bytes(value: &Option<String>) -> Result<Vec<u8>, JsonRpcError> {
	match value {
		Some(v) => hex_to_bytes(v),
		None => Ok(Vec::new()),
	}
}

// -- RLP --

fn rlp_encode_bytes(bytes: &[u8]) -> Vec<u8> {
	if bytes.len() == 1 && bytes[0] < 0x80 {
		return vec![bytes[0]];
	}
	let mut out = rlp_length_prefix(0x80, bytes.len());
	out.extend_from_slice(bytes);
	out
}

fn rlp_encode_uint(value: u128) -> Vec<u8> {
	if value == 0 {
		return rlp_encode_bytes(&[]);
	}
	let be = value.to_be_bytes();
	let first_nonzero = be.iter().position(|&b| b != 0).unwrap();
	rlp_encode_bytes(&be[first_nonzero..])
}

fn rlp_encode_list(items: &[Vec<u8>]) -> Vec<u8> {
	let payload: Vec<u8> = items.concat();
	let mut out = rlp_length_prefix(0xc0, payload.len());
	out.extend_from_slice(&payload);
	out
}

fn rlp_length_prefix(base: u8, len: usize) -> Vec<u8> {
	if len < 56 {
		vec![base + len as u8]
	} else {
		let len_bytes = {
			let be = (len as u64).to_be_bytes();
			let first_nonzero = be.iter().position(|&b| b != 0).unwrap_or(7);
			be[first_nonzero..].to_vec()
		};
		let mut out = vec![base + 55 + len_bytes.len() as u8];
		out.extend_from_slice(&len_bytes);
		out
	}
}

/// The bytes whose keccak256 is the digest the secret store signs, and (once
/// `r`/`s`/`v` come back) the prefix the signed raw transaction extends.
pub struct UnsignedTx {
	pub rlp_fields: Vec<Vec<u8>>,
	/// `0x02` for EIP-1559, absent for legacy.
	pub type_byte: Option<u8>,
}

pub fn build_unsigned(params: &EvmTxParams, kind: &Classified) -> Result<UnsignedTx, JsonRpcError> {
	let nonce = field_u128(&params.nonce)?;
	let gas = field_u128(&params.gas)?;
	let value = field_u128(&params.value)?;
	let data = field_bytes(&params.data)?;
	let to: Vec<u8> = match &params.to {
		Some(addr) => address_bytes(addr)?,
		None => Vec::new(),
	};

	match kind {
		Classified::Legacy => {
			let gas_price = field_u128(&params.gas_price)?;
			Ok(UnsignedTx {
				type_byte: None,
				rlp_fields: vec![
					rlp_encode_uint(nonce),
					rlp_encode_uint(gas_price),
					rlp_encode_uint(gas),
					rlp_encode_bytes(&to),
					rlp_encode_uint(value),
					rlp_encode_bytes(&data),
					rlp_encode_uint(params.chain_id as u128),
					rlp_encode_uint(0),
					rlp_encode_uint(0),
				],
			})
		}
		Classified::Eip1559 => {
			let max_priority = field_u128(&params.max_priority_fee_per_gas)?;
			let max_fee = field_u128(&params.max_fee_per_gas)?;
			Ok(UnsignedTx {
				type_byte: Some(0x02),
				rlp_fields: vec![
					rlp_encode_uint(params.chain_id as u128),
					rlp_encode_uint(nonce),
					rlp_encode_uint(max_priority),
					rlp_encode_uint(max_fee),
					rlp_encode_uint(gas),
					rlp_encode_bytes(&to),
					rlp_encode_uint(value),
					rlp_encode_bytes(&data),
					rlp_encode_list(&[]), // empty access list
				],
			})
		}
	}
}

impl UnsignedTx {
	pub fn digest(&self) -> [u8; 32] {
		let encoded = rlp_encode_list(&self.rlp_fields);
		match self.type_byte {
			Some(t) => {
				let mut prefixed = vec![t];
				prefixed.extend_from_slice(&encoded);
				keccak256(&prefixed)
			}
			None => keccak256(&encoded),
		}
	}

	/// Appends `v, r, s` (legacy) or `yParity, r, s` (1559) and RLP-encodes
	/// the full signed transaction.
	pub fn into_signed_raw(mut self, r: &[u8; 32], s: &[u8; 32], v: u64) -> Vec<u8> {
		match self.type_byte {
			None => {
				self.rlp_fields.pop();
				self.rlp_fields.pop();
				self.rlp_fields.pop();
				self.rlp_fields.push(rlp_encode_uint(v as u128));
				self.rlp_fields.push(rlp_encode_bytes(r));
				self.rlp_fields.push(rlp_encode_bytes(s));
				rlp_encode_list(&self.rlp_fields)
			}
			Some(t) => {
				self.rlp_fields.push(rlp_encode_uint(v as u128));
				self.rlp_fields.push(rlp_encode_bytes(r));
				self.rlp_fields.push(rlp_encode_bytes(s));
				let encoded = rlp_encode_list(&self.rlp_fields);
				let mut out = vec![t];
				out.extend_from_slice(&encoded);
				out
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_legacy() -> EvmTxParams {
		EvmTxParams {
			from: "0x0000000000000000000000000000000000000001".to_string(),
			to: Some("0x0000000000000000000000000000000000000002".to_string()),
			value: Some("0x0de0b6b3a7640000".to_string()),
			gas: Some("0x5208".to_string()),
			gas_price: Some("0x3b9aca00".to_string()),
			max_fee_per_gas: None,
			max_priority_fee_per_gas: None,
			nonce: Some("0x1".to_string()),
			data: None,
			chain_id: 7668,
		}
	}

	#[test]
	fn both_fee_schemes_present_is_rejected() {
		let mut params = sample_legacy();
		params.max_fee_per_gas = Some("0x3b9aca00".to_string());
		let err = classify(&params).unwrap_err();
		assert_eq!(err.code, RpcErrorCode::InvalidParams.code());
	}

	#[test]
	fn legacy_digest_is_deterministic() {
		let params = sample_legacy();
		let kind = classify(&params).unwrap();
		let unsigned = build_unsigned(&params, &kind).unwrap();
		let digest_a = unsigned.digest();
		let unsigned_again = build_unsigned(&params, &classify(&params).unwrap()).unwrap();
		assert_eq!(digest_a, unsigned_again.digest());
	}

	#[test]
	fn signed_raw_prefixes_eip1559_with_type_byte() {
		let mut params = sample_legacy();
		params.gas_price = None;
		params.max_fee_per_gas = Some("0x3b9aca00".to_string());
		params.max_priority_fee_per_gas = Some("0x3b9aca00".to_string());
		let kind = classify(&params).unwrap();
		let unsigned = build_unsigned(&params, &kind).unwrap();
		let raw = unsigned.into_signed_raw(&[1u8; 32], &[2u8; 32], 0);
		assert_eq!(raw[0], 0x02);
	}
}
