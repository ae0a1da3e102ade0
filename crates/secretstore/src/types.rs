use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct CreateKeyOptions {
	pub exportable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedKey {
	pub pub_key_hex: String,
	pub address: Option<String>,
}

/// `r || s || v` components of an EVM signature, as returned by the store's
/// signing endpoint. `v` follows the legacy (27/28) or EIP-155 convention
/// depending on the `chain_id` the caller passed to `sign_evm`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EvmSignature {
	pub r_hex: String,
	pub s_hex: String,
	pub v: u64,
}

impl EvmSignature {
	/// Assembles the 65-byte `r (32) || s (32) || v (1)` signature, left-pad
	/// zero on `r`/`s`, per spec 4.7.
	pub fn to_rsv_bytes(&self) -> Result<[u8; 65], hex::FromHexError> {
		let r = hex::decode(self.r_hex.trim_start_matches("0x"))?;
		let s = hex::decode(self.s_hex.trim_start_matches("0x"))?;
		let mut out = [0u8; 65];
		let r_start = 32 - r.len();
		out[r_start..32].copy_from_slice(&r);
		let s_start = 32 + (32 - s.len());
		out[s_start..64].copy_from_slice(&s);
		out[64] = self.v as u8;
		Ok(out)
	}
}

#[derive(Debug, Serialize)]
pub(crate) struct SignEvmRequest<'a> {
	pub hash_b64: &'a str,
	pub chain_id: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListKeysResponse {
	pub keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExportArmoredResponse {
	pub armor: String,
}
