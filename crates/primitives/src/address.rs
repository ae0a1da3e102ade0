//! Keccak256 hashing and secp256k1 public-key -> Ethereum address derivation.
//!
//! Mirrors the digest-before-signing convention used by the bridge worker's
//! `data_to_digest`: callers always hash first, the signer only ever touches
//! a 32-byte digest.

use sha3::{Digest, Keccak256};

/// Keccak256 of arbitrary bytes.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
	let mut hasher = Keccak256::new();
	hasher.update(data);
	let mut out = [0u8; 32];
	out.copy_from_slice(&hasher.finalize());
	out
}

/// Derives the 20-byte hex Ethereum address from a 33-byte compressed
/// secp256k1 public key: `keccak256(uncompressed_pubkey[1..])[12..]`.
pub fn derive_eth_address(pub_key_compressed: &[u8; 33]) -> Result<String, AddressError> {
	let parsed = libsecp256k1::PublicKey::parse_compressed(pub_key_compressed)
		.map_err(|_| AddressError::InvalidPublicKey)?;
	let uncompressed = parsed.serialize(); // 65 bytes: 0x04 || X(32) || Y(32)
	let digest = keccak256(&uncompressed[1..]);
	let mut address = String::with_capacity(42);
	address.push_str("0x");
	address.push_str(&hex::encode(&digest[12..]));
	Ok(address)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
	#[error("public key bytes do not parse as a valid compressed secp256k1 point")]
	InvalidPublicKey,
}

/// Deterministic batch-inbox address: a fixed 18-byte prefix
/// followed by the chain id as 8 hex digits.
pub fn batch_inbox_address(chain_id: u64) -> String {
	format!("0xff00000000000000000000000000000000{:08x}", chain_id)
}

#[cfg(test)]
mod tests {
	use super::*;
	use hex_literal::hex;

	#[test]
	fn derives_known_address() {
		// Compressed secp256k1 generator point G, i.e. the public key for
		// private key `0x01`; a widely published test vector.
		let compressed =
			hex!("0279BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798");
		let address = derive_eth_address(&compressed).unwrap();
		assert_eq!(address, "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");
	}

	#[test]
	fn rejects_garbage_bytes() {
		let garbage = [0xffu8; 33];
		assert_eq!(derive_eth_address(&garbage), Err(AddressError::InvalidPublicKey));
	}

	#[test]
	fn batch_inbox_address_appends_chain_id_as_eight_hex_digits() {
		let expected = format!("0xff00000000000000000000000000000000{:08x}", 7668u64);
		assert_eq!(batch_inbox_address(7668), expected);
		assert!(batch_inbox_address(1).ends_with("00000001"));
	}
}
