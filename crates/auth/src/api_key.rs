//! API key minting and verification. The raw secret is shown to
//! the caller exactly once, at creation time; only its Argon2 hash and a
//! short, non-secret prefix are persisted.

use crate::credentials::API_KEY_PREFIX;
use crate::error::AuthError;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::Rng;

/// A freshly minted key: `raw_secret` must be returned to the caller once and
/// never persisted; `key_prefix`/`key_hash` are what the repository stores.
pub struct MintedApiKey {
	pub raw_secret: String,
	pub key_prefix: String,
	pub key_hash: String,
}

/// Generates a new `sk_live_`-prefixed secret and its Argon2id hash.
/// `key_prefix` is the first 12 characters of the secret, stored unhashed so
/// lookups can narrow to a candidate before paying for a hash comparison.
pub fn mint() -> MintedApiKey {
	let mut rng = rand::thread_rng();
	let body: String = (0..32).map(|_| rng.sample(rand::distributions::Alphanumeric) as char).collect();
	let raw_secret = format!("{API_KEY_PREFIX}{body}");
	let key_prefix = raw_secret.chars().take(12).collect();
	let key_hash = hash(&raw_secret);
	MintedApiKey { raw_secret, key_prefix, key_hash }
}

pub fn hash(raw_secret: &str) -> String {
	let salt = SaltString::generate(&mut OsRng);
	Argon2::default()
		.hash_password(raw_secret.as_bytes(), &salt)
		.expect("argon2 hashing with a freshly generated salt never fails")
		.to_string()
}

/// Constant-time verification via argon2's own comparison; never short-circuit
/// on a manual byte compare of the hash strings.
pub fn verify(raw_secret: &str, key_hash: &str) -> Result<(), AuthError> {
	let parsed = PasswordHash::new(key_hash).map_err(|_| AuthError::InvalidCredential)?;
	Argon2::default().verify_password(raw_secret.as_bytes(), &parsed).map_err(|_| AuthError::InvalidCredential)
}
