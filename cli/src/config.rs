//! Resolves connection settings from flags with environment-variable
//! fallbacks, the same precedence the node's `cli_opt.rs` gives its feature
//! toggles (flag wins, then env, then a hard failure for what's required).

use std::path::PathBuf;

pub struct Config {
	pub bao_addr: String,
	pub bao_token: String,
	pub store_path: PathBuf,
	pub json: bool,
}

/// Names both the flag and the environment variable so an operator can fix
/// either one.
fn missing_credentials_message() -> String {
	"BAO_ADDR and BAO_TOKEN are required (set them as environment variables or pass --bao-addr/--bao-token)".to_string()
}

impl Config {
	pub fn resolve(bao_addr: Option<String>, bao_token: Option<String>, store_path: Option<PathBuf>, json: bool) -> anyhow::Result<Self> {
		let bao_addr = bao_addr.or_else(|| std::env::var("BAO_ADDR").ok());
		let bao_token = bao_token.or_else(|| std::env::var("BAO_TOKEN").ok());
		let (bao_addr, bao_token) = match (bao_addr, bao_token) {
			(Some(addr), Some(token)) => (addr, token),
			_ => anyhow::bail!(missing_credentials_message()),
		};
		let store_path = store_path
			.or_else(|| std::env::var("BAO_STORE_PATH").ok().map(PathBuf::from))
			.unwrap_or_else(default_store_path);
		Ok(Self { bao_addr, bao_token, store_path, json })
	}
}

fn default_store_path() -> PathBuf {
	dirs_next_home().join(".sigil").join("keyring.json")
}

fn dirs_next_home() -> PathBuf {
	std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_both_credentials_is_an_error() {
		let err = Config::resolve(None, None, None, false).unwrap_err();
		assert!(err.to_string().contains("BAO_ADDR"));
		assert!(err.to_string().contains("BAO_TOKEN"));
	}

	#[test]
	fn explicit_flags_override_environment() {
		let config = Config::resolve(Some("https://flag".to_string()), Some("flag-token".to_string()), None, true).unwrap();
		assert_eq!(config.bao_addr, "https://flag");
		assert_eq!(config.bao_token, "flag-token");
		assert!(config.json);
	}
}
