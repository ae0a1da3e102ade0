//! Process configuration, resolved entirely from the environment: there is
//! no config file, matching the CLI's own flag/env precedence in spirit but
//! with env as the only source since this binary runs unattended.

use std::path::PathBuf;
use std::time::Duration;

pub struct Config {
	pub listen_addr: String,
	pub bao_addr: String,
	pub bao_token: String,
	pub store_path: PathBuf,
	pub rpc_rate_limit_per_second: usize,
	pub staleness_timeout: Duration,
	pub staleness_interval: Duration,
}

impl Config {
	pub fn from_env() -> anyhow::Result<Self> {
		let bao_addr = std::env::var("BAO_ADDR")
			.map_err(|_| anyhow::anyhow!("BAO_ADDR is required (the secret store's base URL)"))?;
		let bao_token = std::env::var("BAO_TOKEN")
			.map_err(|_| anyhow::anyhow!("BAO_TOKEN is required (the secret store's auth token)"))?;
		let store_path = std::env::var("BAO_STORE_PATH").map(PathBuf::from).unwrap_or_else(|_| default_store_path());
		let listen_addr = std::env::var("SIGIL_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
		let rpc_rate_limit_per_second = env_parse("SIGIL_RPC_RATE_LIMIT_PER_SECOND", 50);
		let staleness_timeout = Duration::from_secs(env_parse("SIGIL_STALENESS_TIMEOUT_SECS", 3600));
		let staleness_interval = Duration::from_secs(env_parse("SIGIL_STALENESS_SWEEP_INTERVAL_SECS", 60));
		Ok(Self { listen_addr, bao_addr, bao_token, store_path, rpc_rate_limit_per_second, staleness_timeout, staleness_interval })
	}
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
	std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn default_store_path() -> PathBuf {
	std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".")).join(".sigil").join("keyring.json")
}
