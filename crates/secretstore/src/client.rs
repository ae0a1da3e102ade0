use crate::error::SecretStoreError;
use crate::types::{
	CreateKeyOptions, CreatedKey, EvmSignature, ExportArmoredResponse, ListKeysResponse,
	SignEvmRequest,
};
use reqwest::StatusCode;
use std::time::Duration;

/// Stateless wrapper over the remote secret store's HTTP API.
/// Carries a base URL, bearer token, and an optional namespace header;
/// cloning is cheap (the inner `reqwest::Client` is reference-counted).
#[derive(Clone)]
pub struct SecretStoreClient {
	http: reqwest::Client,
	base_url: String,
	token: String,
	namespace: Option<String>,
}

impl SecretStoreClient {
	pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
		Self::with_timeout(base_url, token, Duration::from_secs(10))
	}

	pub fn with_timeout(base_url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Self {
		let http = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.expect("reqwest client builds with a bounded timeout");
		Self { http, base_url: base_url.into(), token: token.into(), namespace: None }
	}

	pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = Some(namespace.into());
		self
	}

	fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
		let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
		let mut req = self.http.request(method, url).bearer_auth(&self.token);
		if let Some(ns) = &self.namespace {
			req = req.header("X-Vault-Namespace", ns);
		}
		req
	}

	/// Healthy for the documented status codes `{200, 429 standby, 473
	/// perf-standby}`; unhealthy for `{501 uninitialized, 503 sealed}`.
	/// Any other outcome (network error, unexpected status) is also reported
	/// unhealthy rather than propagated, matching a liveness-probe contract.
	pub async fn health(&self) -> bool {
		match self.request(reqwest::Method::GET, "/v1/sys/health").send().await {
			Ok(resp) => matches!(resp.status().as_u16(), 200 | 429 | 473),
			Err(err) => {
				tracing::warn!(error = %err, "secret store health check failed");
				false
			},
		}
	}

	pub async fn create_key(
		&self,
		path: &str,
		opts: CreateKeyOptions,
	) -> Result<CreatedKey, SecretStoreError> {
		let resp = self
			.request(reqwest::Method::POST, &format!("/v1/transit/keys/{path}"))
			.json(&opts)
			.send()
			.await?;
		match resp.status() {
			StatusCode::OK | StatusCode::CREATED => Ok(resp.json::<CreatedKey>().await?),
			StatusCode::CONFLICT => Err(SecretStoreError::Conflict(path.to_string())),
			other => Err(SecretStoreError::Http(format!("create_key: unexpected status {other}"))),
		}
	}

	/// Idempotent: a 404 (already gone) is treated as success so the keyring
	/// can self-heal after a partial failure.
	pub async fn delete_key(&self, path: &str) -> Result<(), SecretStoreError> {
		let resp = self
			.request(reqwest::Method::DELETE, &format!("/v1/transit/keys/{path}"))
			.send()
			.await?;
		match resp.status() {
			StatusCode::OK | StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => Ok(()),
			other => Err(SecretStoreError::Http(format!("delete_key: unexpected status {other}"))),
		}
	}

	pub async fn list_keys(&self, engine: &str) -> Result<Vec<String>, SecretStoreError> {
		let list_method =
			reqwest::Method::from_bytes(b"LIST").expect("LIST is a valid HTTP method token");
		let resp = self.request(list_method, &format!("/v1/{engine}/keys")).send().await?;
		match resp.status() {
			StatusCode::OK => Ok(resp.json::<ListKeysResponse>().await?.keys),
			StatusCode::NOT_FOUND => Ok(Vec::new()),
			other => Err(SecretStoreError::Http(format!("list_keys: unexpected status {other}"))),
		}
	}

	/// `chain_id = 0` selects legacy `v ∈ {27,28}`; non-zero selects
	/// EIP-155 `v`. The store, not this client, performs the arithmetic —
	/// we only forward the selector.
	pub async fn sign_evm(
		&self,
		path: &str,
		hash_b64: &str,
		chain_id: u64,
	) -> Result<EvmSignature, SecretStoreError> {
		let resp = self
			.request(reqwest::Method::POST, &format!("/v1/transit/sign/{path}/evm"))
			.json(&SignEvmRequest { hash_b64, chain_id })
			.send()
			.await?;
		match resp.status() {
			StatusCode::OK => Ok(resp.json::<EvmSignature>().await?),
			StatusCode::NOT_FOUND => Err(SecretStoreError::NotFound(path.to_string())),
			other => Err(SecretStoreError::Http(format!("sign_evm: unexpected status {other}"))),
		}
	}

	pub async fn export_public_armored(&self, path: &str) -> Result<String, SecretStoreError> {
		let resp = self
			.request(reqwest::Method::GET, &format!("/v1/transit/export/public-key/{path}"))
			.send()
			.await?;
		match resp.status() {
			StatusCode::OK => Ok(resp.json::<ExportArmoredResponse>().await?.armor),
			StatusCode::FORBIDDEN => Err(SecretStoreError::NotExportable(path.to_string())),
			StatusCode::NOT_FOUND => Err(SecretStoreError::NotFound(path.to_string())),
			other => Err(SecretStoreError::Http(format!("export_public_armored: unexpected status {other}"))),
		}
	}

	/// Exports the private signing key material itself, armored. The store
	/// enforces the key's own `exportable` flag independently of the
	/// keyring's local copy of it (403 either way), so this is the only path
	/// that can ever move private bytes out of the trust boundary.
	pub async fn export_signing_key_armored(&self, path: &str) -> Result<String, SecretStoreError> {
		let resp = self
			.request(reqwest::Method::GET, &format!("/v1/transit/export/signing-key/{path}"))
			.send()
			.await?;
		match resp.status() {
			StatusCode::OK => Ok(resp.json::<ExportArmoredResponse>().await?.armor),
			StatusCode::FORBIDDEN => Err(SecretStoreError::NotExportable(path.to_string())),
			StatusCode::NOT_FOUND => Err(SecretStoreError::NotFound(path.to_string())),
			other => Err(SecretStoreError::Http(format!("export_signing_key_armored: unexpected status {other}"))),
		}
	}

	pub async fn create_namespace(&self, namespace: &str) -> Result<(), SecretStoreError> {
		let resp = self
			.request(reqwest::Method::POST, &format!("/v1/sys/namespaces/{namespace}"))
			.send()
			.await?;
		match resp.status() {
			StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
			other => Err(SecretStoreError::Http(format!("create_namespace: unexpected status {other}"))),
		}
	}

	pub async fn delete_namespace(&self, namespace: &str) -> Result<(), SecretStoreError> {
		let resp = self
			.request(reqwest::Method::DELETE, &format!("/v1/sys/namespaces/{namespace}"))
			.send()
			.await?;
		match resp.status() {
			StatusCode::OK | StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => Ok(()),
			other => Err(SecretStoreError::Http(format!("delete_namespace: unexpected status {other}"))),
		}
	}

	pub async fn exists_namespace(&self, namespace: &str) -> Result<bool, SecretStoreError> {
		let resp = self
			.request(reqwest::Method::GET, &format!("/v1/sys/namespaces/{namespace}"))
			.send()
			.await?;
		match resp.status() {
			StatusCode::OK => Ok(true),
			StatusCode::NOT_FOUND => Ok(false),
			other => Err(SecretStoreError::Http(format!("exists_namespace: unexpected status {other}"))),
		}
	}

	pub async fn lookup_self(&self) -> Result<serde_json::Value, SecretStoreError> {
		let resp = self.request(reqwest::Method::GET, "/v1/auth/token/lookup-self").send().await?;
		match resp.status() {
			StatusCode::OK => Ok(resp.json().await?),
			other => Err(SecretStoreError::Http(format!("lookup_self: unexpected status {other}"))),
		}
	}
}
