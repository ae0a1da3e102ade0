//! Typed HTTP client for the remote, Transit-style secret store that holds
//! private key material on behalf of the keyring.

mod client;
mod error;
mod types;

pub use client::SecretStoreClient;
pub use error::SecretStoreError;
pub use types::{CreateKeyOptions, CreatedKey, EvmSignature};

#[cfg(test)]
mod tests {
	use super::*;
	use wiremock::matchers::{method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	#[tokio::test]
	async fn health_reports_true_for_standby_codes() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/v1/sys/health"))
			.respond_with(ResponseTemplate::new(429))
			.mount(&server)
			.await;
		let client = SecretStoreClient::new(server.uri(), "token");
		assert!(client.health().await);
	}

	#[tokio::test]
	async fn health_reports_false_when_sealed() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/v1/sys/health"))
			.respond_with(ResponseTemplate::new(503))
			.mount(&server)
			.await;
		let client = SecretStoreClient::new(server.uri(), "token");
		assert!(!client.health().await);
	}

	#[tokio::test]
	async fn delete_key_is_idempotent_on_404() {
		let server = MockServer::start().await;
		Mock::given(method("DELETE"))
			.and(path("/v1/transit/keys/secp256k1/keys/alpha"))
			.respond_with(ResponseTemplate::new(404))
			.mount(&server)
			.await;
		let client = SecretStoreClient::new(server.uri(), "token");
		assert!(client.delete_key("secp256k1/keys/alpha").await.is_ok());
	}

	#[tokio::test]
	async fn export_public_armored_reports_not_exportable_on_403() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/v1/transit/export/public-key/secp256k1/keys/alpha"))
			.respond_with(ResponseTemplate::new(403))
			.mount(&server)
			.await;
		let client = SecretStoreClient::new(server.uri(), "token");
		let err = client.export_public_armored("secp256k1/keys/alpha").await.unwrap_err();
		assert!(matches!(err, SecretStoreError::NotExportable(_)));
	}

	#[tokio::test]
	async fn export_signing_key_armored_reports_not_exportable_on_403() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/v1/transit/export/signing-key/secp256k1/keys/alpha"))
			.respond_with(ResponseTemplate::new(403))
			.mount(&server)
			.await;
		let client = SecretStoreClient::new(server.uri(), "token");
		let err = client.export_signing_key_armored("secp256k1/keys/alpha").await.unwrap_err();
		assert!(matches!(err, SecretStoreError::NotExportable(_)));
	}

	#[tokio::test]
	async fn export_signing_key_armored_returns_the_armor_on_success() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/v1/transit/export/signing-key/secp256k1/keys/alpha"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "armor": "armored-blob" })))
			.mount(&server)
			.await;
		let client = SecretStoreClient::new(server.uri(), "token");
		let armor = client.export_signing_key_armored("secp256k1/keys/alpha").await.unwrap();
		assert_eq!(armor, "armored-blob");
	}

	#[test]
	fn evm_signature_left_pads_short_components() {
		let sig = EvmSignature { r_hex: "0x1234".into(), s_hex: "0xabcd".into(), v: 27 };
		let bytes = sig.to_rsv_bytes().unwrap();
		assert_eq!(&bytes[..30], &[0u8; 30]);
		assert_eq!(&bytes[30..32], &[0x12, 0x34]);
		assert_eq!(bytes[64], 27);
	}
}
