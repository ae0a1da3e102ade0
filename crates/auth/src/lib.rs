//! Request authentication: credential extraction, API-key lifecycle, scope
//! and role enforcement, and session cookies.

mod api_key;
mod authenticator;
mod context;
mod credentials;
mod error;
mod session;

pub use api_key::{hash as hash_api_key, mint as mint_api_key, verify as verify_api_key, MintedApiKey};
pub use authenticator::Authenticator;
pub use context::{AuthContext, Principal};
pub use credentials::{extract_credential, CredentialSources, RawCredential, API_KEY_PREFIX, SESSION_COOKIE_NAME};
pub use error::AuthError;
pub use session::{clear_cookie_header, set_cookie_header, SESSION_TTL};
