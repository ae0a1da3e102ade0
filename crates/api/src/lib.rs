//! axum REST and JSON-RPC HTTP surface for the control plane.
//!
//! [`routes::router`] returns the whole `/v1/*` tree; callers merge it onto
//! their own `Router<AppState>` with whatever middleware layers the binary
//! wants (tracing, panic catching, body limits).

mod error;
mod extract;
pub mod routes;
mod state;

pub use error::ApiError;
pub use extract::Authenticated;
pub use routes::router;
pub use state::AppState;
