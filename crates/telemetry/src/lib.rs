//! Observability: tracing bootstrap plus the audit and usage sinks every
//! mutating operation reports through.

mod audit;
mod init;
mod usage;
mod webhook;

pub use audit::{AuditEvent, AuditSink};
pub use init::init_tracing;
pub use usage::UsageSink;
pub use webhook::{apply_delivery_outcome, WebhookDispatcher};
