//! Structured logging bootstrap, grounded in the same
//! `tracing_subscriber::FmtSubscriber` + `EnvFilter::from_default_env`
//! pattern used across the example pack's binaries.

/// Installs the process-wide `tracing` subscriber. Call once, at binary
/// startup, before anything else logs.
pub fn init_tracing() {
	tracing_subscriber::FmtSubscriber::builder()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.try_init()
		.expect("setting the default tracing subscriber failed (was it already installed?)");
}
