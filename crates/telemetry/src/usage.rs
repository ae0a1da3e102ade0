//! Usage metering against the plan's monthly quota. Period
//! rolls over naturally because [`sigil_repository::current_period`] keys
//! off the wall-clock month; nothing here resets counters explicitly.

use sigil_repository::{current_period, Repository};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct UsageSink {
	repository: Arc<dyn Repository>,
}

impl UsageSink {
	pub fn new(repository: Arc<dyn Repository>) -> Self {
		Self { repository }
	}

	/// Fire-and-forget increment; the signing/deployment path that triggered
	/// it must not wait on metering.
	pub fn record(&self, org_id: Uuid, metric: impl Into<String>) {
		let repository = self.repository.clone();
		let metric = metric.into();
		tokio::spawn(async move {
			let period = current_period();
			if let Err(err) = repository.increment_usage(org_id, &metric, &period, 1).await {
				tracing::warn!(error = %err, metric, "failed to record usage");
			}
		});
	}

	/// Synchronous read for quota checks on the request path, where the
	/// caller needs the current count before deciding whether to proceed.
	pub async fn current(&self, org_id: Uuid, metric: &str) -> i64 {
		let period = current_period();
		self.repository.get_usage(org_id, metric, &period).await.unwrap_or(0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sigil_repository::{InMemoryRepository, Plan};

	#[tokio::test]
	async fn record_then_current_reflects_the_increment() {
		let repository: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
		let org = repository.create_organization("acme", Plan::Free).await.unwrap();
		let sink = UsageSink::new(repository);
		sink.record(org.id, "signatures");
		tokio::time::sleep(std::time::Duration::from_millis(10)).await;
		assert_eq!(sink.current(org.id, "signatures").await, 1);
	}
}
