//! Outbound webhook delivery. Mirrors
//! the HMAC-over-payload signing shape used elsewhere for proof signing,
//! generalized here from ECDSA-over-digest to HMAC-SHA256-over-body: every
//! POST carries an `X-Sigil-Signature` header the receiver can verify
//! against the webhook's shared secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use sigil_repository::{Repository, Webhook, WebhookDelivery};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

fn sign(secret: &str, body: &[u8]) -> String {
	let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts a key of any length");
	mac.update(body);
	hex::encode(mac.finalize().into_bytes())
}

#[derive(Debug, Clone)]
struct QueuedDelivery {
	webhook_id: Uuid,
	url: String,
	secret: String,
	body: serde_json::Value,
	attempt: u32,
}

/// Delivers webhook payloads with a bounded exponential-backoff retry
/// queue. `dispatch` enqueues and returns immediately; the retry loop runs
/// in the background via [`Self::run`].
#[derive(Clone)]
pub struct WebhookDispatcher {
	repository: Arc<dyn Repository>,
	http: reqwest::Client,
	queue: Arc<Mutex<VecDeque<QueuedDelivery>>>,
	max_attempts: u32,
	base_delay: Duration,
}

impl WebhookDispatcher {
	pub fn new(repository: Arc<dyn Repository>) -> Self {
		Self::with_limits(repository, 5, Duration::from_millis(500))
	}

	pub fn with_limits(repository: Arc<dyn Repository>, max_attempts: u32, base_delay: Duration) -> Self {
		Self {
			repository,
			http: reqwest::Client::builder().timeout(Duration::from_secs(10)).build().expect("reqwest client builds with a bounded timeout"),
			queue: Arc::new(Mutex::new(VecDeque::new())),
			max_attempts,
			base_delay,
		}
	}

	/// Dispatches `payload` to every enabled webhook in `org_id` subscribed
	/// to `event`. Fire-and-forget: callers on the audit-event path never
	/// block on delivery.
	pub async fn dispatch(&self, org_id: Uuid, event: &str, payload: serde_json::Value) {
		let webhooks = match self.repository.list_enabled_webhooks_for_event(org_id, event).await {
			Ok(hooks) => hooks,
			Err(err) => {
				tracing::warn!(error = %err, event, "failed to look up webhooks for event");
				return;
			}
		};
		let body = serde_json::json!({ "event": event, "data": payload });
		let mut queue = self.queue.lock().await;
		for webhook in webhooks {
			queue.push_back(QueuedDelivery { webhook_id: webhook.id, url: webhook.url, secret: webhook.secret, body: body.clone(), attempt: 0 });
		}
	}

	/// Re-enqueues a prior delivery's exact payload against `webhook`, used
	/// by `/webhooks/{id}/deliveries/{id}/retry`. Counts as a fresh attempt
	/// sequence, independent of whatever attempt count the original
	/// delivery reached.
	pub async fn enqueue_retry(&self, webhook: &Webhook, payload: serde_json::Value) {
		self.queue.lock().await.push_back(QueuedDelivery {
			webhook_id: webhook.id,
			url: webhook.url.clone(),
			secret: webhook.secret.clone(),
			body: payload,
			attempt: 0,
		});
	}

	async fn attempt_delivery(&self, delivery: &QueuedDelivery) -> (WebhookDelivery, bool) {
		let body = serde_json::to_vec(&delivery.body).unwrap_or_default();
		let signature = sign(&delivery.secret, &body);
		let started = std::time::Instant::now();
		let result = self
			.http
			.post(&delivery.url)
			.header("X-Sigil-Signature", signature)
			.header("Content-Type", "application/json")
			.body(body)
			.send()
			.await;
		let duration_ms = started.elapsed().as_millis() as u64;
		let (status_code, success, error) = match result {
			Ok(resp) => {
				let status = resp.status();
				(Some(status.as_u16()), status.is_success(), if status.is_success() { None } else { Some(format!("status {status}")) })
			}
			Err(err) => (None, false, Some(err.to_string())),
		};
		(
			WebhookDelivery {
				id: Uuid::new_v4(),
				webhook_id: delivery.webhook_id,
				payload: delivery.body.clone(),
				status_code,
				duration_ms,
				success,
				error,
				attempted_at: chrono::Utc::now(),
			},
			success,
		)
	}

	/// Drains the retry queue until `cancel` fires, retrying failed
	/// deliveries with exponential backoff up to `max_attempts`, capped and
	/// then dropped with a warning.
	pub async fn run(self, cancel: tokio_util::sync::CancellationToken) {
		loop {
			let next = {
				let mut queue = self.queue.lock().await;
				queue.pop_front()
			};
			let Some(mut delivery) = next else {
				tokio::select! {
					biased;
					_ = cancel.cancelled() => return,
					_ = tokio::time::sleep(Duration::from_millis(100)) => continue,
				}
			};

			delivery.attempt += 1;
			let (record, success) = self.attempt_delivery(&delivery).await;
			if let Err(err) = self.repository.record_webhook_delivery(record).await {
				tracing::warn!(error = %err, "failed to persist webhook delivery record");
			}

			if !success {
				if delivery.attempt >= self.max_attempts {
					tracing::warn!(webhook_id = %delivery.webhook_id, attempts = delivery.attempt, "webhook delivery abandoned after exhausting retries");
				} else {
					let delay = self.base_delay * 2u32.pow(delivery.attempt - 1);
					let queue = self.queue.clone();
					let cancel = cancel.clone();
					tokio::spawn(async move {
						tokio::select! {
							biased;
							_ = cancel.cancelled() => {}
							_ = tokio::time::sleep(delay) => queue.lock().await.push_back(delivery),
						}
					});
				}
			}

			if cancel.is_cancelled() {
				return;
			}
		}
	}
}

/// Backs a `Webhook`'s `failure_count` up after a delivery outcome,
/// separate from [`WebhookDispatcher`] so tests can exercise the counter
/// logic without spinning up an HTTP client.
pub fn apply_delivery_outcome(mut webhook: Webhook, success: bool) -> Webhook {
	webhook.last_triggered_at = Some(chrono::Utc::now());
	webhook.failure_count = if success { 0 } else { webhook.failure_count + 1 };
	webhook
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn signature_is_deterministic_for_the_same_secret_and_body() {
		let body = br#"{"event":"deployment.completed"}"#;
		let a = sign("shh", body);
		let b = sign("shh", body);
		assert_eq!(a, b);
		assert_ne!(a, sign("different", body));
	}

	#[test]
	fn delivery_outcome_resets_or_increments_failure_count() {
		let webhook = Webhook {
			id: Uuid::new_v4(),
			org_id: Uuid::new_v4(),
			url: "https://example.com/hook".to_string(),
			secret: "shh".to_string(),
			events: vec!["deployment.completed".to_string()],
			enabled: true,
			failure_count: 2,
			last_triggered_at: None,
		};
		let succeeded = apply_delivery_outcome(webhook.clone(), true);
		assert_eq!(succeeded.failure_count, 0);
		let failed = apply_delivery_outcome(webhook, false);
		assert_eq!(failed.failure_count, 3);
	}

	#[tokio::test]
	async fn dispatch_enqueues_one_entry_per_matching_webhook() {
		use sigil_repository::{InMemoryRepository, Plan};
		let repository: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
		let org = repository.create_organization("acme", Plan::Free).await.unwrap();
		repository
			.create_webhook(Webhook {
				id: Uuid::new_v4(),
				org_id: org.id,
				url: "https://example.com/hook".to_string(),
				secret: "shh".to_string(),
				events: vec!["deployment.completed".to_string()],
				enabled: true,
				failure_count: 0,
				last_triggered_at: None,
			})
			.await
			.unwrap();
		let dispatcher = WebhookDispatcher::new(repository);
		dispatcher.dispatch(org.id, "deployment.completed", serde_json::json!({"id": "abc"})).await;
		assert_eq!(dispatcher.queue.lock().await.len(), 1);
	}
}
