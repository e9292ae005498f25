//! Native-automation sub-session.

use std::sync::Arc;
use std::time::Duration;

use ep_protocol::{InputEvent, NativeAutomationOptions, SequenceItem};
use tracing::debug;

use crate::automation::ProtocolClient;
use crate::error::Result;

/// Native input dispatch for one session.
///
/// Owned by the session record, created only when `open_browser` was asked
/// for native automation, and never outlives its parent.
pub struct NativeAutomationSession {
	browser_id: String,
	client: Arc<dyn ProtocolClient>,
	options: NativeAutomationOptions,
}

impl NativeAutomationSession {
	pub fn new(browser_id: impl Into<String>, client: Arc<dyn ProtocolClient>, options: NativeAutomationOptions) -> Self {
		Self {
			browser_id: browser_id.into(),
			client,
			options,
		}
	}

	/// Prepares the protocol connection for input dispatch.
	pub async fn init(&self) -> Result<()> {
		self.client.prepare(&self.options).await?;
		debug!(target = "ep.session", id = %self.browser_id, "native automation ready");
		Ok(())
	}

	pub fn client(&self) -> Arc<dyn ProtocolClient> {
		self.client.clone()
	}
}

/// Runs one event sequence on `client`, strictly in order.
///
/// A delay item fully elapses before the next item runs; the first failing
/// event aborts the remainder.
pub async fn dispatch_sequence(client: &dyn ProtocolClient, items: &[SequenceItem]) -> Result<()> {
	for item in items {
		match item {
			SequenceItem::Delay { duration_ms } => {
				tokio::time::sleep(Duration::from_millis(*duration_ms)).await;
			}
			SequenceItem::Event { event } => {
				client.dispatch_input_event(event).await?;
			}
		}
	}
	Ok(())
}

/// Dispatches a single native input event on `client`.
pub async fn dispatch_event(client: &dyn ProtocolClient, event: &InputEvent) -> Result<()> {
	client.dispatch_input_event(event).await
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Instant;

	use async_trait::async_trait;
	use ep_protocol::InputEventType;
	use parking_lot::Mutex;
	use serde_json::json;

	use super::*;
	use crate::error::EpError;

	#[derive(Default)]
	struct RecordingClient {
		dispatched: Mutex<Vec<InputEvent>>,
		fail_after: Option<usize>,
		prepared: AtomicUsize,
	}

	#[async_trait]
	impl ProtocolClient for RecordingClient {
		async fn navigate(&self, _url: &str) -> Result<()> {
			Ok(())
		}

		async fn dispatch_input_event(&self, event: &InputEvent) -> Result<()> {
			let mut dispatched = self.dispatched.lock();
			if self.fail_after.is_some_and(|limit| dispatched.len() >= limit) {
				return Err(EpError::Automation("target closed".into()));
			}
			dispatched.push(event.clone());
			Ok(())
		}

		async fn prepare(&self, _options: &NativeAutomationOptions) -> Result<()> {
			self.prepared.fetch_add(1, Ordering::Relaxed);
			Ok(())
		}
	}

	fn click() -> SequenceItem {
		SequenceItem::event(InputEventType::DispatchMouseEvent, json!({ "type": "mousePressed" }))
	}

	#[tokio::test]
	async fn delay_fully_elapses_before_the_next_event() {
		let client = RecordingClient::default();
		let started = Instant::now();

		dispatch_sequence(&client, &[SequenceItem::delay(50), click()]).await.unwrap();

		assert!(started.elapsed() >= Duration::from_millis(50));
		assert_eq!(client.dispatched.lock().len(), 1);
	}

	#[tokio::test]
	async fn failure_aborts_the_remainder_of_the_sequence() {
		let client = RecordingClient {
			fail_after: Some(1),
			..Default::default()
		};

		let err = dispatch_sequence(&client, &[click(), click(), click()]).await.unwrap_err();
		assert!(matches!(err, EpError::Automation(_)));
		assert_eq!(client.dispatched.lock().len(), 1);
	}

	#[tokio::test]
	async fn init_prepares_the_client_once() {
		let client = Arc::new(RecordingClient::default());
		let session = NativeAutomationSession::new("b1", client.clone(), NativeAutomationOptions::new());

		session.init().await.unwrap();
		assert_eq!(client.prepared.load(Ordering::Relaxed), 1);
	}
}
