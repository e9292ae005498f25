//! Automation client over the DevTools remote-debugging websocket.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use super::{AutomationClient, AutomationConnector, ProtocolClient};
use crate::error::{EpError, Result};
use ep_protocol::{InputEvent, NativeAutomationOptions};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// `/json/version` response subset.
#[derive(Debug, Deserialize)]
struct VersionInfo {
	#[serde(rename = "webSocketDebuggerUrl")]
	web_socket_debugger_url: String,
}

/// Resolves browser-level websocket metadata from `/json/version` on `port`.
async fn fetch_version(port: u16) -> Result<VersionInfo> {
	let client = reqwest::Client::builder()
		.timeout(Duration::from_millis(400))
		.build()
		.map_err(|e| EpError::Automation(format!("failed to create HTTP client: {}", e)))?;
	let mut last_error = "no response".to_string();

	for url in [
		format!("http://127.0.0.1:{}/json/version", port),
		format!("http://localhost:{}/json/version", port),
	] {
		let response = match client.get(&url).send().await {
			Ok(r) => r,
			Err(e) => {
				last_error = e.to_string();
				continue;
			}
		};

		if !response.status().is_success() {
			last_error = format!("unexpected status {}", response.status());
			continue;
		}

		return response
			.json()
			.await
			.map_err(|e| EpError::Automation(format!("failed to parse version response: {}", e)));
	}

	Err(EpError::Automation(format!("failed to connect to port {}: {}", port, last_error)))
}

/// Attaches [`CdpAutomation`] clients.
pub struct CdpConnector;

#[async_trait]
impl AutomationConnector for CdpConnector {
	async fn attach(&self, remote_debug_port: u16) -> Result<Arc<dyn AutomationClient>> {
		Ok(Arc::new(CdpAutomation {
			port: remote_debug_port,
			client: parking_lot::Mutex::new(None),
		}))
	}
}

/// Automation client holding the session's remote-debugging connection.
pub struct CdpAutomation {
	port: u16,
	client: parking_lot::Mutex<Option<Arc<CdpClient>>>,
}

#[async_trait]
impl AutomationClient for CdpAutomation {
	async fn init(&self) -> Result<()> {
		let version = fetch_version(self.port).await?;
		debug!(target = "ep.cdp", url = %version.web_socket_debugger_url, "attaching automation client");
		let (socket, _) = connect_async(&version.web_socket_debugger_url)
			.await
			.map_err(|e| EpError::Automation(format!("websocket connect failed: {}", e)))?;

		*self.client.lock() = Some(Arc::new(CdpClient {
			socket: tokio::sync::Mutex::new(socket),
			next_id: AtomicU64::new(1),
		}));
		Ok(())
	}

	fn active_client(&self) -> Result<Arc<dyn ProtocolClient>> {
		self.client
			.lock()
			.clone()
			.map(|client| client as Arc<dyn ProtocolClient>)
			.ok_or_else(|| EpError::Automation("automation client is not initialized".to_string()))
	}
}

/// Low-level command client over the shared websocket.
pub struct CdpClient {
	socket: tokio::sync::Mutex<WsStream>,
	next_id: AtomicU64,
}

impl CdpClient {
	async fn command(&self, method: &str, params: Value) -> Result<Value> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let payload = json!({ "id": id, "method": method, "params": params });

		let mut socket = self.socket.lock().await;
		socket
			.send(Message::Text(payload.to_string().into()))
			.await
			.map_err(|e| EpError::Automation(format!("'{}' send failed: {}", method, e)))?;

		while let Some(message) = socket.next().await {
			let message = message.map_err(|e| EpError::Automation(format!("'{}' receive failed: {}", method, e)))?;
			let Message::Text(text) = message else { continue };
			let value: Value = serde_json::from_str(&text)
				.map_err(|e| EpError::Automation(format!("malformed protocol message: {}", e)))?;
			if value.get("id") != Some(&json!(id)) {
				// Protocol events interleave with command responses.
				continue;
			}

			if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
				let message = error
					.get("message")
					.and_then(Value::as_str)
					.map(str::to_string)
					.unwrap_or_else(|| error.to_string());
				return Err(EpError::Automation(format!("'{}' failed: {}", method, message)));
			}

			return Ok(value.get("result").cloned().unwrap_or(Value::Null));
		}

		Err(EpError::Automation(format!("connection closed while waiting for '{}'", method)))
	}
}

#[async_trait]
impl ProtocolClient for CdpClient {
	async fn navigate(&self, url: &str) -> Result<()> {
		self.command("Page.navigate", json!({ "url": url })).await.map(|_| ())
	}

	async fn dispatch_input_event(&self, event: &InputEvent) -> Result<()> {
		self.command(event.event_type.method(), event.options.clone()).await.map(|_| ())
	}

	async fn prepare(&self, options: &NativeAutomationOptions) -> Result<()> {
		self.command("Page.enable", json!({})).await?;
		self.command("Runtime.enable", json!({})).await?;
		if !options.init.is_empty() {
			debug!(target = "ep.cdp", options = ?options.init, "native automation options recorded");
		}
		Ok(())
	}
}
