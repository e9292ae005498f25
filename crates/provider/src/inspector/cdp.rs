//! Inspector connection over the DevTools websocket.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use super::{InspectorConnection, InspectorConnector};
use crate::error::{EpError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const DISCOVERY_ATTEMPTS: u32 = 8;
const DISCOVERY_RETRY_DELAY: Duration = Duration::from_millis(200);

/// `/json` target list entry subset.
#[derive(Debug, Deserialize)]
struct InspectorTarget {
	#[serde(rename = "webSocketDebuggerUrl")]
	web_socket_debugger_url: Option<String>,
}

/// Connector for the `--inspect-brk` debugger endpoint.
pub struct CdpInspector;

impl CdpInspector {
	/// Resolves the target's websocket URL from `/json` on `port`.
	///
	/// The endpoint needs a moment to come up after spawn, so discovery
	/// retries briefly before giving up.
	async fn discover(port: u16) -> Result<String> {
		let client = reqwest::Client::builder()
			.timeout(Duration::from_millis(400))
			.build()
			.map_err(|e| EpError::Injection(format!("failed to create HTTP client: {}", e)))?;

		let mut last_error = "endpoint not reachable".to_string();
		for _ in 0..DISCOVERY_ATTEMPTS {
			for url in [format!("http://127.0.0.1:{}/json", port), format!("http://localhost:{}/json", port)] {
				match client.get(&url).send().await {
					Ok(response) if response.status().is_success() => {
						let targets: Vec<InspectorTarget> = response
							.json()
							.await
							.map_err(|e| EpError::Injection(format!("failed to parse inspector target list: {}", e)))?;
						if let Some(ws_url) = pick_debugger_url(&targets) {
							return Ok(ws_url.to_string());
						}
						last_error = "no debuggable target listed".to_string();
					}
					Ok(response) => last_error = format!("unexpected status {}", response.status()),
					Err(e) => last_error = e.to_string(),
				}
			}
			tokio::time::sleep(DISCOVERY_RETRY_DELAY).await;
		}

		Err(EpError::Injection(format!(
			"debugger endpoint not available on port {}: {}",
			port, last_error
		)))
	}
}

fn pick_debugger_url(targets: &[InspectorTarget]) -> Option<&str> {
	targets.iter().find_map(|t| t.web_socket_debugger_url.as_deref())
}

#[async_trait]
impl InspectorConnector for CdpInspector {
	async fn connect(&self, port: u16) -> Result<Box<dyn InspectorConnection>> {
		let url = Self::discover(port).await?;
		debug!(target = "ep.cdp", %url, "inspector connected");
		let (socket, _) = connect_async(&url)
			.await
			.map_err(|e| EpError::Injection(format!("websocket connect to {} failed: {}", url, e)))?;
		Ok(Box::new(CdpConnection {
			socket: Some(socket),
			next_id: 1,
		}))
	}
}

struct CdpConnection {
	socket: Option<WsStream>,
	next_id: u64,
}

impl CdpConnection {
	async fn command(&mut self, method: &str, params: Value) -> Result<Value> {
		let socket = self
			.socket
			.as_mut()
			.ok_or_else(|| EpError::Injection("inspector connection already disposed".to_string()))?;

		let id = self.next_id;
		self.next_id += 1;
		let payload = json!({ "id": id, "method": method, "params": params });
		socket
			.send(Message::Text(payload.to_string().into()))
			.await
			.map_err(|e| EpError::Injection(format!("'{}' send failed: {}", method, e)))?;

		while let Some(message) = socket.next().await {
			let message = message.map_err(|e| EpError::Injection(format!("'{}' receive failed: {}", method, e)))?;
			let Message::Text(text) = message else { continue };
			let value: Value = serde_json::from_str(&text)
				.map_err(|e| EpError::Injection(format!("malformed inspector message: {}", e)))?;
			if value.get("id") == Some(&json!(id)) {
				if let Some(failure) = evaluation_failure(&value) {
					return Err(EpError::Injection(failure));
				}
				return Ok(value);
			}
		}

		Err(EpError::Injection(format!("connection closed while waiting for '{}'", method)))
	}
}

/// Extracts a failure description from a command response, if any.
fn evaluation_failure(response: &Value) -> Option<String> {
	if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
		return Some(
			error
				.get("message")
				.and_then(Value::as_str)
				.map(str::to_string)
				.unwrap_or_else(|| error.to_string()),
		);
	}

	let details = response.pointer("/result/exceptionDetails")?;
	let description = details
		.pointer("/exception/description")
		.and_then(Value::as_str)
		.or_else(|| details.get("text").and_then(Value::as_str))
		.unwrap_or("script threw an exception");
	Some(description.to_string())
}

#[async_trait]
impl InspectorConnection for CdpConnection {
	async fn evaluate(&mut self, source: &str) -> Result<()> {
		// The process was spawned with --inspect-brk and is paused on its
		// first statement until told otherwise.
		self.command("Runtime.runIfWaitingForDebugger", json!({})).await?;
		self.command("Runtime.evaluate", json!({ "expression": source, "includeCommandLineAPI": true }))
			.await
			.map(|_| ())
	}

	async fn dispose(&mut self) -> Result<()> {
		if let Some(mut socket) = self.socket.take() {
			let _ = socket.close(None).await;
		}
		Ok(())
	}
}
