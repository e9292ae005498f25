//! JSON-lines control server consumed through [`ControlChannel`].
//!
//! The bootstrap script opens the single inbound connection; every request
//! is one `{"id", "method", "params"}` line, every response one
//! `{"id", "result"}` or `{"id", "error"}` line.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
#[cfg(unix)]
use tokio::net::UnixListener;
use tokio::sync::Mutex;
use tracing::debug;

use super::{ControlChannel, ControlChannelFactory, ControlEndpoint, InjectingStatus, endpoint_for};
use crate::config::BrowserConfig;
use crate::error::{EpError, Result};

/// Binds one [`IpcServer`] per session at the config-derived endpoint.
pub struct IpcFactory;

#[async_trait]
impl ControlChannelFactory for IpcFactory {
	async fn bind(&self, config: &BrowserConfig) -> Result<Arc<dyn ControlChannel>> {
		Ok(Arc::new(IpcServer::new(endpoint_for(&config.browser_id))))
	}
}

enum Listener {
	#[cfg(unix)]
	Unix(UnixListener),
	Tcp(TcpListener),
}

struct Peer {
	reader: BufReader<Box<dyn AsyncRead + Send + Unpin>>,
	writer: Box<dyn AsyncWrite + Send + Unpin>,
}

/// Per-session control-channel server.
pub struct IpcServer {
	endpoint: ControlEndpoint,
	listener: Mutex<Option<Listener>>,
	peer: Mutex<Option<Peer>>,
	next_id: AtomicU64,
}

impl IpcServer {
	pub fn new(endpoint: ControlEndpoint) -> Self {
		Self {
			endpoint,
			listener: Mutex::new(None),
			peer: Mutex::new(None),
			next_id: AtomicU64::new(1),
		}
	}

	pub fn endpoint(&self) -> &ControlEndpoint {
		&self.endpoint
	}
}

#[async_trait]
impl ControlChannel for IpcServer {
	async fn start(&self) -> Result<()> {
		let listener = match &self.endpoint {
			#[cfg(unix)]
			ControlEndpoint::Unix(path) => {
				if path.exists() {
					std::fs::remove_file(path)
						.map_err(|e| EpError::Control(format!("failed to remove stale socket {}: {}", path.display(), e)))?;
				}
				Listener::Unix(
					UnixListener::bind(path)
						.map_err(|e| EpError::Control(format!("failed to bind {}: {}", path.display(), e)))?,
				)
			}
			ControlEndpoint::Tcp(port) => Listener::Tcp(
				TcpListener::bind(("127.0.0.1", *port))
					.await
					.map_err(|e| EpError::Control(format!("failed to bind 127.0.0.1:{}: {}", port, e)))?,
			),
		};

		*self.listener.lock().await = Some(listener);
		debug!(target = "ep.ipc", endpoint = %self.endpoint, "control channel listening");
		Ok(())
	}

	async fn connect(&self) -> Result<()> {
		let guard = self.listener.lock().await;
		let listener = guard
			.as_ref()
			.ok_or_else(|| EpError::Control("control channel is not started".to_string()))?;

		let peer = match listener {
			#[cfg(unix)]
			Listener::Unix(listener) => {
				let (stream, _) = listener
					.accept()
					.await
					.map_err(|e| EpError::Control(format!("accept failed on {}: {}", self.endpoint, e)))?;
				let (read, write) = stream.into_split();
				Peer {
					reader: BufReader::new(Box::new(read)),
					writer: Box::new(write),
				}
			}
			Listener::Tcp(listener) => {
				let (stream, _) = listener
					.accept()
					.await
					.map_err(|e| EpError::Control(format!("accept failed on {}: {}", self.endpoint, e)))?;
				let (read, write) = stream.into_split();
				Peer {
					reader: BufReader::new(Box::new(read)),
					writer: Box::new(write),
				}
			}
		};

		*self.peer.lock().await = Some(peer);
		debug!(target = "ep.ipc", endpoint = %self.endpoint, "bootstrap connected");
		Ok(())
	}

	async fn injecting_status(&self) -> Result<InjectingStatus> {
		let value = self.invoke("getInjectingStatus", json!({})).await?;
		serde_json::from_value(value).map_err(|e| EpError::Control(format!("malformed injecting status: {}", e)))
	}

	async fn terminate_process(&self) -> Result<()> {
		self.invoke("terminateProcess", json!({})).await.map(|_| ())
	}

	async fn stop(&self) -> Result<()> {
		*self.peer.lock().await = None;
		let listener = self.listener.lock().await.take();

		#[cfg(unix)]
		if listener.is_some() {
			if let ControlEndpoint::Unix(path) = &self.endpoint {
				let _ = std::fs::remove_file(path);
			}
		}
		#[cfg(not(unix))]
		drop(listener);

		debug!(target = "ep.ipc", endpoint = %self.endpoint, "control channel stopped");
		Ok(())
	}

	async fn invoke(&self, method: &str, params: Value) -> Result<Value> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let mut line = json!({ "id": id, "method": method, "params": params }).to_string();
		line.push('\n');

		let mut guard = self.peer.lock().await;
		let peer = guard
			.as_mut()
			.ok_or_else(|| EpError::Control(format!("no connected peer for '{}'", method)))?;

		peer.writer
			.write_all(line.as_bytes())
			.await
			.map_err(|e| EpError::Control(format!("'{}' send failed: {}", method, e)))?;

		loop {
			let mut response = String::new();
			let read = peer
				.reader
				.read_line(&mut response)
				.await
				.map_err(|e| EpError::Control(format!("'{}' receive failed: {}", method, e)))?;
			if read == 0 {
				return Err(EpError::Control(format!("channel closed while waiting for '{}'", method)));
			}

			let value: Value = serde_json::from_str(response.trim())
				.map_err(|e| EpError::Control(format!("malformed response to '{}': {}", method, e)))?;
			if value.get("id") != Some(&json!(id)) {
				// Unsolicited notifications are diagnostic only.
				debug!(target = "ep.ipc", message = %response.trim(), "skipping notification");
				continue;
			}

			if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
				let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
				return Err(EpError::Control(message));
			}

			return Ok(value.get("result").cloned().unwrap_or(Value::Null));
		}
	}
}
