//! Private control channel between the orchestrator and the target process.
//!
//! One server exists per session. Its endpoint is derived deterministically
//! from the session configuration so the injected bootstrap script can dial
//! back without any out-of-band exchange.

mod ipc;

#[cfg(unix)]
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
pub use ep_protocol::InjectingStatus;
pub use ipc::{IpcFactory, IpcServer};

use crate::config::BrowserConfig;
use crate::error::Result;

/// Lifecycle and RPC surface of one session's control-channel server.
///
/// The orchestrator imposes the sequencing: `start` before the process is
/// launched, `connect` once the bootstrap script is injected,
/// `terminate_process` strictly before `stop` on teardown.
#[async_trait]
pub trait ControlChannel: Send + Sync {
	/// Starts listening on the session's endpoint.
	async fn start(&self) -> Result<()>;
	/// Awaits the inbound connection from the bootstrap script.
	async fn connect(&self) -> Result<()>;
	/// Queries whether the expected main window URL loaded.
	async fn injecting_status(&self) -> Result<InjectingStatus>;
	/// Asks the code inside the target process to exit it.
	async fn terminate_process(&self) -> Result<()>;
	/// Shuts the server down and releases the endpoint.
	async fn stop(&self) -> Result<()>;
	/// Generic RPC used by the helper forwarding surface.
	async fn invoke(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value>;
}

/// Creates one control-channel server per session.
#[async_trait]
pub trait ControlChannelFactory: Send + Sync {
	async fn bind(&self, config: &BrowserConfig) -> Result<Arc<dyn ControlChannel>>;
}

/// Where a session's control server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEndpoint {
	/// Unix-domain socket path.
	#[cfg(unix)]
	Unix(PathBuf),
	/// Loopback TCP port.
	Tcp(u16),
}

impl std::fmt::Display for ControlEndpoint {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			#[cfg(unix)]
			ControlEndpoint::Unix(path) => write!(f, "{}", path.display()),
			ControlEndpoint::Tcp(port) => write!(f, "127.0.0.1:{}", port),
		}
	}
}

/// Derives the control endpoint for a browser id.
///
/// Unix gets a socket in the temp dir; elsewhere a loopback port is derived
/// from a hash of the id so launcher and bootstrap script agree on it.
pub fn endpoint_for(browser_id: &str) -> ControlEndpoint {
	#[cfg(unix)]
	{
		ControlEndpoint::Unix(std::env::temp_dir().join(format!("ep-{}.sock", sanitize_id(browser_id))))
	}
	#[cfg(not(unix))]
	{
		ControlEndpoint::Tcp(derived_port(browser_id))
	}
}

#[cfg_attr(not(unix), allow(dead_code, reason = "socket naming is the unix path"))]
fn sanitize_id(browser_id: &str) -> String {
	browser_id
		.chars()
		.map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
		.collect()
}

const CONTROL_PORT_RANGE_START: u16 = 49500;
const CONTROL_PORT_RANGE_LEN: u16 = 10000;

#[cfg_attr(unix, allow(dead_code, reason = "TCP endpoint derivation is the non-unix path"))]
fn derived_port(browser_id: &str) -> u16 {
	// FNV-1a, folded into the private port range.
	let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
	for byte in browser_id.bytes() {
		hash ^= u64::from(byte);
		hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
	}
	CONTROL_PORT_RANGE_START + (hash % u64::from(CONTROL_PORT_RANGE_LEN)) as u16
}
