//! Remote-debugging automation client attached for a session's lifetime.

mod cdp;

use std::sync::Arc;

use async_trait::async_trait;
pub use cdp::CdpConnector;
use ep_protocol::{InputEvent, NativeAutomationOptions};

use crate::error::Result;

/// Low-level protocol client: navigation and native input dispatch.
#[async_trait]
pub trait ProtocolClient: Send + Sync {
	/// Navigates the top-level frame to `url`.
	async fn navigate(&self, url: &str) -> Result<()>;
	/// Dispatches one native input event.
	async fn dispatch_input_event(&self, event: &InputEvent) -> Result<()>;
	/// Prepares the connection for native input dispatch.
	async fn prepare(&self, options: &NativeAutomationOptions) -> Result<()>;
}

/// Client bound to one session's remote-debugging port.
#[async_trait]
pub trait AutomationClient: Send + Sync {
	/// Establishes the remote-debugging connection.
	async fn init(&self) -> Result<()>;
	/// Returns the active low-level client. Fails before `init` completes.
	fn active_client(&self) -> Result<Arc<dyn ProtocolClient>>;
}

/// Attaches automation clients to remote-debugging ports.
#[async_trait]
pub trait AutomationConnector: Send + Sync {
	async fn attach(&self, remote_debug_port: u16) -> Result<Arc<dyn AutomationClient>>;
}
