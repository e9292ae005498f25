//! Live session record.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::automation::{AutomationClient, ProtocolClient};
use crate::config::BrowserConfig;
use crate::control::ControlChannel;
use crate::error::{EpError, Result};
use crate::helpers::HelperForwarder;
use crate::native::NativeAutomationSession;
use crate::ports::PortTriple;

/// Everything the registry knows about one open session.
///
/// Constructed after the readiness handshake succeeds. The automation
/// client and the optional native-automation sub-session are attached
/// during the remainder of the open sequence; nothing else ever mutates.
pub struct SessionRecord {
	id: String,
	config: BrowserConfig,
	ports: PortTriple,
	channel: Arc<dyn ControlChannel>,
	helpers: HelperForwarder,
	automation: Mutex<Option<Arc<dyn AutomationClient>>>,
	native: Mutex<Option<NativeAutomationSession>>,
}

impl std::fmt::Debug for SessionRecord {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionRecord")
			.field("id", &self.id)
			.field("config", &self.config)
			.field("ports", &self.ports)
			.finish_non_exhaustive()
	}
}

impl SessionRecord {
	pub fn new(id: impl Into<String>, config: BrowserConfig, ports: PortTriple, channel: Arc<dyn ControlChannel>) -> Self {
		Self {
			id: id.into(),
			helpers: HelperForwarder::new(channel.clone()),
			config,
			ports,
			channel,
			automation: Mutex::new(None),
			native: Mutex::new(None),
		}
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn config(&self) -> &BrowserConfig {
		&self.config
	}

	pub fn ports(&self) -> PortTriple {
		self.ports
	}

	pub fn channel(&self) -> &Arc<dyn ControlChannel> {
		&self.channel
	}

	pub fn helpers(&self) -> &HelperForwarder {
		&self.helpers
	}

	/// Attaches the remote-automation client once it is initialized.
	pub fn set_automation(&self, client: Arc<dyn AutomationClient>) {
		*self.automation.lock() = Some(client);
	}

	pub fn automation(&self) -> Result<Arc<dyn AutomationClient>> {
		self.automation
			.lock()
			.clone()
			.ok_or_else(|| EpError::Automation(format!("no automation client attached for '{}'", self.id)))
	}

	/// Active low-level protocol client of the attached automation client.
	pub fn active_protocol_client(&self) -> Result<Arc<dyn ProtocolClient>> {
		self.automation()?.active_client()
	}

	/// Attaches the lazily created native-automation sub-session.
	pub fn attach_native(&self, session: NativeAutomationSession) {
		*self.native.lock() = Some(session);
	}

	pub fn has_native(&self) -> bool {
		self.native.lock().is_some()
	}

	/// Protocol client of the native sub-session; fails when the session
	/// was opened without native automation.
	pub fn native_client(&self) -> Result<Arc<dyn ProtocolClient>> {
		self.native
			.lock()
			.as_ref()
			.map(NativeAutomationSession::client)
			.ok_or_else(|| EpError::Automation(format!("native automation is not enabled for '{}'", self.id)))
	}
}
