//! Session orchestration and the provider surface.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ep_protocol::{DialogHandler, InputEvent, MenuItem, NativeAutomationOptions, OpenOptions, SequenceItem};
use tracing::debug;

use crate::automation::{AutomationConnector, CdpConnector};
use crate::bootstrap::{BootstrapScript, HookScript};
use crate::config::{BrowserConfig, ConfigResolver, JsonConfigResolver};
use crate::control::{ControlChannel, ControlChannelFactory, IpcFactory};
use crate::error::{EpError, Result};
use crate::inspector::{self, CdpInspector, InspectorConnector};
use crate::launch::{Launcher, ProcessLauncher};
use crate::native::{self, NativeAutomationSession};
use crate::ports::{PortAllocator, PortTriple, SESSION_PORT_COUNT, TcpPortAllocator};
use crate::registry::SessionRegistry;
use crate::session::SessionRecord;

/// Collaborators the provider orchestrates.
///
/// Production wiring comes from [`ProviderOptions::default`]; tests swap in
/// recording fakes.
pub struct ProviderOptions {
	pub config_resolver: Arc<dyn ConfigResolver>,
	pub ports: Arc<dyn PortAllocator>,
	pub launcher: Arc<dyn Launcher>,
	pub inspector: Arc<dyn InspectorConnector>,
	pub control: Arc<dyn ControlChannelFactory>,
	pub automation: Arc<dyn AutomationConnector>,
	pub bootstrap: Arc<dyn BootstrapScript>,
}

impl Default for ProviderOptions {
	fn default() -> Self {
		Self {
			config_resolver: Arc::new(JsonConfigResolver),
			ports: Arc::new(TcpPortAllocator),
			launcher: Arc::new(ProcessLauncher),
			inspector: Arc::new(CdpInspector),
			control: Arc::new(IpcFactory),
			automation: Arc::new(CdpConnector),
			bootstrap: Arc::new(HookScript),
		}
	}
}

/// Browser provider driving Electron-style applications for a test runner.
///
/// One provider owns the registry of every session it has opened. Sessions
/// with distinct ids are fully independent; callers serialize open calls
/// per id.
pub struct ElectronBrowserProvider {
	registry: SessionRegistry,
	options: ProviderOptions,
}

impl Default for ElectronBrowserProvider {
	fn default() -> Self {
		Self::new()
	}
}

impl ElectronBrowserProvider {
	/// Provider with production collaborators.
	pub fn new() -> Self {
		Self::with_options(ProviderOptions::default())
	}

	/// Provider with explicit collaborators.
	pub fn with_options(options: ProviderOptions) -> Self {
		Self {
			registry: SessionRegistry::new(),
			options,
		}
	}

	/// Read access to the session registry.
	pub fn registry(&self) -> &SessionRegistry {
		&self.registry
	}

	/// Opens a session for `id` and registers it once it is ready.
	///
	/// On any failure no registry entry remains for `id`; the control
	/// channel is rolled back as far as the failure point allows.
	pub async fn open_browser(&self, id: &str, page_url: &str, main_path: &Path, options: OpenOptions) -> Result<()> {
		if self.registry.contains(id) {
			return Err(EpError::session_exists(id));
		}

		let main_path = resolve_main_path(main_path)?;
		let config = self.options.config_resolver.resolve(id, &main_path)?;

		let channel = self.options.control.bind(&config).await?;
		channel.start().await?;

		let ports = match self.open_until_ready(&config, &channel, page_url).await {
			Ok(ports) => ports,
			Err(err) => {
				// Once the readiness gate failed (or the handshake broke),
				// terminate what can still be reached, then stop the server.
				if matches!(err, EpError::Readiness { .. } | EpError::Control(_)) {
					let _ = channel.terminate_process().await;
				}
				let _ = channel.stop().await;
				return Err(err);
			}
		};

		let record = Arc::new(SessionRecord::new(id, config, ports, channel));
		self.registry.insert(record.clone())?;

		if let Err(err) = self.attach_automation(&record, options.native_automation).await {
			self.rollback_registered(&record).await;
			return Err(err);
		}

		debug!(target = "ep.session", id, port = ports.remote_debug, "session ready");
		Ok(())
	}

	/// Ports, launch, injection, and the readiness handshake.
	async fn open_until_ready(&self, config: &BrowserConfig, channel: &Arc<dyn ControlChannel>, page_url: &str) -> Result<PortTriple> {
		let ports = PortTriple::from_allocated(&self.options.ports.allocate(SESSION_PORT_COUNT).await?)?;
		self.options.launcher.launch(config, &ports)?;

		let script = self.options.bootstrap.generate(config, page_url)?;
		inspector::inject(self.options.inspector.as_ref(), ports.debug, &script).await?;

		channel.connect().await?;
		let status = channel.injecting_status().await?;
		if !status.completed {
			return Err(EpError::Readiness {
				expected_url: config.expected_main_url(page_url),
				opened_urls: status.opened_urls,
			});
		}

		Ok(ports)
	}

	/// Attaches the automation client, then the optional native-automation
	/// sub-session.
	async fn attach_automation(&self, record: &Arc<SessionRecord>, native: Option<NativeAutomationOptions>) -> Result<()> {
		let client = self.options.automation.attach(record.ports().remote_debug).await?;
		client.init().await?;
		record.set_automation(client.clone());

		if let Some(options) = native {
			let low_level = client.active_client()?;
			let session = NativeAutomationSession::new(record.id(), low_level, options);
			session.init().await?;
			record.attach_native(session);
		}

		Ok(())
	}

	/// Tears down a session that failed after registration.
	async fn rollback_registered(&self, record: &Arc<SessionRecord>) {
		let _ = record.channel().terminate_process().await;
		let _ = record.channel().stop().await;
		let _ = self.registry.remove(record.id());
	}

	/// Closes the session for `id`.
	///
	/// The control server is not stopped until termination is acknowledged,
	/// so the spawned process is never orphaned without a channel able to
	/// signal it.
	pub async fn close_browser(&self, id: &str) -> Result<()> {
		let record = self.registry.get(id)?;

		record.channel().terminate_process().await?;
		record.channel().stop().await?;
		self.registry.remove(id)?;

		debug!(target = "ep.session", id, "session closed");
		Ok(())
	}

	pub fn is_local_browser(&self) -> bool {
		true
	}

	pub fn support_native_automation(&self) -> bool {
		true
	}

	/// Alias list for the host test runner.
	pub fn browser_list(&self) -> Vec<String> {
		vec!["electron".to_string()]
	}

	/// Any alias is accepted; the name carries the config path.
	pub fn is_valid_browser_name(&self, _browser_name: &str) -> bool {
		true
	}

	pub async fn main_menu_items(&self, id: &str) -> Result<Vec<MenuItem>> {
		self.registry.get(id)?.helpers().main_menu_items().await
	}

	pub async fn context_menu_items(&self, id: &str) -> Result<Vec<MenuItem>> {
		self.registry.get(id)?.helpers().context_menu_items().await
	}

	pub async fn main_menu_item(&self, id: &str, path: &[&str]) -> Result<MenuItem> {
		self.registry.get(id)?.helpers().main_menu_item(path).await
	}

	pub async fn context_menu_item(&self, id: &str, path: &[&str]) -> Result<MenuItem> {
		self.registry.get(id)?.helpers().context_menu_item(path).await
	}

	pub async fn click_main_menu_item(&self, id: &str, path: &[&str]) -> Result<()> {
		self.registry.get(id)?.helpers().click_main_menu_item(path).await
	}

	pub async fn click_context_menu_item(&self, id: &str, path: &[&str]) -> Result<()> {
		self.registry.get(id)?.helpers().click_context_menu_item(path).await
	}

	pub async fn set_dialog_handler(&self, id: &str, handler: &DialogHandler) -> Result<()> {
		self.registry.get(id)?.helpers().set_dialog_handler(handler).await
	}

	/// Navigates the session's top-level frame to `url`.
	pub async fn open_file_protocol(&self, id: &str, url: &str) -> Result<()> {
		let client = self.registry.get(id)?.active_protocol_client()?;
		client.navigate(url).await
	}

	/// Dispatches one native input event for `id`.
	pub async fn dispatch_native_automation_event(&self, id: &str, event: &InputEvent) -> Result<()> {
		let client = self.registry.get(id)?.native_client()?;
		native::dispatch_event(client.as_ref(), event).await
	}

	/// Runs an ordered event sequence for `id`.
	pub async fn dispatch_native_automation_event_sequence(&self, id: &str, items: &[SequenceItem]) -> Result<()> {
		let client = self.registry.get(id)?.native_client()?;
		native::dispatch_sequence(client.as_ref(), items).await
	}
}

/// Resolves a possibly relative main path against the current working
/// directory.
fn resolve_main_path(path: &Path) -> Result<PathBuf> {
	if path.is_absolute() {
		Ok(path.to_path_buf())
	} else {
		Ok(std::env::current_dir()?.join(path))
	}
}
