//! Recording fakes for the provider's collaborator seams.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use ep::automation::{AutomationClient, AutomationConnector, ProtocolClient};
use ep::config::BrowserConfig;
use ep::control::{ControlChannel, ControlChannelFactory, InjectingStatus};
use ep::error::{EpError, Result};
use ep::inspector::{InspectorConnection, InspectorConnector};
use ep::launch::Launcher;
use ep::ports::{PortAllocator, PortTriple};
use ep::{ElectronBrowserProvider, ProviderOptions};
use parking_lot::Mutex;
use serde_json::Value;

/// Control channel that logs every call and replays a scripted status.
pub struct FakeChannel {
	pub calls: Mutex<Vec<String>>,
	pub status: InjectingStatus,
	pub invoke_error: Option<String>,
}

impl FakeChannel {
	pub fn call_count(&self, name: &str) -> usize {
		self.calls.lock().iter().filter(|c| c.as_str() == name).count()
	}

	pub fn call_position(&self, name: &str) -> Option<usize> {
		self.calls.lock().iter().position(|c| c == name)
	}
}

#[async_trait]
impl ControlChannel for FakeChannel {
	async fn start(&self) -> Result<()> {
		self.calls.lock().push("start".into());
		Ok(())
	}

	async fn connect(&self) -> Result<()> {
		self.calls.lock().push("connect".into());
		Ok(())
	}

	async fn injecting_status(&self) -> Result<InjectingStatus> {
		self.calls.lock().push("getInjectingStatus".into());
		Ok(self.status.clone())
	}

	async fn terminate_process(&self) -> Result<()> {
		self.calls.lock().push("terminateProcess".into());
		Ok(())
	}

	async fn stop(&self) -> Result<()> {
		self.calls.lock().push("stop".into());
		Ok(())
	}

	async fn invoke(&self, method: &str, _params: Value) -> Result<Value> {
		self.calls.lock().push(method.to_string());
		match &self.invoke_error {
			Some(message) => Err(EpError::Control(message.clone())),
			None => Ok(Value::Null),
		}
	}
}

/// Factory handing out one [`FakeChannel`] per bind.
pub struct FakeControlFactory {
	pub channels: Mutex<Vec<Arc<FakeChannel>>>,
	pub status: InjectingStatus,
	pub invoke_error: Option<String>,
}

impl FakeControlFactory {
	pub fn completed() -> Self {
		Self {
			channels: Mutex::new(Vec::new()),
			status: InjectingStatus::completed(),
			invoke_error: None,
		}
	}

	pub fn incomplete(opened_urls: Vec<String>) -> Self {
		Self {
			channels: Mutex::new(Vec::new()),
			status: InjectingStatus::incomplete(opened_urls),
			invoke_error: None,
		}
	}

	pub fn channel(&self, index: usize) -> Arc<FakeChannel> {
		self.channels.lock()[index].clone()
	}

	pub fn bind_count(&self) -> usize {
		self.channels.lock().len()
	}
}

#[async_trait]
impl ControlChannelFactory for FakeControlFactory {
	async fn bind(&self, _config: &BrowserConfig) -> Result<Arc<dyn ControlChannel>> {
		let channel = Arc::new(FakeChannel {
			calls: Mutex::new(Vec::new()),
			status: self.status.clone(),
			invoke_error: self.invoke_error.clone(),
		});
		self.channels.lock().push(channel.clone());
		Ok(channel)
	}
}

/// Allocator replaying a fixed port list.
pub struct FixedPorts(pub Vec<u16>);

#[async_trait]
impl PortAllocator for FixedPorts {
	async fn allocate(&self, count: usize) -> Result<Vec<u16>> {
		assert_eq!(count, self.0.len());
		Ok(self.0.clone())
	}
}

/// Launcher recording what it was asked to spawn.
#[derive(Default)]
pub struct FakeLauncher {
	pub launches: Mutex<Vec<(String, PortTriple)>>,
}

impl Launcher for FakeLauncher {
	fn launch(&self, config: &BrowserConfig, ports: &PortTriple) -> Result<()> {
		self.launches.lock().push((config.browser_id.clone(), *ports));
		Ok(())
	}
}

/// Inspector connector recording injections, optionally failing evaluation.
#[derive(Default)]
pub struct FakeInspector {
	pub injected: Arc<Mutex<Vec<(u16, String)>>>,
	pub fail_evaluate: bool,
}

#[async_trait]
impl InspectorConnector for FakeInspector {
	async fn connect(&self, port: u16) -> Result<Box<dyn InspectorConnection>> {
		Ok(Box::new(FakeInspectorConnection {
			port,
			injected: self.injected.clone(),
			fail_evaluate: self.fail_evaluate,
		}))
	}
}

pub struct FakeInspectorConnection {
	port: u16,
	injected: Arc<Mutex<Vec<(u16, String)>>>,
	fail_evaluate: bool,
}

#[async_trait]
impl InspectorConnection for FakeInspectorConnection {
	async fn evaluate(&mut self, source: &str) -> Result<()> {
		if self.fail_evaluate {
			return Err(EpError::Injection("evaluation failed in target".into()));
		}
		self.injected.lock().push((self.port, source.to_string()));
		Ok(())
	}

	async fn dispose(&mut self) -> Result<()> {
		Ok(())
	}
}

/// Protocol client recording navigations and dispatches with timestamps.
#[derive(Default)]
pub struct FakeProtocolClient {
	pub navigated: Mutex<Vec<String>>,
	pub dispatched: Mutex<Vec<(Instant, ep::protocol::InputEvent)>>,
	pub fail_from: Option<usize>,
}

#[async_trait]
impl ProtocolClient for FakeProtocolClient {
	async fn navigate(&self, url: &str) -> Result<()> {
		self.navigated.lock().push(url.to_string());
		Ok(())
	}

	async fn dispatch_input_event(&self, event: &ep::protocol::InputEvent) -> Result<()> {
		let mut dispatched = self.dispatched.lock();
		if self.fail_from.is_some_and(|limit| dispatched.len() >= limit) {
			return Err(EpError::Automation("event dropped by target".into()));
		}
		dispatched.push((Instant::now(), event.clone()));
		Ok(())
	}

	async fn prepare(&self, _options: &ep::protocol::NativeAutomationOptions) -> Result<()> {
		Ok(())
	}
}

/// Automation client whose low-level client only exists after `init`.
pub struct FakeAutomationClient {
	pub initialized: AtomicBool,
	pub fail_init: bool,
	pub client: Arc<FakeProtocolClient>,
}

#[async_trait]
impl AutomationClient for FakeAutomationClient {
	async fn init(&self) -> Result<()> {
		if self.fail_init {
			return Err(EpError::Automation("remote debugging endpoint refused".into()));
		}
		self.initialized.store(true, Ordering::Relaxed);
		Ok(())
	}

	fn active_client(&self) -> Result<Arc<dyn ProtocolClient>> {
		if self.initialized.load(Ordering::Relaxed) {
			Ok(self.client.clone())
		} else {
			Err(EpError::Automation("automation client is not initialized".into()))
		}
	}
}

/// Connector recording attached ports and sharing one protocol client.
pub struct FakeAutomation {
	pub attached_ports: Mutex<Vec<u16>>,
	pub fail_init: bool,
	pub client: Arc<FakeProtocolClient>,
	pub clients: Mutex<Vec<Arc<FakeAutomationClient>>>,
}

impl FakeAutomation {
	pub fn new() -> Self {
		Self::with_client(Arc::new(FakeProtocolClient::default()))
	}

	pub fn with_client(client: Arc<FakeProtocolClient>) -> Self {
		Self {
			attached_ports: Mutex::new(Vec::new()),
			fail_init: false,
			client,
			clients: Mutex::new(Vec::new()),
		}
	}

	pub fn failing_init() -> Self {
		Self {
			fail_init: true,
			..Self::new()
		}
	}
}

#[async_trait]
impl AutomationConnector for FakeAutomation {
	async fn attach(&self, remote_debug_port: u16) -> Result<Arc<dyn AutomationClient>> {
		self.attached_ports.lock().push(remote_debug_port);
		let client = Arc::new(FakeAutomationClient {
			initialized: AtomicBool::new(false),
			fail_init: self.fail_init,
			client: self.client.clone(),
		});
		self.clients.lock().push(client.clone());
		Ok(client)
	}
}

/// One fully wired test harness around the provider.
pub struct Harness {
	pub provider: ElectronBrowserProvider,
	pub control: Arc<FakeControlFactory>,
	pub launcher: Arc<FakeLauncher>,
	pub injected: Arc<Mutex<Vec<(u16, String)>>>,
	pub automation: Arc<FakeAutomation>,
}

impl Harness {
	pub fn new(control: FakeControlFactory) -> Self {
		Self::build(control, FakeInspector::default(), FakeAutomation::new())
	}

	pub fn build(control: FakeControlFactory, inspector: FakeInspector, automation: FakeAutomation) -> Self {
		let control = Arc::new(control);
		let launcher = Arc::new(FakeLauncher::default());
		let injected = inspector.injected.clone();
		let automation = Arc::new(automation);

		let provider = ElectronBrowserProvider::with_options(ProviderOptions {
			ports: Arc::new(FixedPorts(vec![5000, 5001, 5002])),
			launcher: launcher.clone(),
			inspector: Arc::new(inspector),
			control: control.clone(),
			automation: automation.clone(),
			..ProviderOptions::default()
		});

		Self {
			provider,
			control,
			launcher,
			injected,
			automation,
		}
	}
}
