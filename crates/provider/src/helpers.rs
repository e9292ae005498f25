//! Menu and dialog helper RPCs forwarded over the control channel.

use std::sync::Arc;

use ep_protocol::{DialogHandler, MenuItem};
use serde_json::{Value, json};

use crate::control::ControlChannel;
use crate::error::{EpError, Result};

/// Typed forwarding surface bound to one session's control channel.
///
/// Every call relays unchanged to code inside the target process; all side
/// effects (menu clicks, dialog registration) happen there.
#[derive(Clone)]
pub struct HelperForwarder {
	channel: Arc<dyn ControlChannel>,
}

impl HelperForwarder {
	pub fn new(channel: Arc<dyn ControlChannel>) -> Self {
		Self { channel }
	}

	pub async fn main_menu_items(&self) -> Result<Vec<MenuItem>> {
		self.request("getMainMenuItems", json!({})).await
	}

	pub async fn context_menu_items(&self) -> Result<Vec<MenuItem>> {
		self.request("getContextMenuItems", json!({})).await
	}

	pub async fn main_menu_item(&self, path: &[&str]) -> Result<MenuItem> {
		self.request("getMainMenuItem", json!({ "path": path })).await
	}

	pub async fn context_menu_item(&self, path: &[&str]) -> Result<MenuItem> {
		self.request("getContextMenuItem", json!({ "path": path })).await
	}

	pub async fn click_main_menu_item(&self, path: &[&str]) -> Result<()> {
		self.channel.invoke("clickOnMainMenuItem", json!({ "path": path })).await.map(|_| ())
	}

	pub async fn click_context_menu_item(&self, path: &[&str]) -> Result<()> {
		self.channel.invoke("clickOnContextMenuItem", json!({ "path": path })).await.map(|_| ())
	}

	pub async fn set_dialog_handler(&self, handler: &DialogHandler) -> Result<()> {
		self.channel
			.invoke("setElectronDialogHandler", serde_json::to_value(handler)?)
			.await
			.map(|_| ())
	}

	async fn request<T: serde::de::DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
		let value = self.channel.invoke(method, params).await?;
		serde_json::from_value(value).map_err(|e| EpError::Control(format!("malformed '{}' response: {}", method, e)))
	}
}
