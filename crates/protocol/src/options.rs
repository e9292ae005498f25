//! Option structs accepted by the provider surface.

use serde::{Deserialize, Serialize};

/// Options for `openBrowser`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOptions {
	/// When present, a native-automation sub-session is created and
	/// initialized with these options after the session is registered.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub native_automation: Option<NativeAutomationOptions>,
}

impl OpenOptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Requests native-automation support for the session.
	pub fn native_automation(mut self, options: NativeAutomationOptions) -> Self {
		self.native_automation = Some(options);
		self
	}
}

/// Initialization options forwarded verbatim to the low-level protocol
/// client when the native-automation sub-session starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeAutomationOptions {
	#[serde(flatten)]
	pub init: serde_json::Map<String, serde_json::Value>,
}

impl NativeAutomationOptions {
	pub fn new() -> Self {
		Self::default()
	}
}
