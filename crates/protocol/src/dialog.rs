//! Dialog handler registration payload.

use serde::{Deserialize, Serialize};

/// Handler installed inside the target process for native dialogs.
///
/// The handler travels as JavaScript source text; the control channel
/// evaluates it in the main process and invokes it for every dialog call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogHandler {
	/// Handler function source text.
	pub handler: String,
	/// Optional value made available to the handler as its context argument.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub context: Option<serde_json::Value>,
}

impl DialogHandler {
	/// Handler without a context value.
	pub fn new(handler: impl Into<String>) -> Self {
		Self {
			handler: handler.into(),
			context: None,
		}
	}

	/// Sets the context value passed through to the handler.
	pub fn with_context(mut self, context: serde_json::Value) -> Self {
		self.context = Some(context);
		self
	}
}
