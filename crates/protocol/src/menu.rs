//! Menu item shapes returned by the in-process helper RPCs.

use serde::{Deserialize, Serialize};

/// One item of the application's main or context menu.
///
/// Returned by the `getMainMenuItems`/`getContextMenuItems` helper RPCs.
/// Submenus nest recursively through `items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
	/// Visible label, used to address the item in click RPCs.
	pub label: String,
	/// Whether the item currently accepts clicks.
	#[serde(default = "default_enabled")]
	pub enabled: bool,
	/// Checkbox/radio state, absent for plain items.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub checked: Option<bool>,
	/// Nested submenu items.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub items: Vec<MenuItem>,
}

fn default_enabled() -> bool {
	true
}

impl MenuItem {
	/// Plain enabled item with no submenu.
	pub fn new(label: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			enabled: true,
			checked: None,
			items: Vec::new(),
		}
	}
}
