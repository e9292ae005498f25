//! Readiness handshake status reported by the control channel.

use serde::{Deserialize, Serialize};

/// Result of the bootstrap injection as observed inside the target process.
///
/// `completed` is `true` once the expected main window URL has loaded.
/// When it is `false`, `opened_urls` lists the URLs that were actually
/// opened, so the orchestrator can surface them in its readiness error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectingStatus {
	/// Whether the expected main window URL was reached and loaded.
	pub completed: bool,
	/// URLs opened by the target process so far. Empty when `completed`.
	#[serde(default)]
	pub opened_urls: Vec<String>,
}

impl InjectingStatus {
	/// Status for a fully loaded main window.
	pub fn completed() -> Self {
		Self {
			completed: true,
			opened_urls: Vec::new(),
		}
	}

	/// Status for a main window that never loaded, with the URLs seen instead.
	pub fn incomplete(opened_urls: Vec<String>) -> Self {
		Self {
			completed: false,
			opened_urls,
		}
	}
}
