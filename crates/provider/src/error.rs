use thiserror::Error;

pub type Result<T> = std::result::Result<T, EpError>;

#[derive(Debug, Error)]
pub enum EpError {
	#[error("configuration resolution failed: {0}")]
	Config(String),

	#[error("port allocation failed: {0}")]
	PortAllocation(String),

	#[error("application launch failed: {0}")]
	Launch(String),

	#[error("bootstrap injection failed: {0}")]
	Injection(String),

	#[error("the main window page at {expected_url} was not loaded; opened pages: {}", format_opened_urls(.opened_urls))]
	Readiness {
		expected_url: String,
		opened_urls: Vec<String>,
	},

	#[error("no session is registered for browser id '{id}'")]
	SessionNotFound { id: String },

	#[error("a session is already open for browser id '{id}'")]
	SessionExists { id: String },

	#[error("control channel error: {0}")]
	Control(String),

	#[error("automation client error: {0}")]
	Automation(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

fn format_opened_urls(urls: &[String]) -> String {
	if urls.is_empty() { "<none>".to_string() } else { urls.join(", ") }
}

impl EpError {
	/// Lookup failure for `id`, used by registry accessors.
	pub fn session_not_found(id: impl Into<String>) -> Self {
		EpError::SessionNotFound { id: id.into() }
	}

	/// Duplicate-open failure for `id`.
	pub fn session_exists(id: impl Into<String>) -> Self {
		EpError::SessionExists { id: id.into() }
	}
}
