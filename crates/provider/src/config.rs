//! Browser configuration resolution.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EpError, Result};

/// Resolved per-session configuration.
///
/// Produced once per `open_browser` call by a [`ConfigResolver`] and carried
/// unchanged inside the session record afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowserConfig {
	/// Caller-supplied browser connection id this config was resolved for.
	pub browser_id: String,
	/// Absolute path the caller's main path resolved to.
	pub main_path: PathBuf,
	/// Executable to spawn, or an application bundle directory on macOS.
	pub app_path: PathBuf,
	/// Arguments appended after the debugger flags.
	pub extra_args: Vec<String>,
	/// Expected main window URL. When absent, the page URL passed to
	/// `open_browser` is the expected URL.
	pub main_window_url: Option<String>,
}

impl BrowserConfig {
	/// URL the readiness gate checks against, given the requested page URL.
	pub fn expected_main_url(&self, page_url: &str) -> String {
		self.main_window_url.clone().unwrap_or_else(|| page_url.to_string())
	}
}

/// Resolves caller input into a [`BrowserConfig`].
///
/// `main_path` has already been resolved against the current working
/// directory by the orchestrator.
pub trait ConfigResolver: Send + Sync {
	fn resolve(&self, id: &str, main_path: &Path) -> Result<BrowserConfig>;
}

/// On-disk configuration accepted next to an application under test.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
	main_window_url: Option<String>,
	electron_path: Option<PathBuf>,
	app_path: Option<PathBuf>,
	#[serde(default)]
	app_args: Vec<String>,
}

/// Default resolver.
///
/// A `.json` main path is read as a [`ConfigFile`]; anything else is treated
/// as the application entry itself and launched through the `electron`
/// binary on `PATH`, except for `.app` bundles which launch directly.
pub struct JsonConfigResolver;

impl ConfigResolver for JsonConfigResolver {
	fn resolve(&self, id: &str, main_path: &Path) -> Result<BrowserConfig> {
		if main_path.extension().is_some_and(|ext| ext == "json") {
			return resolve_from_file(id, main_path);
		}

		if main_path.extension().is_some_and(|ext| ext == "app") {
			return Ok(BrowserConfig {
				browser_id: id.to_string(),
				main_path: main_path.to_path_buf(),
				app_path: main_path.to_path_buf(),
				extra_args: Vec::new(),
				main_window_url: None,
			});
		}

		Ok(BrowserConfig {
			browser_id: id.to_string(),
			main_path: main_path.to_path_buf(),
			app_path: PathBuf::from("electron"),
			extra_args: vec![main_path.display().to_string()],
			main_window_url: None,
		})
	}
}

fn resolve_from_file(id: &str, config_path: &Path) -> Result<BrowserConfig> {
	let text = fs::read_to_string(config_path)
		.map_err(|e| EpError::Config(format!("failed to read {}: {}", config_path.display(), e)))?;
	let file: ConfigFile = serde_json::from_str(&text)
		.map_err(|e| EpError::Config(format!("failed to parse {}: {}", config_path.display(), e)))?;

	let base = config_path.parent().unwrap_or_else(|| Path::new("."));
	let app_path = match file.electron_path {
		Some(path) => resolve_relative(base, path),
		None => PathBuf::from("electron"),
	};

	let mut extra_args = Vec::new();
	if let Some(entry) = file.app_path {
		extra_args.push(resolve_relative(base, entry).display().to_string());
	}
	extra_args.extend(file.app_args);

	Ok(BrowserConfig {
		browser_id: id.to_string(),
		main_path: config_path.to_path_buf(),
		app_path,
		extra_args,
		main_window_url: file.main_window_url,
	})
}

fn resolve_relative(base: &Path, path: PathBuf) -> PathBuf {
	if path.is_absolute() { path } else { base.join(path) }
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn json_config_resolves_paths_against_its_own_directory() {
		let temp = TempDir::new().unwrap();
		let config_path = temp.path().join("app.json");
		fs::write(
			&config_path,
			r#"{
  "mainWindowUrl": "http://localhost:3000/main",
  "electronPath": "node_modules/.bin/electron",
  "appPath": "src/main.js",
  "appArgs": ["--dev"]
}"#,
		)
		.unwrap();

		let config = JsonConfigResolver.resolve("b1", &config_path).unwrap();
		assert_eq!(config.browser_id, "b1");
		assert_eq!(config.app_path, temp.path().join("node_modules/.bin/electron"));
		assert_eq!(config.extra_args[0], temp.path().join("src/main.js").display().to_string());
		assert_eq!(config.extra_args[1], "--dev");
		assert_eq!(config.main_window_url.as_deref(), Some("http://localhost:3000/main"));
	}

	#[test]
	fn entry_path_launches_through_electron_on_path() {
		let config = JsonConfigResolver.resolve("b1", Path::new("/proj/main.js")).unwrap();
		assert_eq!(config.app_path, PathBuf::from("electron"));
		assert_eq!(config.extra_args, vec!["/proj/main.js".to_string()]);
		assert!(config.main_window_url.is_none());
	}

	#[test]
	fn app_bundle_is_its_own_launch_target() {
		let config = JsonConfigResolver.resolve("b1", Path::new("/Applications/Demo.app")).unwrap();
		assert_eq!(config.app_path, PathBuf::from("/Applications/Demo.app"));
		assert!(config.extra_args.is_empty());
	}

	#[test]
	fn expected_main_url_falls_back_to_page_url() {
		let config = JsonConfigResolver.resolve("b1", Path::new("/proj/main.js")).unwrap();
		assert_eq!(config.expected_main_url("http://x/page"), "http://x/page");

		let with_override = BrowserConfig {
			main_window_url: Some("http://localhost:3000/main".into()),
			..config
		};
		assert_eq!(with_override.expected_main_url("http://x/page"), "http://localhost:3000/main");
	}

	#[test]
	fn unreadable_config_file_is_a_config_error() {
		let err = JsonConfigResolver.resolve("b1", Path::new("/definitely/missing.json")).unwrap_err();
		assert!(matches!(err, EpError::Config(_)));
	}
}
