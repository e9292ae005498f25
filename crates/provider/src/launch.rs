//! Application process launch.

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::config::BrowserConfig;
use crate::error::{EpError, Result};
use crate::ports::PortTriple;

/// Fully built launch command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
	pub program: String,
	pub args: Vec<String>,
}

/// Debugger flags bound to the session's port triple.
pub fn debugger_flags(ports: &PortTriple) -> [String; 2] {
	[
		format!("--inspect-brk={}", ports.debug),
		format!("--remote-debugging-port={}", ports.remote_debug),
	]
}

/// Builds the command line for `config` with debugger ports bound.
///
/// macOS application bundles go through `open`; everything else invokes the
/// application path directly.
pub fn build_command(config: &BrowserConfig, ports: &PortTriple) -> LaunchCommand {
	let mut args: Vec<String> = debugger_flags(ports).into();
	args.extend(config.extra_args.iter().cloned());

	if cfg!(target_os = "macos") && is_app_bundle(&config.app_path) {
		return wrap_bundle(&config.app_path, args);
	}

	LaunchCommand {
		program: config.app_path.display().to_string(),
		args,
	}
}

fn is_app_bundle(path: &Path) -> bool {
	path.extension().is_some_and(|ext| ext == "app")
}

/// Wraps a bundle launch as `open -nW -a <bundle> --args <args…>`:
/// new instance, wait for it, pass the arguments through.
fn wrap_bundle(bundle: &Path, args: Vec<String>) -> LaunchCommand {
	let mut open_args = vec!["-nW".to_string(), "-a".to_string(), bundle.display().to_string(), "--args".to_string()];
	open_args.extend(args);

	LaunchCommand {
		program: "open".to_string(),
		args: open_args,
	}
}

/// Spawns the application process for a session.
///
/// Fire-and-forget: implementations return as soon as the process exists and
/// never report its exit. Liveness is unknown until the first successful
/// control-channel round trip.
pub trait Launcher: Send + Sync {
	fn launch(&self, config: &BrowserConfig, ports: &PortTriple) -> Result<()>;
}

/// Production launcher over [`tokio::process::Command`].
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
	fn launch(&self, config: &BrowserConfig, ports: &PortTriple) -> Result<()> {
		let command = build_command(config, ports);
		debug!(
			target = "ep.launch",
			program = %command.program,
			args = ?command.args,
			"spawning application process"
		);

		let mut child = Command::new(&command.program)
			.args(&command.args)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.spawn()
			.map_err(|e| EpError::Launch(format!("failed to spawn {}: {}", command.program, e)))?;

		if let Some(stdout) = child.stdout.take() {
			tokio::spawn(forward_lines(stdout, "stdout"));
		}
		if let Some(stderr) = child.stderr.take() {
			tokio::spawn(forward_lines(stderr, "stderr"));
		}

		// Reap the child when it exits; the exit status is nobody's business.
		tokio::spawn(async move {
			let _ = child.wait().await;
		});

		Ok(())
	}
}

async fn forward_lines<R: AsyncRead + Unpin>(reader: R, stream: &'static str) {
	let mut lines = BufReader::new(reader).lines();
	while let Ok(Some(line)) = lines.next_line().await {
		debug!(target = "ep.launch", stream, "{}", line);
	}
}
