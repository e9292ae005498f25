//! Electron application session orchestration for test automation.
//!
//! The provider spawns a desktop application built on a dual-process
//! browser runtime and drives three independently failing channels into one
//! "browser session" abstraction: the OS process, the debugger port used
//! once for bootstrap injection, and the private control channel used for
//! the readiness handshake and helper RPCs. Once a session passes its
//! readiness gate it is registered and driven over the remote-debugging
//! connection until closed.
//!
//! Entry point: [`ElectronBrowserProvider`].

/// Remote-debugging automation client.
pub mod automation;
/// Bootstrap script generation.
pub mod bootstrap;
/// Configuration resolution.
pub mod config;
/// Private control channel server.
pub mod control;
/// Error taxonomy.
pub mod error;
/// Menu/dialog helper forwarding.
pub mod helpers;
/// Bootstrap injection over the debugger port.
pub mod inspector;
/// Process launch.
pub mod launch;
/// Tracing setup.
pub mod logging;
/// Native-automation sub-sessions.
pub mod native;
/// Port allocation.
pub mod ports;
/// The session orchestrator.
pub mod provider;
/// Session registry.
pub mod registry;
/// Live session records.
pub mod session;

pub use ep_protocol as protocol;
pub use error::{EpError, Result};
pub use provider::{ElectronBrowserProvider, ProviderOptions};
