//! Wire types for the Electron provider.
//!
//! This crate contains the serde-serializable types exchanged between the
//! session orchestrator and its collaborators: the private control channel
//! running inside the spawned application, and the remote-debugging client
//! driving it. These types represent the "protocol layer" - the shapes of
//! data as they appear on the wire.
//!
//! Types in this crate are pure data: no behavior beyond serialization and
//! small constructors. Orchestration semantics live in `ep-provider`.

pub mod dialog;
pub mod events;
pub mod menu;
pub mod options;
pub mod status;

pub use dialog::*;
pub use events::*;
pub use menu::*;
pub use options::*;
pub use status::*;
