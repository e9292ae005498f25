//! Bootstrap injection over the debugger port.
//!
//! The connection is used exactly once, early in the open sequence, to
//! evaluate the bootstrap script inside the freshly spawned process.

mod cdp;

use async_trait::async_trait;
pub use cdp::CdpInspector;

use crate::error::Result;

/// One open connection to the debugger endpoint.
#[async_trait]
pub trait InspectorConnection: Send {
	/// Evaluates `source` as a single script in the target's main context.
	async fn evaluate(&mut self, source: &str) -> Result<()>;
	/// Releases the connection. Safe to call after a failed evaluation.
	async fn dispose(&mut self) -> Result<()>;
}

/// Opens inspector connections to a local debugger port.
#[async_trait]
pub trait InspectorConnector: Send + Sync {
	async fn connect(&self, port: u16) -> Result<Box<dyn InspectorConnection>>;
}

/// Scoped injection: connect, evaluate, dispose on every exit path.
///
/// The connection never leaks; an evaluation failure is propagated after
/// disposal has run.
pub async fn inject(connector: &dyn InspectorConnector, port: u16, source: &str) -> Result<()> {
	let mut connection = connector.connect(port).await?;
	let evaluated = connection.evaluate(source).await;
	let disposed = connection.dispose().await;
	evaluated?;
	disposed
}
