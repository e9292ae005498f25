//! Free-port acquisition for session launch.

use async_trait::async_trait;
use tokio::net::TcpListener;

use crate::error::{EpError, Result};

/// Number of ports every session needs: IPC, debugger, remote debugging.
pub const SESSION_PORT_COUNT: usize = 3;

/// The three ports of one session, in their positional roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortTriple {
	/// Private control-channel port.
	pub ipc: u16,
	/// Debugger port the bootstrap script is injected over.
	pub debug: u16,
	/// Remote-debugging port the automation client attaches to.
	pub remote_debug: u16,
}

impl PortTriple {
	/// Validates an allocator result and fixes the positional meaning
	/// `[ipc, debug, remote_debug]`.
	pub fn from_allocated(ports: &[u16]) -> Result<Self> {
		let [ipc, debug, remote_debug]: [u16; SESSION_PORT_COUNT] = ports
			.try_into()
			.map_err(|_| EpError::PortAllocation(format!("expected {} ports, got {}", SESSION_PORT_COUNT, ports.len())))?;

		if ipc == debug || ipc == remote_debug || debug == remote_debug {
			return Err(EpError::PortAllocation(format!(
				"allocated ports are not pairwise distinct: {}, {}, {}",
				ipc, debug, remote_debug
			)));
		}

		Ok(Self { ipc, debug, remote_debug })
	}
}

/// Supplies mutually distinct free ports.
#[async_trait]
pub trait PortAllocator: Send + Sync {
	async fn allocate(&self, count: usize) -> Result<Vec<u16>>;
}

/// Allocator backed by the OS: binds `127.0.0.1:0` and keeps every listener
/// alive until the full set is acquired, so no port is handed out twice.
pub struct TcpPortAllocator;

#[async_trait]
impl PortAllocator for TcpPortAllocator {
	async fn allocate(&self, count: usize) -> Result<Vec<u16>> {
		let mut listeners = Vec::with_capacity(count);
		for _ in 0..count {
			let listener = TcpListener::bind(("127.0.0.1", 0))
				.await
				.map_err(|e| EpError::PortAllocation(e.to_string()))?;
			let port = listener.local_addr().map_err(|e| EpError::PortAllocation(e.to_string()))?.port();
			listeners.push((port, listener));
		}

		Ok(listeners.into_iter().map(|(port, _)| port).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn allocated_ports_are_pairwise_distinct() {
		let ports = TcpPortAllocator.allocate(SESSION_PORT_COUNT).await.unwrap();
		let triple = PortTriple::from_allocated(&ports).unwrap();
		assert_eq!(triple.ipc, ports[0]);
		assert_eq!(triple.debug, ports[1]);
		assert_eq!(triple.remote_debug, ports[2]);
	}

	#[test]
	fn triple_rejects_duplicates() {
		let err = PortTriple::from_allocated(&[4000, 4001, 4000]).unwrap_err();
		assert!(matches!(err, EpError::PortAllocation(_)));
	}

	#[test]
	fn triple_rejects_wrong_count() {
		let err = PortTriple::from_allocated(&[4000, 4001]).unwrap_err();
		assert!(err.to_string().contains("expected 3 ports"));
	}
}
