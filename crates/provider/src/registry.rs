//! In-memory session registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{EpError, Result};
use crate::session::SessionRecord;

/// Owned mapping from session id to live session record.
///
/// Held by the provider, never a global. Every operation is a single-step
/// critical section, so inserts and removals are atomic with respect to the
/// cooperative scheduler.
#[derive(Default)]
pub struct SessionRegistry {
	sessions: Mutex<HashMap<String, Arc<SessionRecord>>>,
}

impl SessionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts a record, rejecting duplicate ids.
	pub fn insert(&self, record: Arc<SessionRecord>) -> Result<()> {
		let mut sessions = self.sessions.lock();
		if sessions.contains_key(record.id()) {
			return Err(EpError::session_exists(record.id()));
		}
		sessions.insert(record.id().to_string(), record);
		Ok(())
	}

	/// Resolves a record by id.
	pub fn get(&self, id: &str) -> Result<Arc<SessionRecord>> {
		self.sessions.lock().get(id).cloned().ok_or_else(|| EpError::session_not_found(id))
	}

	/// Removes and returns a record.
	pub fn remove(&self, id: &str) -> Result<Arc<SessionRecord>> {
		self.sessions.lock().remove(id).ok_or_else(|| EpError::session_not_found(id))
	}

	pub fn contains(&self, id: &str) -> bool {
		self.sessions.lock().contains_key(id)
	}

	/// Ids of all currently open sessions.
	pub fn ids(&self) -> Vec<String> {
		self.sessions.lock().keys().cloned().collect()
	}
}
