//! engine::ledger
//!
//! The operation ledger: the persisted history of push attempts.
//!
//! # Lifecycle
//!
//! ```text
//! begin() -> started -> complete() -> completed
//!                    \-> fail()     -> failed
//! ```
//!
//! Each entry reaches a terminal status exactly once. The in-memory entry
//! is only changed after the store accepted the write, so a failed write
//! leaves the caller's copy consistent with what is persisted.
//!
//! # Example
//!
//! ```
//! use repomirror::core::records::{MemoryStore, RecordStore};
//! use repomirror::core::types::{OperationStatus, PushType, RecordId};
//! use repomirror::engine::ledger::Ledger;
//!
//! let store = MemoryStore::new();
//! let ledger = Ledger::new(&store);
//!
//! let src = RecordId::new("src").unwrap();
//! let dst = RecordId::new("dst").unwrap();
//! let mut entry = ledger.begin(src, dst, PushType::Regular).unwrap();
//! ledger.complete(&mut entry, "abc123").unwrap();
//!
//! let stored = store.get_operation(&entry.id).unwrap().unwrap();
//! assert_eq!(stored.status, OperationStatus::Completed);
//! ```

use crate::core::records::{OperationLogEntry, RecordError, RecordStore};
use crate::core::types::{PushType, RecordId};

/// Operation log access over a record store.
pub struct Ledger<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> Ledger<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Insert a new `started` push entry.
    pub fn begin(
        &self,
        source_repo_id: RecordId,
        target_repo_id: RecordId,
        push_type: PushType,
    ) -> Result<OperationLogEntry, RecordError> {
        let entry = OperationLogEntry::start(source_repo_id, target_repo_id, push_type);
        self.store.insert_operation(&entry)?;
        Ok(entry)
    }

    /// Mark an entry `completed`.
    pub fn complete(
        &self,
        entry: &mut OperationLogEntry,
        commit_hash: &str,
    ) -> Result<(), RecordError> {
        let mut next = entry.clone();
        next.complete(commit_hash)?;
        self.store.update_operation(&next)?;
        *entry = next;
        Ok(())
    }

    /// Mark an entry `failed`.
    pub fn fail(&self, entry: &mut OperationLogEntry, message: &str) -> Result<(), RecordError> {
        let mut next = entry.clone();
        next.fail(message)?;
        self.store.update_operation(&next)?;
        *entry = next;
        Ok(())
    }

    /// Recent entries, newest first.
    pub fn history(&self, limit: Option<usize>) -> Result<Vec<OperationLogEntry>, RecordError> {
        let mut entries = self.store.list_operations()?;
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }
}
