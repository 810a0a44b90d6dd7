//! core::records::memory
//!
//! In-memory record store for tests and embedding.
//!
//! # Example
//!
//! ```
//! use repomirror::core::records::{MemoryStore, RecordStore, Repository};
//! use repomirror::core::url::RepoSlug;
//!
//! let store = MemoryStore::new();
//! let repo = Repository::register("https://github.com/alice/demo", &RepoSlug::new("alice", "demo"));
//! store.insert_repository(&repo).unwrap();
//!
//! assert_eq!(store.get_repository(&repo.id).unwrap(), Some(repo));
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::schema::{check_transition, OperationLogEntry, Repository};
use super::store::{newest_first, RecordError, RecordStore};
use crate::core::types::RecordId;

/// In-memory record store.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    repositories: HashMap<RecordId, Repository>,
    operations: HashMap<RecordId, OperationLogEntry>,
    fail_on: Option<FailOn>,
}

/// Which write should fail (for testing error paths).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    InsertRepository,
    UpdateRepository,
    InsertOperation,
    UpdateOperation,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given repositories.
    pub fn with_repositories(repos: impl IntoIterator<Item = Repository>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            for repo in repos {
                inner.repositories.insert(repo.id.clone(), repo);
            }
        }
        store
    }

    /// Configure the store to fail a specific write.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.lock().fail_on = Some(fail_on);
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.lock().fail_on = None;
    }

    fn lock(&self) -> MutexGuard<'_, MemoryStoreInner> {
        // A poisoned lock only means a test panicked mid-write; the maps are
        // still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_fail(inner: &MemoryStoreInner, op: FailOn) -> Result<(), RecordError> {
        if inner.fail_on == Some(op) {
            return Err(RecordError::WriteFailed(format!("injected failure on {:?}", op)));
        }
        Ok(())
    }
}

impl RecordStore for MemoryStore {
    fn get_repository(&self, id: &RecordId) -> Result<Option<Repository>, RecordError> {
        Ok(self.lock().repositories.get(id).cloned())
    }

    fn list_repositories(&self) -> Result<Vec<Repository>, RecordError> {
        let mut repos: Vec<_> = self.lock().repositories.values().cloned().collect();
        repos.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(repos)
    }

    fn insert_repository(&self, repo: &Repository) -> Result<(), RecordError> {
        let mut inner = self.lock();
        Self::check_fail(&inner, FailOn::InsertRepository)?;
        if inner.repositories.contains_key(&repo.id) {
            return Err(RecordError::Duplicate {
                kind: "repository",
                id: repo.id.to_string(),
            });
        }
        inner.repositories.insert(repo.id.clone(), repo.clone());
        Ok(())
    }

    fn update_repository(&self, repo: &Repository) -> Result<(), RecordError> {
        let mut inner = self.lock();
        Self::check_fail(&inner, FailOn::UpdateRepository)?;
        match inner.repositories.get_mut(&repo.id) {
            Some(existing) => {
                *existing = repo.clone();
                Ok(())
            }
            None => Err(RecordError::NotFound {
                kind: "repository",
                id: repo.id.to_string(),
            }),
        }
    }

    fn get_operation(&self, id: &RecordId) -> Result<Option<OperationLogEntry>, RecordError> {
        Ok(self.lock().operations.get(id).cloned())
    }

    fn list_operations(&self) -> Result<Vec<OperationLogEntry>, RecordError> {
        let mut ops: Vec<_> = self.lock().operations.values().cloned().collect();
        newest_first(&mut ops);
        Ok(ops)
    }

    fn insert_operation(&self, entry: &OperationLogEntry) -> Result<(), RecordError> {
        let mut inner = self.lock();
        Self::check_fail(&inner, FailOn::InsertOperation)?;
        if inner.operations.contains_key(&entry.id) {
            return Err(RecordError::Duplicate {
                kind: "operation",
                id: entry.id.to_string(),
            });
        }
        inner.operations.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    fn update_operation(&self, entry: &OperationLogEntry) -> Result<(), RecordError> {
        let mut inner = self.lock();
        Self::check_fail(&inner, FailOn::UpdateOperation)?;
        let existing = inner
            .operations
            .get_mut(&entry.id)
            .ok_or_else(|| RecordError::NotFound {
                kind: "operation",
                id: entry.id.to_string(),
            })?;
        check_transition(&entry.id, existing.status, entry.status)?;
        *existing = entry.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{OperationStatus, PushType, RepoStatus};
    use crate::core::url::RepoSlug;

    fn repo(id: &str) -> Repository {
        Repository::with_id(
            RecordId::new(id).unwrap(),
            format!("https://github.com/alice/{}", id),
            &RepoSlug::new("alice", id),
        )
    }

    fn op() -> OperationLogEntry {
        OperationLogEntry::start(
            RecordId::new("a").unwrap(),
            RecordId::new("b").unwrap(),
            PushType::Force,
        )
    }

    #[test]
    fn insert_and_get_repository() {
        let store = MemoryStore::new();
        let r = repo("a");
        store.insert_repository(&r).unwrap();
        assert_eq!(store.get_repository(&r.id).unwrap(), Some(r));
        assert!(store
            .get_repository(&RecordId::new("missing").unwrap())
            .unwrap()
            .is_none());
    }

    #[test]
    fn duplicate_repository_rejected() {
        let store = MemoryStore::with_repositories([repo("a")]);
        assert!(matches!(
            store.insert_repository(&repo("a")),
            Err(RecordError::Duplicate { .. })
        ));
    }

    #[test]
    fn update_missing_repository_fails() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.update_repository(&repo("a")),
            Err(RecordError::NotFound { .. })
        ));
    }

    #[test]
    fn update_repository_replaces_row() {
        let store = MemoryStore::with_repositories([repo("a")]);
        let mut r = store
            .get_repository(&RecordId::new("a").unwrap())
            .unwrap()
            .unwrap();
        r.mark_synced("abc123", "abc123", None);
        store.update_repository(&r).unwrap();

        let stored = store.get_repository(&r.id).unwrap().unwrap();
        assert_eq!(stored.status, RepoStatus::Synced);
    }

    #[test]
    fn operation_lifecycle() {
        let store = MemoryStore::new();
        let mut e = op();
        store.insert_operation(&e).unwrap();

        e.complete("abc123").unwrap();
        store.update_operation(&e).unwrap();

        let stored = store.get_operation(&e.id).unwrap().unwrap();
        assert_eq!(stored.status, OperationStatus::Completed);
    }

    #[test]
    fn terminal_operation_cannot_be_rewritten() {
        let store = MemoryStore::new();
        let mut e = op();
        store.insert_operation(&e).unwrap();

        let mut completed = e.clone();
        completed.complete("abc123").unwrap();
        store.update_operation(&completed).unwrap();

        // A stale copy still in `started` tries to fail the entry.
        e.fail("late").unwrap();
        assert!(matches!(
            store.update_operation(&e),
            Err(RecordError::InvalidTransition { .. })
        ));
        let stored = store.get_operation(&e.id).unwrap().unwrap();
        assert_eq!(stored.status, OperationStatus::Completed);
    }

    #[test]
    fn injected_failure() {
        let store = MemoryStore::new().fail_on(FailOn::InsertOperation);
        assert!(matches!(
            store.insert_operation(&op()),
            Err(RecordError::WriteFailed(_))
        ));
        store.clear_fail_on();
        assert!(store.insert_operation(&op()).is_ok());
    }

    #[test]
    fn clones_share_state() {
        let store = MemoryStore::new();
        let clone = store.clone();
        clone.insert_repository(&repo("a")).unwrap();
        assert_eq!(store.list_repositories().unwrap().len(), 1);
    }
}
