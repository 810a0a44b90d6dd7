//! core::records::file
//!
//! File-backed record store.
//!
//! # Storage
//!
//! - `<data_dir>/repositories.json` - All repository rows
//! - `<data_dir>/operations/<id>.json` - One file per operation log entry
//! - `<data_dir>/lock` - Advisory lock held while writing
//!
//! # Crash Safety
//!
//! Every write goes to a temp file which is fsynced and then renamed over
//! the target, so a crash leaves either the old or the new record on disk.
//! Writers are serialized in-process by a mutex and across processes by an
//! exclusive `fs2` lock on `<data_dir>/lock`.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::schema::{check_transition, OperationLogEntry, Repository};
use super::store::{newest_first, RecordError, RecordStore};
use crate::core::types::RecordId;

const REPOSITORIES_FILE: &str = "repositories.json";
const OPERATIONS_DIR: &str = "operations";
const LOCK_FILE: &str = "lock";

/// Record store persisting JSON files under a data directory.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    write_guard: Mutex<()>,
}

/// Exclusive lock on the data directory, released on drop.
struct DirLock {
    file: File,
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, RecordError> {
        let root = root.into();
        fs::create_dir_all(root.join(OPERATIONS_DIR))?;
        Ok(Self {
            root,
            write_guard: Mutex::new(()),
        })
    }

    fn repositories_path(&self) -> PathBuf {
        self.root.join(REPOSITORIES_FILE)
    }

    fn operation_path(&self, id: &RecordId) -> PathBuf {
        self.root
            .join(OPERATIONS_DIR)
            .join(format!("{}.json", id.as_str()))
    }

    /// Run `f` while holding both the in-process and the on-disk lock.
    fn with_write_lock<T>(
        &self,
        f: impl FnOnce() -> Result<T, RecordError>,
    ) -> Result<T, RecordError> {
        let _guard = self.write_guard.lock().unwrap_or_else(|e| e.into_inner());

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.root.join(LOCK_FILE))?;
        file.lock_exclusive()
            .map_err(|e| RecordError::Locked(e.to_string()))?;
        let _lock = DirLock { file };

        f()
    }

    fn read_repositories(&self) -> Result<Vec<Repository>, RecordError> {
        Ok(read_json::<Vec<Repository>>(&self.repositories_path())?.unwrap_or_default())
    }

    fn write_repositories(&self, repos: &[Repository]) -> Result<(), RecordError> {
        write_json_atomic(&self.repositories_path(), &repos)
    }
}

impl RecordStore for FileStore {
    fn get_repository(&self, id: &RecordId) -> Result<Option<Repository>, RecordError> {
        Ok(self.read_repositories()?.into_iter().find(|r| &r.id == id))
    }

    fn list_repositories(&self) -> Result<Vec<Repository>, RecordError> {
        let mut repos = self.read_repositories()?;
        repos.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(repos)
    }

    fn insert_repository(&self, repo: &Repository) -> Result<(), RecordError> {
        self.with_write_lock(|| {
            let mut repos = self.read_repositories()?;
            if repos.iter().any(|r| r.id == repo.id) {
                return Err(RecordError::Duplicate {
                    kind: "repository",
                    id: repo.id.to_string(),
                });
            }
            repos.push(repo.clone());
            self.write_repositories(&repos)
        })
    }

    fn update_repository(&self, repo: &Repository) -> Result<(), RecordError> {
        self.with_write_lock(|| {
            let mut repos = self.read_repositories()?;
            let slot = repos
                .iter_mut()
                .find(|r| r.id == repo.id)
                .ok_or_else(|| RecordError::NotFound {
                    kind: "repository",
                    id: repo.id.to_string(),
                })?;
            *slot = repo.clone();
            self.write_repositories(&repos)
        })
    }

    fn get_operation(&self, id: &RecordId) -> Result<Option<OperationLogEntry>, RecordError> {
        read_json(&self.operation_path(id))
    }

    fn list_operations(&self) -> Result<Vec<OperationLogEntry>, RecordError> {
        let dir = self.root.join(OPERATIONS_DIR);
        if !dir.exists() {
            return Ok(vec![]);
        }

        let mut entries = Vec::new();
        for dirent in fs::read_dir(&dir)? {
            let path = dirent?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(entry) = read_json::<OperationLogEntry>(&path)? {
                entries.push(entry);
            }
        }
        newest_first(&mut entries);
        Ok(entries)
    }

    fn insert_operation(&self, entry: &OperationLogEntry) -> Result<(), RecordError> {
        self.with_write_lock(|| {
            let path = self.operation_path(&entry.id);
            if path.exists() {
                return Err(RecordError::Duplicate {
                    kind: "operation",
                    id: entry.id.to_string(),
                });
            }
            write_json_atomic(&path, entry)
        })
    }

    fn update_operation(&self, entry: &OperationLogEntry) -> Result<(), RecordError> {
        self.with_write_lock(|| {
            let path = self.operation_path(&entry.id);
            let existing: OperationLogEntry =
                read_json(&path)?.ok_or_else(|| RecordError::NotFound {
                    kind: "operation",
                    id: entry.id.to_string(),
                })?;
            check_transition(&entry.id, existing.status, entry.status)?;
            write_json_atomic(&path, entry)
        })
    }
}

/// Read a JSON file; a missing file is `Ok(None)`.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, RecordError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&content)?))
}

/// Write JSON to a temp file, fsync, and rename over `path`.
fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), RecordError> {
    let content = serde_json::to_string_pretty(value)?;
    let temp_path = path.with_extension("json.tmp");

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }

    fs::rename(&temp_path, path)?;
    Ok(())
}
