//! secrets::file_store
//!
//! File-based secret storage in `~/.repomirror/secrets.toml`.
//!
//! - Permissions are 0600 on Unix, set before any content is written
//! - Writes go to a temp file that is synced and renamed over the original
//! - Values never appear in errors or logs

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use super::traits::{SecretError, SecretStore};

/// Secrets in a flat TOML table of `"namespace.key" = "value"` pairs.
#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    /// Store at `~/.repomirror/secrets.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, SecretError> {
        let home = dirs::home_dir()
            .ok_or_else(|| SecretError::ReadError("cannot determine home directory".into()))?;
        Ok(Self::with_path(home.join(".repomirror").join("secrets.toml")))
    }

    /// Store at a custom path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_secrets(&self) -> Result<BTreeMap<String, String>, SecretError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(SecretError::ReadError(format!(
                    "cannot read secrets file: {}",
                    e
                )))
            }
        };

        toml::from_str(&content)
            .map_err(|e| SecretError::ReadError(format!("cannot parse secrets file: {}", e)))
    }

    fn write_secrets(&self, secrets: &BTreeMap<String, String>) -> Result<(), SecretError> {
        let write_err = |what: &str, e: &dyn std::fmt::Display| {
            SecretError::WriteError(format!("{}: {}", what, e))
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_err("cannot create directory", &e))?;
        }

        let content =
            toml::to_string(secrets).map_err(|e| write_err("cannot serialize secrets", &e))?;
        let temp_path = self.path.with_extension("tmp");

        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| write_err("cannot create temp file", &e))?;

            #[cfg(unix)]
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| write_err("cannot set permissions", &e))?;

            file.write_all(content.as_bytes())
                .map_err(|e| write_err("cannot write secrets", &e))?;
            file.sync_all()
                .map_err(|e| write_err("cannot sync to disk", &e))?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| write_err("cannot rename temp file", &e))
    }

    /// True if the file is absent or readable by its owner only.
    #[cfg(unix)]
    pub fn verify_permissions(&self) -> Result<bool, SecretError> {
        match fs::metadata(&self.path) {
            Ok(metadata) => Ok(metadata.permissions().mode() & 0o777 == 0o600),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(SecretError::ReadError(format!(
                "cannot read file metadata: {}",
                e
            ))),
        }
    }

    #[cfg(not(unix))]
    pub fn verify_permissions(&self) -> Result<bool, SecretError> {
        Ok(true)
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        Ok(self.read_secrets()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        let mut secrets = self.read_secrets()?;
        secrets.insert(key.to_string(), value.to_string());
        self.write_secrets(&secrets)
    }

    fn delete(&self, key: &str) -> Result<(), SecretError> {
        let mut secrets = self.read_secrets()?;
        if secrets.remove(key).is_none() {
            return Ok(());
        }
        self.write_secrets(&secrets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, FileSecretStore) {
        let temp = TempDir::new().expect("create temp dir");
        let store = FileSecretStore::with_path(temp.path().join("secrets.toml"));
        (temp, store)
    }

    #[test]
    fn get_nonexistent_returns_none() {
        let (_temp, store) = create_test_store();
        assert!(store.get("github.token").expect("get").is_none());
    }

    #[test]
    fn set_get_delete() {
        let (_temp, store) = create_test_store();

        store.set("github.token", "ghp_one").expect("set");
        store.set("github.token", "ghp_two").expect("overwrite");
        assert_eq!(
            store.get("github.token").expect("get"),
            Some("ghp_two".to_string())
        );

        store.delete("github.token").expect("delete");
        assert!(store.get("github.token").expect("get after delete").is_none());
    }

    #[test]
    fn delete_nonexistent_creates_nothing() {
        let (_temp, store) = create_test_store();
        store.delete("github.token").expect("delete nonexistent");
        assert!(!store.path().exists());
    }

    #[test]
    fn creates_directory_if_missing() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("nested").join("secrets.toml");
        let store = FileSecretStore::with_path(&path);

        store.set("github.token", "value").expect("set");
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn permissions_0600_on_unix() {
        let (_temp, store) = create_test_store();
        assert!(store.verify_permissions().expect("verify before write"));

        store.set("github.token", "value").expect("set");

        let mode = fs::metadata(store.path())
            .expect("metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600);
        assert!(store.verify_permissions().expect("verify after write"));
    }

    #[test]
    fn malformed_file_is_read_error() {
        let (_temp, store) = create_test_store();
        fs::write(store.path(), "\"github.token\" = [ghp_secret").expect("write bad toml");

        let err = store.get("github.token").unwrap_err();
        assert!(err.to_string().contains("cannot parse"));
    }

    #[test]
    fn persistence_across_instances() {
        let temp = TempDir::new().expect("create temp dir");
        let path = temp.path().join("secrets.toml");

        FileSecretStore::with_path(&path)
            .set("github.token", "value")
            .expect("set");

        let result = FileSecretStore::with_path(&path)
            .get("github.token")
            .expect("get");
        assert_eq!(result, Some("value".to_string()));
    }
}
