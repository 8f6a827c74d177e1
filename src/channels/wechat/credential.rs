use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Opaque persisted login session. Only the platform side interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCredential(serde_json::Value);

impl SessionCredential {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Where the login session lives between runs.
pub trait CredentialStore: Send + Sync {
    /// Location shown in diagnostics.
    fn path(&self) -> &Path;

    /// The stored credential, or `None` when absent or unreadable.
    fn load(&self) -> Option<SessionCredential>;

    fn delete(&self) -> io::Result<()>;

    fn save(&self, credential: &SessionCredential) -> io::Result<()>;
}

/// JSON file store, `token.json` by default.
#[derive(Debug, Clone)]
pub struct JsonFileCredentialStore {
    path: PathBuf,
}

impl JsonFileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for JsonFileCredentialStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Option<SessionCredential> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("failed to read {}: {e}", self.path.display());
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(credential) => Some(credential),
            Err(e) => {
                tracing::warn!("ignoring malformed credential {}: {e}", self.path.display());
                None
            }
        }
    }

    /// A file that is already gone counts as deleted.
    fn delete(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn save(&self, credential: &SessionCredential) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(credential).map_err(io::Error::other)?;
        fs::write(&self.path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_in(dir: &tempfile::TempDir) -> JsonFileCredentialStore {
        JsonFileCredentialStore::new(dir.path().join("token.json"))
    }

    #[test]
    fn load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(&dir).load().is_none());
    }

    #[test]
    fn save_then_load_returns_same_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let credential = SessionCredential::new(json!({"wxuin": 1, "cookies": ["a=b"]}));

        store.save(&credential).unwrap();
        assert_eq!(store.load(), Some(credential));
    }

    #[test]
    fn malformed_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{not json").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&SessionCredential::new(json!({}))).unwrap();

        store.delete().unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn delete_missing_file_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(&dir).delete().is_ok());
    }

    #[test]
    fn delete_reports_real_failures() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the credential path cannot be removed with remove_file.
        let store = JsonFileCredentialStore::new(dir.path());
        assert!(store.delete().is_err());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileCredentialStore::new(dir.path().join("nested/wx/token.json"));
        store.save(&SessionCredential::new(json!({"k": "v"}))).unwrap();
        assert!(store.path().exists());
    }
}
