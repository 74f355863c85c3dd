use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};

use crate::error::ClientResult;

/// Durable key-value storage: one pretty-printed JSON document per key.
#[derive(Clone, Debug)]
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new(base_dir: &Path) -> ClientResult<Self> {
        fs::create_dir_all(base_dir)?;
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
        })
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }

    /// Missing and unparseable documents both read as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.file_path(key);
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key, error = %err, "ignoring unreadable stored document");
                None
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.file_path(key).exists()
    }

    pub fn set<T: Serialize>(&self, key: &str, data: &T) -> ClientResult<()> {
        let path = self.file_path(key);
        let tmp_path = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(data)
            .map_err(|e| crate::error::ClientError::Storage(e.to_string()))?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> ClientResult<()> {
        match fs::remove_file(self.file_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_test_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_set_then_get() {
        let (_dir, store) = make_test_store();
        store.set("accessToken", &"abc".to_string()).unwrap();
        assert_eq!(store.get::<String>("accessToken").as_deref(), Some("abc"));
        assert!(store.contains("accessToken"));
    }

    #[test]
    fn test_missing_key_is_none() {
        let (_dir, store) = make_test_store();
        assert!(store.get::<String>("refreshToken").is_none());
        assert!(!store.contains("refreshToken"));
    }

    #[test]
    fn test_corrupt_document_reads_as_absent() {
        let (dir, store) = make_test_store();
        fs::write(dir.path().join("currentTestId.json"), "{not json").unwrap();
        assert!(store.get::<i64>("currentTestId").is_none());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (_dir, store) = make_test_store();
        store.set("currentTestId", &7_i64).unwrap();
        store.remove("currentTestId").unwrap();
        store.remove("currentTestId").unwrap();
        assert!(store.get::<i64>("currentTestId").is_none());
    }

    #[test]
    fn test_set_leaves_no_tmp_files() {
        let (dir, store) = make_test_store();
        store.set("currentTestId", &3_i64).unwrap();
        let tmp_files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(tmp_files.is_empty(), "no residual .tmp files");
    }

    #[test]
    fn test_new_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = JsonStore::new(&nested).unwrap();
        assert!(nested.exists());
        store.set("accessToken", &"abc".to_string()).unwrap();
        assert!(nested.join("accessToken.json").exists());
    }
}
