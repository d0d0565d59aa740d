//! JSON-file-backed state store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::traits::StateStore;
use crate::error::StoreError;

/// State store persisted as a single JSON object on disk.
///
/// Writes go to a sibling `.tmp` file that is synced and renamed over the
/// real file, so the state file on disk is always a complete document. A
/// leftover `.tmp` from an interrupted write is discarded on open.
pub struct FileStore {
    path: PathBuf,
    cache: Mutex<Map<String, Value>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let tmp = tmp_path(&path);
        match fs::remove_file(&tmp).await {
            Ok(()) => tracing::warn!(path = %tmp.display(), "Discarded unconfirmed state write"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %tmp.display(),
                error = %e,
                "Could not remove unconfirmed state write"
            ),
        }

        let cache = match fs::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => Map::new(),
            Ok(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(StoreError::Corrupt {
                        path: path.display().to_string(),
                        message: "top-level value is not an object".to_string(),
                    });
                }
                Err(e) => {
                    return Err(StoreError::Corrupt {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    });
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };

        tracing::debug!(path = %path.display(), keys = cache.len(), "State store opened");
        Ok(Self {
            path,
            cache: Mutex::new(cache),
        })
    }

    async fn persist(&self, snapshot: &Map<String, Value>) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let body = serde_json::to_vec_pretty(snapshot).map_err(|e| StoreError::Serialization {
            key: "*".to_string(),
            message: e.to_string(),
        })?;

        let tmp = tmp_path(&self.path);
        let mut file = create_owner_only(&tmp).await.map_err(io_err)?;
        file.write_all(&body).await.map_err(io_err)?;
        file.sync_all().await.map_err(io_err)?;
        drop(file);

        fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

/// Open `path` for writing, truncated and readable by the owner only, before
/// any byte is written. The state file holds the private key.
async fn create_owner_only(path: &Path) -> std::io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        options.mode(0o600);
    }
    let file = options.open(path).await?;
    // `mode` only applies to newly created files.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .await?;
    }
    Ok(file)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[async_trait]
impl StateStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.cache.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut cache = self.cache.lock().await;
        let mut next = cache.clone();
        next.insert(key.to_string(), value);
        // Only publish to the cache once the file write is confirmed.
        self.persist(&next).await?;
        *cache = next;
        tracing::debug!(key, "State key written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn set_then_reopen_preserves_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStore::open(&path).await.unwrap();
        store.set("nodeRole", json!("ATLAS")).await.unwrap();
        store.set("nodeUrl", json!("https://node.example.com")).await.unwrap();
        drop(store);

        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(reopened.get("nodeRole").await.unwrap(), Some(json!("ATLAS")));
        assert!(reopened.contains("nodeUrl").await.unwrap());
        assert_eq!(reopened.get("userEmail").await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("nested/state.json"))
            .await
            .unwrap();
        assert_eq!(store.get("anything").await.unwrap(), None);
        store.set("k", json!(1)).await.unwrap();
        assert!(dir.path().join("nested/state.json").exists());
    }

    #[tokio::test]
    async fn unconfirmed_tmp_write_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"nodeRole":"HERMES"}"#).unwrap();
        std::fs::write(dir.path().join("state.json.tmp"), r#"{"nodeRole":"ATL"#).unwrap();

        let store = FileStore::open(&path).await.unwrap();
        assert_eq!(store.get("nodeRole").await.unwrap(), Some(json!("HERMES")));
        assert!(!dir.path().join("state.json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            FileStore::open(&path).await,
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn undeletable_leftover_does_not_block_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"nodeRole":"APOLLO"}"#).unwrap();
        // A directory in place of the tmp file cannot be removed with remove_file.
        std::fs::create_dir(dir.path().join("state.json.tmp")).unwrap();

        let store = FileStore::open(&path).await.unwrap();
        assert_eq!(store.get("nodeRole").await.unwrap(), Some(json!("APOLLO")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn write_file_is_owner_only_before_anything_is_written() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let tmp = dir.path().join("state.json.tmp");
        let file = create_owner_only(&tmp).await.unwrap();
        let mode = std::fs::metadata(&tmp).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(std::fs::metadata(&tmp).unwrap().len(), 0);
        drop(file);

        // An existing world-readable file is tightened on open as well.
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o644)).unwrap();
        let _file = create_owner_only(&tmp).await.unwrap();
        let mode = std::fs::metadata(&tmp).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn state_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let store = FileStore::open(&path).await.unwrap();
        store.set("privateKey", json!("0x01")).await.unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
