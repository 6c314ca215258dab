use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("failed to write storage file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode storage file: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// String key/value store persisted as a single JSON object on disk.
///
/// Behaves like browser local storage: values are opaque strings, the
/// whole store is bounded by a byte quota, and a failed write leaves the
/// previous contents in place.
#[derive(Debug)]
pub struct LocalStorage {
    path: PathBuf,
    quota: usize,
    items: BTreeMap<String, String>,
}

impl LocalStorage {
    pub async fn open(path: impl Into<PathBuf>, quota: usize) -> Self {
        let path = path.into();
        let items = read_items(&path).await;
        debug!(path = %path.display(), keys = items.len(), "opened local storage");
        Self { path, quota, items }
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    pub async fn set_item(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        let needed = self.size_with(key, &value);
        if needed > self.quota {
            return Err(StorageError::QuotaExceeded {
                needed,
                quota: self.quota,
            });
        }

        let mut next = self.items.clone();
        next.insert(key.to_string(), value);
        let payload = serde_json::to_vec_pretty(&next)?;
        write_replace(&self.path, &payload).await?;
        self.items = next;
        Ok(())
    }

    /// Bytes used by keys and values once `key` holds `value`.
    fn size_with(&self, key: &str, value: &str) -> usize {
        let others: usize = self
            .items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum();
        others + key.len() + value.len()
    }
}

/// Writes next to `path` and renames over it, so a crash mid-write never
/// leaves a half-written store behind.
async fn write_replace(path: &Path, payload: &[u8]) -> std::io::Result<()> {
    let tmp = temp_path(path);
    if let Err(err) = fs::write(&tmp, payload).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(err);
    }
    fs::rename(&tmp, path).await
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

async fn read_items(path: &Path) -> BTreeMap<String, String> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(items) => items,
            Err(err) => {
                error!("failed to parse storage file: {err}");
                BTreeMap::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(err) => {
            error!("failed to read storage file: {err}");
            BTreeMap::new()
        }
    }
}
