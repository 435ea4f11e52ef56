use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use super::memory::{MemoryStore, Tables};
use super::DataStore;
use crate::error::{Error, Result};

/// [`DataStore`] kept in memory and saved to a JSON file on flush, or on
/// dispose when it holds unsaved writes
pub struct FileStore {
    path: PathBuf,
    store: MemoryStore,
    /// Set by writes, cleared by a successful flush
    dirty: AtomicBool,
}

impl FileStore {
    /// Load from a JSON file, or start empty if it does not exist
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let tables = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str::<Tables>(&content).map_err(|e| Error::Store {
                message: format!("failed to parse '{}': {}", path.display(), e),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Tables::default(),
            Err(e) => {
                return Err(Error::Store {
                    message: format!("failed to read '{}': {}", path.display(), e),
                })
            }
        };

        Ok(Self {
            path,
            store: MemoryStore::from_tables(tables),
            dirty: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save to the JSON file atomically
    pub async fn flush(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.store.snapshot())?;

        let mut temp_path = self.path.clone().into_os_string();
        temp_path.push(".tmp");
        tokio::fs::write(&temp_path, &content)
            .await
            .map_err(|e| Error::Store {
                message: format!("failed to write '{}': {}", self.path.display(), e),
            })?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::Store {
                message: format!("failed to replace '{}': {}", self.path.display(), e),
            })?;

        self.dirty.store(false, Ordering::Release);
        debug!("Flushed datastore to {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl DataStore for FileStore {
    async fn list_tables(&self) -> Result<Vec<String>> {
        self.store.list_tables().await
    }

    async fn list_sections(&self, table: &str) -> Result<Vec<String>> {
        self.store.list_sections(table).await
    }

    async fn list_keys(&self, table: &str, section: &str) -> Result<Vec<String>> {
        self.store.list_keys(table, section).await
    }

    async fn get_string(&self, table: &str, section: &str, key: &str) -> Result<Option<String>> {
        self.store.get_string(table, section, key).await
    }

    async fn set_string(&self, table: &str, section: &str, key: &str, value: &str) -> Result<()> {
        self.store.set_string(table, section, key, value).await?;
        self.dirty.store(true, Ordering::Release);
        Ok(())
    }

    async fn dispose(&mut self) -> Result<()> {
        if self.store.is_disposed() {
            return Ok(());
        }
        if self.dirty.load(Ordering::Acquire) {
            self.flush().await?;
        }
        self.store.dispose().await
    }
}
