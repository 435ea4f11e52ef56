use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Property holding the Streamlabs application client id
pub const CLIENT_ID_KEY: &str = "streamlabsclientid";
/// Property holding the Streamlabs application client secret
pub const CLIENT_SECRET_KEY: &str = "streamlabsclientsecret";
/// Property holding the access token obtained from the last handshake
pub const ACCESS_TOKEN_KEY: &str = "streamlabsaccesstoken";
/// Web panel basic-auth user
pub const PANEL_USER_KEY: &str = "paneluser";
/// Web panel basic-auth password
pub const PANEL_PASSWORD_KEY: &str = "panelpassword";

/// Case-insensitive string properties, persisted as a flat JSON object.
///
/// Writes only happen through a [`Transaction`], which replaces the file
/// atomically (temp file + rename) before the in-memory values change.
pub struct PropertyStore {
    /// Backing file, `None` for an in-memory store
    path: Option<PathBuf>,
    inner: RwLock<Properties>,
}

#[derive(Default)]
struct Properties {
    values: BTreeMap<String, String>,
    /// Number of committed transactions
    revision: u64,
}

impl PropertyStore {
    /// Create a store that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            inner: RwLock::new(Properties::default()),
        }
    }

    /// Load from a JSON file, or start empty if it does not exist yet
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let path_str = path.display().to_string();

        let values = match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let raw: BTreeMap<String, String> =
                    serde_json::from_str(&content).map_err(|e| Error::ConfigParse {
                        path: path_str.clone(),
                        source: e,
                    })?;
                raw.into_iter()
                    .map(|(k, v)| (normalize_key(&k), v))
                    .collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Properties file {} not found, starting empty", path_str);
                BTreeMap::new()
            }
            Err(e) => {
                return Err(Error::ConfigLoad {
                    path: path_str,
                    source: e,
                })
            }
        };

        Ok(Self {
            path: Some(path),
            inner: RwLock::new(Properties {
                values,
                revision: 0,
            }),
        })
    }

    /// Get a property, falling back to `default` when unset
    pub async fn get_property(&self, key: &str, default: &str) -> String {
        self.inner
            .read()
            .await
            .values
            .get(&normalize_key(key))
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    /// Check whether a property is set
    pub async fn has_property(&self, key: &str) -> bool {
        self.inner
            .read()
            .await
            .values
            .contains_key(&normalize_key(key))
    }

    /// Number of transactions committed since the store was opened
    pub async fn revision(&self) -> u64 {
        self.inner.read().await.revision
    }

    /// Begin collecting changes to be written together
    pub fn start_transaction(&self) -> Transaction<'_> {
        Transaction {
            store: self,
            changes: BTreeMap::new(),
        }
    }

    async fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let path_str = path.display().to_string();
        let content = serde_json::to_string_pretty(values)?;

        let mut temp_path = path.clone().into_os_string();
        temp_path.push(".tmp");
        tokio::fs::write(&temp_path, &content)
            .await
            .map_err(|e| Error::ConfigSave {
                path: path_str.clone(),
                source: e,
            })?;

        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| Error::ConfigSave {
                path: path_str,
                source: e,
            })?;

        Ok(())
    }
}

/// A batch of property changes, applied on [`Transaction::commit`]
pub struct Transaction<'a> {
    store: &'a PropertyStore,
    changes: BTreeMap<String, String>,
}

impl Transaction<'_> {
    pub fn set_property(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.changes.insert(normalize_key(key), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Write the changes to disk, then make them visible to readers.
    ///
    /// If persisting fails the store keeps its previous values.
    pub async fn commit(self) -> Result<()> {
        if self.changes.is_empty() {
            return Ok(());
        }

        let mut inner = self.store.inner.write().await;
        let mut values = inner.values.clone();
        let changed = self.changes.len();
        values.extend(self.changes);

        self.store.persist(&values).await?;

        inner.values = values;
        inner.revision += 1;
        debug!(
            "Committed {} property change(s), revision {}",
            changed, inner.revision
        );

        Ok(())
    }
}

/// Shared property store type
pub type SharedPropertyStore = Arc<PropertyStore>;

pub fn create_shared_property_store(store: PropertyStore) -> SharedPropertyStore {
    Arc::new(store)
}

fn normalize_key(key: &str) -> String {
    key.to_lowercase()
}
