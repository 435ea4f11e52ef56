use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::DataStore;
use crate::error::{Error, Result};

/// Section -> key -> value
pub type Table = BTreeMap<String, BTreeMap<String, String>>;

/// Serialized layout: table -> section -> key -> value
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Tables(pub BTreeMap<String, Table>);

/// In-memory [`DataStore`]
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    disposed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tables(tables: Tables) -> Self {
        Self {
            tables: RwLock::new(tables),
            disposed: AtomicBool::new(false),
        }
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> Tables {
        self.tables.read().clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(Error::StoreDisposed);
        }
        Ok(())
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn list_tables(&self) -> Result<Vec<String>> {
        self.ensure_open()?;
        Ok(self.tables.read().0.keys().cloned().collect())
    }

    async fn list_sections(&self, table: &str) -> Result<Vec<String>> {
        self.ensure_open()?;
        Ok(self
            .tables
            .read()
            .0
            .get(table)
            .map(|sections| sections.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_keys(&self, table: &str, section: &str) -> Result<Vec<String>> {
        self.ensure_open()?;
        Ok(self
            .tables
            .read()
            .0
            .get(table)
            .and_then(|sections| sections.get(section))
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_string(&self, table: &str, section: &str, key: &str) -> Result<Option<String>> {
        self.ensure_open()?;
        Ok(self
            .tables
            .read()
            .0
            .get(table)
            .and_then(|sections| sections.get(section))
            .and_then(|keys| keys.get(key))
            .cloned())
    }

    async fn set_string(&self, table: &str, section: &str, key: &str, value: &str) -> Result<()> {
        self.ensure_open()?;
        self.tables
            .write()
            .0
            .entry(table.to_string())
            .or_default()
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn dispose(&mut self) -> Result<()> {
        self.disposed.store(true, Ordering::Release);
        Ok(())
    }
}
