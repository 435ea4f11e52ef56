//! Table/section/key string storage and conversion between backends

pub mod converter;
pub mod file;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;

pub use converter::{convert_datastore, ConversionReport};
pub use file::FileStore;
pub use memory::MemoryStore;

/// A string store addressed by table, section and key
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn list_tables(&self) -> Result<Vec<String>>;

    async fn list_sections(&self, table: &str) -> Result<Vec<String>>;

    async fn list_keys(&self, table: &str, section: &str) -> Result<Vec<String>>;

    async fn get_string(&self, table: &str, section: &str, key: &str) -> Result<Option<String>>;

    async fn set_string(&self, table: &str, section: &str, key: &str, value: &str) -> Result<()>;

    /// Release the backend; every later call fails
    async fn dispose(&mut self) -> Result<()>;
}
