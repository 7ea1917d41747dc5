use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::json_file::JsonFileStore;
use crate::memory::MemoryStore;
use crate::traits::PatientStore;

/// Supported storage backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// One JSON document on disk.
    #[default]
    JsonFile,
    /// Process memory; for tests and throwaway runs.
    Memory,
}

/// Factory configuration to construct a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Document location for the `json_file` backend.
    #[serde(default = "default_path")]
    pub path: PathBuf,
    /// Write an empty document at startup when none exists.
    #[serde(default)]
    pub create_if_missing: bool,
}

fn default_path() -> PathBuf {
    PathBuf::from("patients.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_path(),
            create_if_missing: false,
        }
    }
}

/// Type alias for a shareable store.
pub type DynStore = Arc<dyn PatientStore>;

/// Builds the configured store.
pub async fn create_store(config: &StorageConfig) -> Result<DynStore, StorageError> {
    match config.backend {
        StorageBackend::JsonFile => {
            let store = JsonFileStore::open(&config.path, config.create_if_missing).await?;
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
