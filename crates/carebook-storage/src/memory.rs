//! In-process patient store.

use async_trait::async_trait;
use carebook_core::PatientCollection;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::traits::PatientStore;

/// Keeps the collection in memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collection: RwLock<PatientCollection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patients(collection: PatientCollection) -> Self {
        Self {
            collection: RwLock::new(collection),
        }
    }
}

#[async_trait]
impl PatientStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self) -> Result<PatientCollection, StorageError> {
        Ok(self.collection.read().await.clone())
    }

    async fn save(&self, collection: &PatientCollection) -> Result<(), StorageError> {
        *self.collection.write().await = collection.clone();
        Ok(())
    }
}
