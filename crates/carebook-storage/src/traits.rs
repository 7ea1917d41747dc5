//! The persistence seam used by the registry.

use async_trait::async_trait;
use carebook_core::PatientCollection;

use crate::error::StorageError;

/// Loads and saves the whole patient collection as one document.
///
/// There is no incremental write: callers load the collection, change it in
/// memory and save all of it back. Implementations must make `save` atomic
/// so a reader never observes a partially written document.
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Short name for logs.
    fn backend_name(&self) -> &'static str;

    /// Reads the full collection.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the document is missing or
    /// cannot be parsed. A missing document is never treated as empty.
    async fn load(&self) -> Result<PatientCollection, StorageError>;

    /// Replaces the stored document with `collection`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` or `StorageError::Serialization` on failure;
    /// the previous document is left intact in that case.
    async fn save(&self, collection: &PatientCollection) -> Result<(), StorageError>;
}
