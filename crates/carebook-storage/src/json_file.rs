//! Patient collection stored as one pretty-printed JSON file.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use carebook_core::PatientCollection;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::traits::PatientStore;

/// JSON document store.
///
/// Saves go to a temporary file next to the document which is then renamed
/// over it, so an interrupted write leaves the previous document in place.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Opens the store at `path`.
    ///
    /// With `create_if_missing`, an empty collection is written when no
    /// document exists yet. Without it a missing document is reported by the
    /// first `load` as `StorageError::Unavailable`.
    pub async fn open(
        path: impl Into<PathBuf>,
        create_if_missing: bool,
    ) -> Result<Self, StorageError> {
        let store = Self { path: path.into() };
        let exists = tokio::fs::try_exists(&store.path)
            .await
            .map_err(|e| StorageError::io(&store.path, e))?;

        if !exists && create_if_missing {
            info!(path = %store.path.display(), "creating empty patient document");
            store.save(&PatientCollection::new()).await?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PatientStore for JsonFileStore {
    fn backend_name(&self) -> &'static str {
        "json-file"
    }

    async fn load(&self) -> Result<PatientCollection, StorageError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            StorageError::unavailable(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let collection: PatientCollection = serde_json::from_slice(&bytes).map_err(|e| {
            StorageError::unavailable(format!(
                "{} is not a valid patient document: {e}",
                self.path.display()
            ))
        })?;
        debug!(patients = collection.len(), "loaded patient document");
        Ok(collection)
    }

    async fn save(&self, collection: &PatientCollection) -> Result<(), StorageError> {
        let body = to_document(collection)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || replace_file(&path, &body))
            .await
            .map_err(|e| StorageError::internal(format!("save task failed: {e}")))??;
        debug!(patients = collection.len(), "saved patient document");
        Ok(())
    }
}

/// Four-space indentation, matching documents written by earlier tooling.
fn to_document(collection: &PatientCollection) -> Result<Vec<u8>, StorageError> {
    let mut body = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut body, formatter);
    collection.serialize(&mut serializer)?;
    Ok(body)
}

fn replace_file(path: &Path, body: &[u8]) -> Result<(), StorageError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StorageError::io(path, e))?;
    tmp.write_all(body).map_err(|e| StorageError::io(path, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| StorageError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| StorageError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use carebook_core::{Gender, Patient};
    use tempfile::TempDir;

    fn patient(name: &str) -> Patient {
        Patient {
            name: name.into(),
            city: "Pune".into(),
            age: 30,
            gender: Gender::Male,
            height: 1.7,
            weight: 70.0,
        }
    }

    #[tokio::test]
    async fn missing_document_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("patients.json"), false)
            .await
            .unwrap();
        let err = store.load().await.unwrap_err();
        assert!(err.is_unavailable());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn open_can_create_an_empty_document() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("patients.json"), true)
            .await
            .unwrap();
        assert!(store.load().await.unwrap().is_empty());
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{}");
    }

    #[tokio::test]
    async fn open_keeps_an_existing_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("patients.json");
        std::fs::write(
            &path,
            r#"{"P001": {"name": "A", "city": "B", "age": 40, "gender": "other", "height": 1.6, "weight": 60}}"#,
        )
        .unwrap();

        let store = JsonFileStore::open(&path, true).await.unwrap();
        let collection = store.load().await.unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection["P001"].gender, Gender::Other);
    }

    #[tokio::test]
    async fn corrupt_document_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("patients.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::open(&path, true).await.unwrap();
        let err = store.load().await.unwrap_err();
        assert!(err.is_unavailable(), "{err}");
        // A corrupt document is never replaced on open.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn save_replaces_the_whole_document_in_order() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("patients.json"), true)
            .await
            .unwrap();

        let mut collection = PatientCollection::new();
        collection.insert("P002".into(), patient("Second"));
        collection.insert("P001".into(), patient("First"));
        store.save(&collection).await.unwrap();

        let loaded = store.load().await.unwrap();
        let ids: Vec<_> = loaded.keys().cloned().collect();
        assert_eq!(ids, vec!["P002", "P001"]);

        collection.shift_remove("P002");
        store.save(&collection).await.unwrap();
        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(!text.contains("P002"));
        assert!(text.contains("\n    \"P001\": {\n        \"name\": \"First\""));
        assert!(!text.contains("bmi"));

        // Only the document itself remains; the temporary file was renamed.
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }
}
