//! Storage error types.

use std::path::{Path, PathBuf};

/// Errors that can occur while loading or saving the patient document.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The document is missing, unreadable or not a valid patient collection.
    #[error("Storage unavailable: {message}")]
    Unavailable {
        /// Description of why the document could not be used.
        message: String,
    },

    /// Writing the document failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file being written.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The collection could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `Unavailable` error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a new `Io` error for `path`.
    #[must_use]
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the document could not be loaded.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_the_path() {
        let err = StorageError::io(
            Path::new("/data/patients.json"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "I/O error on /data/patients.json: denied");
        assert!(!err.is_unavailable());
    }

    #[test]
    fn unavailable_is_detected() {
        assert!(StorageError::unavailable("gone").is_unavailable());
    }
}
