//! # carebook-storage
//!
//! Persistence for the patient collection. The whole collection is loaded
//! and saved as a single document; handlers never see the file layout.
//!
//! ```ignore
//! use carebook_storage::{JsonFileStore, PatientStore};
//!
//! let store = JsonFileStore::open("patients.json", true).await?;
//! let mut patients = store.load().await?;
//! patients.shift_remove("P001");
//! store.save(&patients).await?;
//! ```

mod error;
pub mod factory;
mod json_file;
mod memory;
mod traits;

pub use error::StorageError;
pub use factory::{DynStore, StorageBackend, StorageConfig, create_store};
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use traits::PatientStore;
