//! Patient registry: every operation is one load / modify / save cycle over
//! the whole collection.

use std::str::FromStr;

use carebook_core::{NewPatient, Patient, PatientCollection, PatientPatch, ValidationErrors};
use carebook_storage::{DynStore, StorageError};
use serde_json::Value;
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("Patient not found")]
    NotFound { id: String },
    #[error("Patient with this ID already exists.")]
    Conflict { id: String },
    #[error("{0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl RegistryError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn conflict(id: impl Into<String>) -> Self {
        Self::Conflict { id: id.into() }
    }
}

/// Field a listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Height,
    Weight,
    Bmi,
}

impl SortKey {
    fn value(&self, patient: &Patient) -> f64 {
        match self {
            SortKey::Height => patient.height,
            SortKey::Weight => patient.weight,
            SortKey::Bmi => patient.bmi(),
        }
    }
}

impl FromStr for SortKey {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "height" => Ok(SortKey::Height),
            "weight" => Ok(SortKey::Weight),
            "bmi" => Ok(SortKey::Bmi),
            _ => Err(RegistryError::InvalidArgument(
                "Invalid sort_by parameter. Choose from height, weight, or bmi.".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(RegistryError::InvalidArgument(
                "Invalid order parameter. Choose from asc or desc.".into(),
            )),
        }
    }
}

/// Parses raw `sort_by` / `order` query values. `sort_by` is required and
/// `order` defaults to ascending.
pub fn parse_sort(
    sort_by: Option<&str>,
    order: Option<&str>,
) -> Result<(SortKey, SortOrder), RegistryError> {
    let key: SortKey = sort_by
        .ok_or_else(|| {
            RegistryError::InvalidArgument(
                "Missing sort_by parameter. Choose from height, weight, or bmi.".into(),
            )
        })?
        .parse()?;
    let order = order.map(str::parse::<SortOrder>).transpose()?.unwrap_or_default();
    Ok((key, order))
}

/// Read-modify-write access to the patient collection.
///
/// Mutations are serialized through `write_lock` for their whole cycle so
/// two concurrent writers cannot overwrite each other's changes. Reads go
/// straight to the store; saves are atomic, so a read sees either the old or
/// the new document.
pub struct PatientRegistry {
    store: DynStore,
    write_lock: Mutex<()>,
}

impl PatientRegistry {
    pub fn new(store: DynStore) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    pub async fn list(&self) -> Result<PatientCollection, RegistryError> {
        Ok(self.store.load().await?)
    }

    pub async fn get(&self, id: &str) -> Result<Patient, RegistryError> {
        let mut patients = self.store.load().await?;
        patients
            .swap_remove(id)
            .ok_or_else(|| RegistryError::not_found(id))
    }

    /// Stable ordering by `key`; `Desc` is the exact reverse of `Asc`.
    pub async fn sort(
        &self,
        key: SortKey,
        order: SortOrder,
    ) -> Result<Vec<(String, Patient)>, RegistryError> {
        let patients = self.store.load().await?;
        Ok(sort_patients(patients, key, order))
    }

    pub async fn create(&self, new: NewPatient) -> Result<String, RegistryError> {
        let _guard = self.write_lock.lock().await;
        let mut patients = self.store.load().await?;
        if patients.contains_key(&new.id) {
            return Err(RegistryError::conflict(new.id));
        }
        patients.insert(new.id.clone(), new.patient);
        self.store.save(&patients).await?;
        tracing::info!(patient_id = %new.id, "patient created");
        Ok(new.id)
    }

    /// Merges the fields supplied in `changes` into the stored record and
    /// re-validates the result. An unknown id is reported before the body is
    /// looked at.
    pub async fn update(&self, id: &str, changes: &Value) -> Result<Patient, RegistryError> {
        let _guard = self.write_lock.lock().await;
        let mut patients = self.store.load().await?;
        let current = patients
            .get_mut(id)
            .ok_or_else(|| RegistryError::not_found(id))?;
        let patch = PatientPatch::from_json(changes)?;
        let merged = current.apply(&patch)?;
        *current = merged.clone();
        self.store.save(&patients).await?;
        tracing::info!(patient_id = %id, "patient updated");
        Ok(merged)
    }

    pub async fn delete(&self, id: &str) -> Result<(), RegistryError> {
        let _guard = self.write_lock.lock().await;
        let mut patients = self.store.load().await?;
        if patients.shift_remove(id).is_none() {
            return Err(RegistryError::not_found(id));
        }
        self.store.save(&patients).await?;
        tracing::info!(patient_id = %id, "patient deleted");
        Ok(())
    }
}

fn sort_patients(
    patients: PatientCollection,
    key: SortKey,
    order: SortOrder,
) -> Vec<(String, Patient)> {
    let mut rows: Vec<(String, Patient)> = patients.into_iter().collect();
    rows.sort_by(|(_, a), (_, b)| key.value(a).total_cmp(&key.value(b)));
    if order == SortOrder::Desc {
        rows.reverse();
    }
    rows
}
