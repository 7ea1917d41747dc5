pub mod patient;
pub mod premium;
pub mod validation;

pub use patient::{
    Gender, MAX_NAME_LEN, NewPatient, Patient, PatientCollection, PatientPatch, PatientView,
    Verdict, bmi,
};
pub use premium::{
    AgeGroup, LifestyleRisk, ModelError, Occupation, PremiumFeatures, PremiumInput, PremiumModel,
};
pub use validation::{FieldError, FieldErrorKind, ValidationErrors};
