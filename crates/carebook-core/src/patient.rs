//! Patient record schema and derived health fields.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validation::{
    FieldError, FieldReader, ValidationErrors, check_open_range, check_positive,
};

/// Longest accepted patient name, in characters.
pub const MAX_NAME_LEN: usize = 50;

/// Exclusive lower bound on `age`.
pub const AGE_MIN_EXCLUSIVE: i64 = 0;

/// Exclusive upper bound on `age`.
pub const AGE_MAX_EXCLUSIVE: i64 = 120;

/// Patients keyed by id, in document order.
pub type PatientCollection = IndexMap<String, Patient>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl FromStr for Gender {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gender::ALL.into_iter().find(|g| g.as_str() == s).ok_or(())
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health classification derived from BMI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Underweight,
    #[serde(rename = "Normal weight")]
    NormalWeight,
    Overweight,
    Obese,
}

impl Verdict {
    /// Classifies an already rounded BMI.
    ///
    /// Values in `[24.9, 25)` and `[29.9, 30)` match none of the explicit
    /// bands and fall through to `Obese`. Existing clients depend on this
    /// classification, so it is kept rather than closed.
    pub fn classify(bmi: f64) -> Self {
        if bmi < 18.5 {
            Verdict::Underweight
        } else if (18.5..24.9).contains(&bmi) {
            Verdict::NormalWeight
        } else if (25.0..29.9).contains(&bmi) {
            Verdict::Overweight
        } else {
            Verdict::Obese
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Underweight => "Underweight",
            Verdict::NormalWeight => "Normal weight",
            Verdict::Overweight => "Overweight",
            Verdict::Obese => "Obese",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `weight / height^2`, rounded to two decimals.
pub fn bmi(weight: f64, height: f64) -> f64 {
    round2(weight / (height * height))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Stored fields of a patient. The id is the collection key and never part
/// of the stored value; `bmi` and `verdict` are always recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub name: String,
    pub city: String,
    pub age: u32,
    pub gender: Gender,
    /// Meters.
    pub height: f64,
    /// Kilograms.
    pub weight: f64,
}

impl Patient {
    /// Validates a JSON object holding all stored fields.
    pub fn from_json(value: &Value) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(value)?;
        let fields = PatientPatch::read(&mut reader, true);
        let mut errors = reader.errors;
        errors.errors.extend(fields.errors);

        match fields.patch {
            PatientPatch {
                name: Some(name),
                city: Some(city),
                age: Some(age),
                gender: Some(gender),
                height: Some(height),
                weight: Some(weight),
            } if errors.is_empty() => {
                errors.record(check_bmi(height, weight));
                errors.into_result(Self {
                    name,
                    city,
                    age,
                    gender,
                    height,
                    weight,
                })
            }
            _ => Err(errors),
        }
    }

    /// Re-checks every constraint on an already typed record.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        errors.record(check_name(&self.name));
        errors.record(check_open_range(
            "age",
            i64::from(self.age),
            AGE_MIN_EXCLUSIVE,
            AGE_MAX_EXCLUSIVE,
        ));
        errors.record(check_positive("height", self.height));
        errors.record(check_positive("weight", self.weight));
        if errors.is_empty() {
            errors.record(check_bmi(self.height, self.weight));
        }
        errors.into_result(())
    }

    pub fn bmi(&self) -> f64 {
        bmi(self.weight, self.height)
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::classify(self.bmi())
    }

    /// Merges the supplied fields over a copy of `self` and validates the
    /// merged record as a whole.
    pub fn apply(&self, patch: &PatientPatch) -> Result<Patient, ValidationErrors> {
        let mut merged = self.clone();
        if let Some(name) = &patch.name {
            merged.name = name.clone();
        }
        if let Some(city) = &patch.city {
            merged.city = city.clone();
        }
        if let Some(age) = patch.age {
            merged.age = age;
        }
        if let Some(gender) = patch.gender {
            merged.gender = gender;
        }
        if let Some(height) = patch.height {
            merged.height = height;
        }
        if let Some(weight) = patch.weight {
            merged.weight = weight;
        }
        merged.validate()?;
        Ok(merged)
    }

    pub fn view(&self) -> PatientView {
        PatientView {
            id: None,
            patient: self.clone(),
            bmi: self.bmi(),
            verdict: self.verdict(),
        }
    }

    pub fn view_with_id(&self, id: impl Into<String>) -> PatientView {
        PatientView {
            id: Some(id.into()),
            ..self.view()
        }
    }
}

fn check_name(name: &str) -> Option<FieldError> {
    if name.is_empty() {
        Some(FieldError::constraint("name", "must not be empty"))
    } else if name.chars().count() > MAX_NAME_LEN {
        Some(FieldError::constraint(
            "name",
            format!("must be at most {MAX_NAME_LEN} characters"),
        ))
    } else {
        None
    }
}

/// Positive heights small enough to overflow `weight / height^2` have no
/// meaningful BMI.
fn check_bmi(height: f64, weight: f64) -> Option<FieldError> {
    if bmi(weight, height).is_finite() {
        None
    } else {
        Some(FieldError::constraint("height", "is too small to derive a BMI"))
    }
}

fn parse_gender(raw: String) -> Result<Gender, FieldError> {
    raw.parse().map_err(|_| {
        let allowed: Vec<_> = Gender::ALL.iter().map(Gender::as_str).collect();
        FieldError::constraint("gender", format!("must be one of {}", allowed.join(", ")))
    })
}

/// A full create payload: the id plus every stored field.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPatient {
    pub id: String,
    pub patient: Patient,
}

impl NewPatient {
    pub fn from_json(value: &Value) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(value)?;
        let id = reader.string("id", true);
        let mut errors = reader.errors;
        if let Some(id) = &id {
            if id.is_empty() {
                errors.push(FieldError::constraint("id", "must not be empty"));
            }
        }

        match (Patient::from_json(value), id) {
            (Ok(patient), Some(id)) if errors.is_empty() => Ok(Self { id, patient }),
            (result, _) => {
                if let Err(more) = result {
                    errors.errors.extend(more.errors);
                }
                Err(errors)
            }
        }
    }
}

/// Partial update: only supplied fields are checked and applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientPatch {
    pub name: Option<String>,
    pub city: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
}

struct ReadFields {
    patch: PatientPatch,
    errors: Vec<FieldError>,
}

impl PatientPatch {
    /// Validates the supplied subset of fields. Unknown keys, `id` included,
    /// are ignored; `null` counts as a type error.
    pub fn from_json(value: &Value) -> Result<Self, ValidationErrors> {
        let mut reader = FieldReader::new(value)?;
        let fields = Self::read(&mut reader, false);
        let mut errors = reader.errors;
        errors.errors.extend(fields.errors);
        errors.into_result(fields.patch)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn read(reader: &mut FieldReader<'_>, required: bool) -> ReadFields {
        let mut errors = Vec::new();
        let mut keep = |error: Option<FieldError>| match error {
            Some(e) => {
                errors.push(e);
                false
            }
            None => true,
        };

        let name = reader.string("name", required).filter(|n| keep(check_name(n)));
        let city = reader.string("city", required);
        let age = reader
            .integer("age", required)
            .filter(|a| keep(check_open_range("age", *a, AGE_MIN_EXCLUSIVE, AGE_MAX_EXCLUSIVE)))
            .and_then(|a| u32::try_from(a).ok());
        let gender = reader
            .string("gender", required)
            .and_then(|g| parse_gender(g).map_err(|e| keep(Some(e))).ok());
        let height = reader
            .number("height", required)
            .filter(|h| keep(check_positive("height", *h)));
        let weight = reader
            .number("weight", required)
            .filter(|w| keep(check_positive("weight", *w)));

        ReadFields {
            patch: PatientPatch {
                name,
                city,
                age,
                gender,
                height,
                weight,
            },
            errors,
        }
    }
}

/// Response shape: stored fields plus the derived ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub patient: Patient,
    pub bmi: f64,
    pub verdict: Verdict,
}
