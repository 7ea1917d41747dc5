//! Structured validation results.
//!
//! Schemas in this crate validate raw JSON explicitly instead of relying on
//! derive-time annotations. Every failing field is collected so callers can
//! report all problems in one response.

use serde::Serialize;
use serde_json::{Map, Value};

/// Why a single field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    /// A required field was absent.
    Missing,
    /// The field was present but had the wrong JSON type (including `null`).
    #[serde(rename = "type")]
    WrongType,
    /// The field had the right type but violated a declared constraint.
    Constraint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub kind: FieldErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: FieldErrorKind::Missing,
            message: "field required".into(),
        }
    }

    pub fn wrong_type(field: impl Into<String>, expected: &str) -> Self {
        Self {
            field: field.into(),
            kind: FieldErrorKind::WrongType,
            message: format!("expected {expected}"),
        }
    }

    pub fn constraint(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: FieldErrorKind::Constraint,
            message: message.into(),
        }
    }
}

/// A non-empty list of field errors once returned as `Err`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, thiserror::Error)]
#[error("validation failed: {}", summarize(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    /// Records the outcome of a constraint check.
    pub fn record(&mut self, error: Option<FieldError>) {
        if let Some(e) = error {
            self.errors.push(e);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns `true` when some error concerns `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// `Ok(value)` when nothing was collected, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

/// Reads typed fields out of a JSON object, recording missing and mistyped
/// fields as it goes.
pub(crate) struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    pub(crate) errors: ValidationErrors,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(value: &'a Value) -> Result<Self, ValidationErrors> {
        match value.as_object() {
            Some(object) => Ok(Self {
                object,
                errors: ValidationErrors::default(),
            }),
            None => Err(FieldError::wrong_type("body", "a JSON object").into()),
        }
    }

    fn read<T>(
        &mut self,
        field: &str,
        required: bool,
        expected: &str,
        convert: impl Fn(&Value) -> Option<T>,
    ) -> Option<T> {
        match self.object.get(field) {
            None => {
                if required {
                    self.errors.push(FieldError::missing(field));
                }
                None
            }
            Some(value) => {
                let converted = convert(value);
                if converted.is_none() {
                    self.errors.push(FieldError::wrong_type(field, expected));
                }
                converted
            }
        }
    }

    pub(crate) fn string(&mut self, field: &str, required: bool) -> Option<String> {
        self.read(field, required, "a string", |v| v.as_str().map(str::to_owned))
    }

    /// Accepts JSON integers and integral floats such as `30.0`.
    pub(crate) fn integer(&mut self, field: &str, required: bool) -> Option<i64> {
        self.read(field, required, "an integer", |v| {
            v.as_i64().or_else(|| {
                v.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
        })
    }

    pub(crate) fn number(&mut self, field: &str, required: bool) -> Option<f64> {
        self.read(field, required, "a number", Value::as_f64)
    }

    pub(crate) fn boolean(&mut self, field: &str, required: bool) -> Option<bool> {
        self.read(field, required, "a boolean", Value::as_bool)
    }
}

/// `value > 0` and finite.
pub(crate) fn check_positive(field: &str, value: f64) -> Option<FieldError> {
    if value.is_finite() && value > 0.0 {
        None
    } else {
        Some(FieldError::constraint(field, "must be greater than 0"))
    }
}

/// Exclusive bounds: `low < value < high`.
pub(crate) fn check_open_range(field: &str, value: i64, low: i64, high: i64) -> Option<FieldError> {
    if value > low && value < high {
        None
    } else {
        Some(FieldError::constraint(
            field,
            format!("must be greater than {low} and less than {high}"),
        ))
    }
}
