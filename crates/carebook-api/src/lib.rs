use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use carebook_core::{FieldError, ValidationErrors};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub status: u16,
    /// Stable machine-readable kind: invalid | not-found | conflict | not-supported | too-long | unavailable | exception
    pub code: String,
    /// Human-readable description
    pub detail: String,
    /// Per-field problems, only for validation failures
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldErrorBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldErrorBody {
    pub field: String,
    pub kind: String,
    pub message: String,
}

impl From<&FieldError> for FieldErrorBody {
    fn from(e: &FieldError) -> Self {
        let kind = serde_json::to_value(e.kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_default();
        Self {
            field: e.field.clone(),
            kind,
            message: e.message.clone(),
        }
    }
}

/// High-level API errors mapped to HTTP responses
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    /// Duplicate identity. Answered with 400, which existing clients expect.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not acceptable: {0}")]
    NotAcceptable(String),
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("Unprocessable entity: {message}")]
    UnprocessableEntity {
        message: String,
        errors: Vec<FieldError>,
    },
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
    pub fn not_acceptable(msg: impl Into<String>) -> Self {
        Self::NotAcceptable(msg.into())
    }
    pub fn unsupported_media_type(msg: impl Into<String>) -> Self {
        Self::UnsupportedMediaType(msg.into())
    }
    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::PayloadTooLarge(msg.into())
    }
    pub fn unprocessable_entity(msg: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self::UnprocessableEntity {
            message: msg.into(),
            errors,
        }
    }
    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) | ApiError::UnprocessableEntity { .. } => "invalid",
            ApiError::NotFound(_) => "not-found",
            ApiError::Conflict(_) => "conflict",
            ApiError::NotAcceptable(_) | ApiError::UnsupportedMediaType(_) => "not-supported",
            ApiError::PayloadTooLarge(_) => "too-long",
            ApiError::ServiceUnavailable(_) => "unavailable",
            ApiError::Internal(_) => "exception",
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let (detail, errors) = match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::NotAcceptable(msg)
            | ApiError::UnsupportedMediaType(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::Internal(msg) => (msg.clone(), Vec::new()),
            ApiError::UnprocessableEntity { message, errors } => {
                (message.clone(), errors.iter().map(FieldErrorBody::from).collect())
            }
        };
        ErrorBody {
            status: self.status_code().as_u16(),
            code: self.code().to_string(),
            detail,
            errors,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(e: ValidationErrors) -> Self {
        let message = e.to_string();
        ApiError::unprocessable_entity(message, e.errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::to_vec(&self.to_body()).unwrap_or_else(|_| {
            // Fallback minimal body if serialization fails
            br#"{"status":500,"code":"exception","detail":"Serialization failure"}"#.to_vec()
        });

        axum::http::Response::builder()
            .status(status)
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )
            .body(axum::body::Body::from(body))
            .unwrap_or_else(|_| {
                axum::http::Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(axum::body::Body::empty())
                    .unwrap_or_default()
            })
    }
}
