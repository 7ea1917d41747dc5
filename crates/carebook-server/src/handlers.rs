use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use carebook_api::ApiError;
use carebook_core::{NewPatient, PatientView, PremiumInput, ValidationErrors};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::{RegistryError, parse_sort};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub message: String,
    pub patient_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_category: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
    storage: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct SortQuery {
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Validation(errors) => invalid_body(errors),
            RegistryError::NotFound { id } => {
                tracing::debug!(patient_id = %id, "patient not found");
                ApiError::not_found("Patient not found")
            }
            RegistryError::Conflict { id } => {
                tracing::debug!(patient_id = %id, "duplicate patient id");
                ApiError::conflict("Patient with this ID already exists.")
            }
            RegistryError::InvalidArgument(msg) => {
                tracing::debug!(detail = %msg, "invalid query parameter");
                ApiError::bad_request(msg)
            }
            RegistryError::Storage(e) => {
                tracing::warn!(error = %e, "patient storage failure");
                ApiError::service_unavailable(e.to_string())
            }
        }
    }
}

fn invalid_body(errors: ValidationErrors) -> ApiError {
    tracing::debug!(error = %errors, "rejected invalid request body");
    ApiError::from(errors)
}

/// Unparsable JSON is a 422; transport problems such as an oversized body
/// keep the status axum assigned.
fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    let rejection = match payload {
        Ok(Json(value)) => return Ok(value),
        Err(rejection) => rejection,
    };
    let detail = rejection.body_text();
    tracing::debug!(status = %rejection.status(), %detail, "rejected request body");
    Err(match &rejection {
        JsonRejection::JsonSyntaxError(_) | JsonRejection::JsonDataError(_) => {
            ApiError::unprocessable_entity(detail, Vec::new())
        }
        JsonRejection::MissingJsonContentType(_) => ApiError::unsupported_media_type(detail),
        _ if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            ApiError::payload_too_large(detail)
        }
        _ => ApiError::bad_request(detail),
    })
}

pub async fn root() -> impl IntoResponse {
    MessageResponse::new("Patient management API")
}

pub async fn about() -> impl IntoResponse {
    MessageResponse::new("A fully functional API to manage patients and their data.")
}

pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        storage: state.registry.backend_name(),
    })
}

pub async fn view(
    State(state): State<AppState>,
) -> Result<Json<IndexMap<String, PatientView>>, ApiError> {
    let patients = state.registry.list().await?;
    let views = patients
        .iter()
        .map(|(id, patient)| (id.clone(), patient.view()))
        .collect();
    Ok(Json(views))
}

pub async fn view_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> Result<Json<PatientView>, ApiError> {
    let patient = state.registry.get(&patient_id).await?;
    Ok(Json(patient.view()))
}

pub async fn sort_patients(
    State(state): State<AppState>,
    Query(query): Query<SortQuery>,
) -> Result<Json<Vec<PatientView>>, ApiError> {
    let (key, order) = parse_sort(query.sort_by.as_deref(), query.order.as_deref())?;
    let rows = state.registry.sort(key, order).await?;
    Ok(Json(
        rows.into_iter()
            .map(|(id, patient)| patient.view_with_id(id))
            .collect(),
    ))
}

pub async fn create_patient(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let new = NewPatient::from_json(&json_body(payload)?).map_err(invalid_body)?;
    let patient_id = state.registry.create(new).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Patient created successfully".into(),
            patient_id,
        }),
    ))
}

pub async fn edit_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let changes = json_body(payload)?;
    state.registry.update(&patient_id, &changes).await?;
    Ok(MessageResponse::new("Patient updated successfully"))
}

pub async fn delete_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.registry.delete(&patient_id).await?;
    Ok(MessageResponse::new("Patient deleted successfully"))
}

pub async fn predict_premium(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let input = PremiumInput::from_json(&json_body(payload)?).map_err(invalid_body)?;
    let model = state
        .premium_model
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("No premium model is configured"))?;

    let features = input.features();
    let predicted_category = model.predict(&features).map_err(|e| {
        tracing::warn!(error = %e, "premium prediction failed");
        ApiError::internal(e.to_string())
    })?;
    tracing::debug!(?features, %predicted_category, "premium predicted");
    Ok(Json(PredictionResponse { predicted_category }))
}
