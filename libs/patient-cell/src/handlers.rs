use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;
use shared_models::pagination::PageRequest;

use crate::models::{
    CreatePatientRequest, PatientError, PatientListQuery, PatientSearchQuery, UpdatePatientRequest,
};
use crate::services::PatientService;

impl From<PatientError> for AppError {
    fn from(e: PatientError) -> Self {
        match e {
            PatientError::NotFound => AppError::NotFound("Patient not found".to_string()),
            PatientError::ValidationError(msg) => AppError::ValidationError(msg),
            PatientError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

fn page_request(config: &AppConfig, page: Option<usize>, page_size: Option<usize>) -> PageRequest {
    PageRequest::new(page.unwrap_or(1), page_size.unwrap_or(config.default_page_size))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<PatientListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);
    let page = service
        .list_patients(page_request(&config, query.page, query.page_size), auth.token())
        .await?;

    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn search_patients(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<PatientSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);
    let page = service
        .search_patients(
            query.q.as_deref().unwrap_or_default(),
            page_request(&config, query.page, query.page_size),
            auth.token(),
        )
        .await?;

    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn get_patient_directory(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);
    let patients = service.patient_directory(auth.token()).await?;

    Ok(Json(json!({
        "patients": patients,
        "total": patients.len()
    })))
}

#[axum::debug_handler]
pub async fn create_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);
    let patient = service.create_patient(request, auth.token()).await?;

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);
    let patient = service.get_patient(&patient_id, auth.token()).await?;

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(patient_id): Path<String>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);
    let patient = service.update_patient(&patient_id, request, auth.token()).await?;

    Ok(Json(json!(patient)))
}
