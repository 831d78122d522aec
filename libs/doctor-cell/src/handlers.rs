// libs/doctor-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::Utc;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AssignServiceRequest, CreatePatientReportRequest, DashboardQuery, DoctorError,
    DoctorPatientQuery, ReportListQuery, UpdatePatientReportRequest, UpdateReceiptStatusRequest,
};
use crate::services::{DoctorPatientFilter, DoctorPortalService};

impl From<DoctorError> for AppError {
    fn from(e: DoctorError) -> Self {
        match e {
            DoctorError::NotFound(_) => AppError::NotFound(e.to_string()),
            DoctorError::ValidationError(msg) => AppError::ValidationError(msg),
            DoctorError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

/// The portal belongs to the doctor; administrators may open any of them.
fn ensure_portal_access(user: &User, doctor_id: &str) -> Result<(), AppError> {
    if user.is_admin() || user.id == doctor_id {
        Ok(())
    } else {
        Err(AppError::Forbidden("Not authorized to access this doctor's portal".to_string()))
    }
}

#[axum::debug_handler]
pub async fn get_dashboard(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Value>, AppError> {
    ensure_portal_access(&user, &doctor_id)?;
    let today = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let service = DoctorPortalService::new(&config);
    let dashboard = service.dashboard(&doctor_id, today, auth.token()).await?;

    Ok(Json(json!(dashboard)))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
    Query(query): Query<DoctorPatientQuery>,
) -> Result<Json<Value>, AppError> {
    ensure_portal_access(&user, &doctor_id)?;
    let filter = DoctorPatientFilter::from_query(&query);

    let service = DoctorPortalService::new(&config);
    let patients = service.patients(&doctor_id, &filter, auth.token()).await?;

    Ok(Json(json!({
        "patients": patients,
        "total": patients.len()
    })))
}

#[axum::debug_handler]
pub async fn list_reports(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
    Query(query): Query<ReportListQuery>,
) -> Result<Json<Value>, AppError> {
    ensure_portal_access(&user, &doctor_id)?;

    let service = DoctorPortalService::new(&config);
    let reports = service
        .reports(&doctor_id, query.patient_id.as_deref(), auth.token())
        .await?;

    Ok(Json(json!({ "reports": reports })))
}

#[axum::debug_handler]
pub async fn create_report(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
    Json(request): Json<CreatePatientReportRequest>,
) -> Result<Json<Value>, AppError> {
    ensure_portal_access(&user, &doctor_id)?;

    let service = DoctorPortalService::new(&config);
    let report = service.create_report(&doctor_id, request, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "report": report
    })))
}

#[axum::debug_handler]
pub async fn update_report(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path((doctor_id, report_id)): Path<(String, String)>,
    Json(request): Json<UpdatePatientReportRequest>,
) -> Result<Json<Value>, AppError> {
    ensure_portal_access(&user, &doctor_id)?;

    let service = DoctorPortalService::new(&config);
    let report = service
        .update_report(&doctor_id, &report_id, request, auth.token())
        .await?;

    Ok(Json(json!(report)))
}

#[axum::debug_handler]
pub async fn list_receipts(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_portal_access(&user, &doctor_id)?;

    let service = DoctorPortalService::new(&config);
    let receipts = service.receipts(&doctor_id, auth.token()).await?;

    Ok(Json(json!({ "receipts": receipts })))
}

#[axum::debug_handler]
pub async fn update_receipt_status(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path((doctor_id, receipt_id)): Path<(String, String)>,
    Json(request): Json<UpdateReceiptStatusRequest>,
) -> Result<Json<Value>, AppError> {
    ensure_portal_access(&user, &doctor_id)?;

    let service = DoctorPortalService::new(&config);
    let receipt = service
        .update_receipt_status(&doctor_id, &receipt_id, request.status, auth.token())
        .await?;

    Ok(Json(json!(receipt)))
}

#[axum::debug_handler]
pub async fn list_notifications(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_portal_access(&user, &doctor_id)?;

    let service = DoctorPortalService::new(&config);
    let notifications = service.notifications(&doctor_id, auth.token()).await?;

    Ok(Json(json!({ "notifications": notifications })))
}

#[axum::debug_handler]
pub async fn list_services(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_portal_access(&user, &doctor_id)?;

    let service = DoctorPortalService::new(&config);
    let services = service.services(&doctor_id, auth.token()).await?;

    Ok(Json(json!({ "services": services })))
}

#[axum::debug_handler]
pub async fn add_service(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
    Json(request): Json<AssignServiceRequest>,
) -> Result<Json<Value>, AppError> {
    ensure_portal_access(&user, &doctor_id)?;

    let service = DoctorPortalService::new(&config);
    service
        .add_service(&doctor_id, &request.service_id, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "service_id": request.service_id
    })))
}

#[axum::debug_handler]
pub async fn remove_service(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path((doctor_id, service_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    ensure_portal_access(&user, &doctor_id)?;

    let service = DoctorPortalService::new(&config);
    service.remove_service(&doctor_id, &service_id, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "service_id": service_id
    })))
}
