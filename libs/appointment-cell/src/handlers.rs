// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::{NaiveDate, Utc};
use headers::{authorization::Bearer, Authorization};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, AppointmentListQuery, AppointmentOrigin, CreateAppointmentRequest,
    CreatedRange, UpdateStatusRequest,
};
use crate::services::{AppointmentFilter, AppointmentService};

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

impl DateQuery {
    fn or_today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Utc::now().date_naive())
    }
}

impl From<AppointmentError> for AppError {
    fn from(e: AppointmentError) -> Self {
        match e {
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            AppointmentError::InvalidStatusTransition { .. } => AppError::Conflict(e.to_string()),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

fn parse_origin(raw: &str) -> Result<AppointmentOrigin, AppError> {
    raw.parse::<AppointmentOrigin>().map_err(AppError::from)
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Value>, AppError> {
    let filter = AppointmentFilter::from_query(&query)?;
    let range = CreatedRange { from: query.from, to: query.to };

    let service = AppointmentService::new(&config);
    let page = service
        .list_unified(filter, &range, query.page, query.page_size, auth.token())
        .await?;

    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn list_today_appointments(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, AppError> {
    let date = query.or_today();
    let service = AppointmentService::new(&config);
    let appointments = service.list_created_on(date, auth.token()).await?;

    Ok(Json(json!({
        "date": date,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment_stats(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(&config);
    let stats = service.stats(query.or_today(), auth.token()).await?;

    Ok(Json(json!(stats)))
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(&config);
    let appointment = service.create_appointment(request, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path((origin, appointment_id)): Path<(String, String)>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let origin = parse_origin(&origin)?;
    let service = AppointmentService::new(&config);
    let change = service
        .update_status(origin, &appointment_id, request.appointment_status, auth.token())
        .await?;

    Ok(Json(json!(change)))
}

#[axum::debug_handler]
pub async fn approve_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path((origin, appointment_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let origin = parse_origin(&origin)?;
    let service = AppointmentService::new(&config);
    let change = service.approve(origin, &appointment_id, auth.token()).await?;

    Ok(Json(json!(change)))
}

#[axum::debug_handler]
pub async fn get_doctor_appointments(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    // Doctors only see their own schedule
    if user.portal_role() == Some("doctor") && user.id != doctor_id {
        return Err(AppError::Forbidden("Not authorized to view another doctor's appointments".to_string()));
    }

    let service = AppointmentService::new(&config);
    let appointments = service.doctor_appointments(&doctor_id, auth.token()).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}
