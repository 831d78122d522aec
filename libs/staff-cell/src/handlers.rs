use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::pagination::PageRequest;

use crate::models::{
    BulkStatusRequest, CreateStaffRequest, StaffError, StaffListQuery, StaffLookupQuery,
    UpdateDoctorProfileRequest, UpdateStaffRequest,
};
use crate::services::staff::role_catalogue;
use crate::services::{StaffFilter, StaffService};

impl From<StaffError> for AppError {
    fn from(e: StaffError) -> Self {
        match e {
            StaffError::NotFound => AppError::NotFound("Staff member not found".to_string()),
            StaffError::EmailTaken(_) => AppError::Conflict(e.to_string()),
            StaffError::ValidationError(msg) => AppError::ValidationError(msg),
            StaffError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

fn require_admin(user: &User, action: &str) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("Only administrators can {}", action)))
    }
}

#[axum::debug_handler]
pub async fn list_staff(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<StaffListQuery>,
) -> Result<Json<Value>, AppError> {
    let filter = StaffFilter::from_query(&query)?;
    let page = PageRequest::new(
        query.page.unwrap_or(1),
        query.page_size.unwrap_or(config.default_page_size),
    );

    let service = StaffService::new(&config);
    let staff = service.list_filtered(&filter, page, auth.token()).await?;

    Ok(Json(json!(staff)))
}

#[axum::debug_handler]
pub async fn find_staff_by_email(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<StaffLookupQuery>,
) -> Result<Json<Value>, AppError> {
    let email = query
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("email query parameter is required".to_string()))?;

    let service = StaffService::new(&config);
    let staff = service
        .find_by_email(&email, auth.token())
        .await?
        .ok_or(StaffError::NotFound)?;

    Ok(Json(json!(staff)))
}

pub async fn list_roles() -> Json<Value> {
    Json(json!({ "roles": role_catalogue() }))
}

#[axum::debug_handler]
pub async fn get_staff(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(staff_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = StaffService::new(&config);
    let staff = service.get_staff(&staff_id, auth.token()).await?;

    Ok(Json(json!(staff)))
}

#[axum::debug_handler]
pub async fn add_staff(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateStaffRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user, "add staff members")?;

    let service = StaffService::new(&config);
    let staff = service.add_staff(request, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "staff": staff
    })))
}

#[axum::debug_handler]
pub async fn update_staff(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(staff_id): Path<String>,
    Json(request): Json<UpdateStaffRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user, "update staff members")?;

    let service = StaffService::new(&config);
    let staff = service.update_staff(&staff_id, &request, auth.token()).await?;

    Ok(Json(json!(staff)))
}

#[axum::debug_handler]
pub async fn delete_staff(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(staff_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user, "delete staff members")?;
    if user.id == staff_id {
        return Err(AppError::BadRequest("You cannot delete your own account".to_string()));
    }

    let service = StaffService::new(&config);
    service.delete_staff(&staff_id, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "staff_id": staff_id
    })))
}

#[axum::debug_handler]
pub async fn bulk_update_status(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BulkStatusRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user, "change staff status")?;

    let service = StaffService::new(&config);
    let updated = service.bulk_update_status(&request, auth.token()).await?;

    Ok(Json(json!({
        "success": true,
        "staff_status": request.staff_status,
        "updated": updated
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_profile(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = StaffService::new(&config);
    let profile = service.doctor_profile(&doctor_id, auth.token()).await?;

    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn update_doctor_profile(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<String>,
    Json(request): Json<UpdateDoctorProfileRequest>,
) -> Result<Json<Value>, AppError> {
    // Doctors may edit their own profile
    if !user.is_admin() && user.id != doctor_id {
        return Err(AppError::Forbidden("Not authorized to update this doctor profile".to_string()));
    }

    let service = StaffService::new(&config);
    let profile = service.update_doctor_profile(&doctor_id, request, auth.token()).await?;

    Ok(Json(json!(profile)))
}
