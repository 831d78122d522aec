// libs/analytics-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::Utc;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{AnalyticsError, DayQuery, MonthQuery, RangeQuery};
use crate::services::AnalyticsService;

impl From<AnalyticsError> for AppError {
    fn from(e: AnalyticsError) -> Self {
        match e {
            AnalyticsError::ValidationError(msg) => AppError::ValidationError(msg),
            AnalyticsError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

/// Reports are part of the admin console.
fn ensure_admin(user: &User) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Analytics are only available to administrators".to_string()))
    }
}

#[axum::debug_handler]
pub async fn get_kpis(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Value>, AppError> {
    ensure_admin(&user)?;
    let range = query.resolve(Utc::now().date_naive())?;

    let service = AnalyticsService::new(&config);
    let report = service.kpis(range, auth.token()).await?;

    Ok(Json(json!(report)))
}

#[axum::debug_handler]
pub async fn get_age_distribution(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    ensure_admin(&user)?;

    let service = AnalyticsService::new(&config);
    let buckets = service
        .age_distribution(Utc::now().date_naive(), auth.token())
        .await?;

    Ok(Json(json!(buckets)))
}

#[axum::debug_handler]
pub async fn get_gender_distribution(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    ensure_admin(&user)?;

    let service = AnalyticsService::new(&config);
    let distribution = service.gender_distribution(auth.token()).await?;

    Ok(Json(json!(distribution)))
}

#[axum::debug_handler]
pub async fn get_workload(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    ensure_admin(&user)?;

    let service = AnalyticsService::new(&config);
    let workload = service.workload(auth.token()).await?;

    Ok(Json(json!(workload)))
}

#[axum::debug_handler]
pub async fn get_pending_counts(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Value>, AppError> {
    ensure_admin(&user)?;

    let service = AnalyticsService::new(&config);
    let counts = service.pending_counts(query.or_today(), auth.token()).await?;

    Ok(Json(json!(counts)))
}

#[axum::debug_handler]
pub async fn get_dashboard(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Value>, AppError> {
    ensure_admin(&user)?;

    let service = AnalyticsService::new(&config);
    let stats = service.dashboard(query.or_today(), auth.token()).await?;

    Ok(Json(json!(stats)))
}

#[axum::debug_handler]
pub async fn get_recent_activity(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    ensure_admin(&user)?;

    let service = AnalyticsService::new(&config);
    let activity = service.recent_activity(auth.token()).await?;

    Ok(Json(json!({ "activities": activity })))
}

#[axum::debug_handler]
pub async fn get_patients_by_month(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Value>, AppError> {
    ensure_admin(&user)?;

    let service = AnalyticsService::new(&config);
    let count = service
        .patients_by_month(query.year, query.month, auth.token())
        .await?;

    Ok(Json(json!({ "year": query.year, "month": query.month, "count": count })))
}

#[axum::debug_handler]
pub async fn get_appointments_by_day(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Value>, AppError> {
    ensure_admin(&user)?;
    let date = query.or_today();

    let service = AnalyticsService::new(&config);
    let count = service.appointments_by_day(date, auth.token()).await?;

    Ok(Json(json!({ "date": date, "count": count })))
}

#[axum::debug_handler]
pub async fn get_daily_revenue(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Value>, AppError> {
    ensure_admin(&user)?;
    let date = query.or_today();

    let service = AnalyticsService::new(&config);
    let revenue = service.daily_revenue(date, auth.token()).await?;

    Ok(Json(json!({ "date": date, "revenue": revenue })))
}
