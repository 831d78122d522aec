// libs/analytics-cell/src/router.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn analytics_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        // KPI cards and charts
        .route("/kpis", get(handlers::get_kpis))
        .route("/age-distribution", get(handlers::get_age_distribution))
        .route("/gender-distribution", get(handlers::get_gender_distribution))
        .route("/workload", get(handlers::get_workload))

        // Admin dashboard
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/recent-activity", get(handlers::get_recent_activity))
        .route("/pending", get(handlers::get_pending_counts))

        // Database function passthroughs
        .route("/patients-by-month", get(handlers::get_patients_by_month))
        .route("/appointments-by-day", get(handlers::get_appointments_by_day))
        .route("/daily-revenue", get(handlers::get_daily_revenue))

        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
