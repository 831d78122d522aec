// libs/doctor-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/{doctor_id}/dashboard", get(handlers::get_dashboard))
        .route("/{doctor_id}/patients", get(handlers::list_patients))

        // Patient reports authored by the doctor
        .route(
            "/{doctor_id}/reports",
            get(handlers::list_reports).post(handlers::create_report),
        )
        .route("/{doctor_id}/reports/{report_id}", put(handlers::update_report))

        // Receipts of the doctor's patients
        .route("/{doctor_id}/receipts", get(handlers::list_receipts))
        .route("/{doctor_id}/receipts/{receipt_id}/status", put(handlers::update_receipt_status))

        .route("/{doctor_id}/notifications", get(handlers::list_notifications))

        // Services offered
        .route(
            "/{doctor_id}/services",
            get(handlers::list_services).post(handlers::add_service),
        )
        .route("/{doctor_id}/services/{service_id}", delete(handlers::remove_service))

        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
