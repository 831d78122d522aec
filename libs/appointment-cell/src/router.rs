// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        // Unified patient + guest listing
        .route("/", get(handlers::list_appointments))
        .route("/", post(handlers::create_appointment))
        .route("/today", get(handlers::list_today_appointments))
        .route("/stats", get(handlers::get_appointment_stats))
        .route("/doctors/{doctor_id}", get(handlers::get_doctor_appointments))

        // Status changes, keyed by origin (patient | guest)
        .route("/{origin}/{appointment_id}/status", patch(handlers::update_appointment_status))
        .route("/{origin}/{appointment_id}/approve", post(handlers::approve_appointment))

        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
