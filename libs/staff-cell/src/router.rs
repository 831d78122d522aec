use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn staff_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(handlers::list_staff).post(handlers::add_staff))
        .route("/roles", get(handlers::list_roles))
        .route("/lookup", get(handlers::find_staff_by_email))
        .route("/bulk-status", post(handlers::bulk_update_status))
        .route(
            "/{staff_id}",
            get(handlers::get_staff)
                .put(handlers::update_staff)
                .delete(handlers::delete_staff),
        )
        // Doctor profile = staff row + doctor_details
        .route(
            "/doctors/{doctor_id}/profile",
            get(handlers::get_doctor_profile).put(handlers::update_doctor_profile),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
