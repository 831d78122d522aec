use std::sync::Arc;

use axum::{middleware, routing::{get, post, put}, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn patient_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(list_patients))
        .route("/", post(create_patient))
        .route("/search", get(search_patients))
        .route("/directory", get(get_patient_directory))
        .route("/{id}", get(get_patient))
        .route("/{id}", put(update_patient))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
