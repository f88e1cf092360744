use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::tenant_middleware;

use crate::handlers;
use crate::registry::InMemoryRegistry;

pub fn directory_routes(registry: Arc<InMemoryRegistry>) -> Router {
    Router::new()
        .route("/patients", post(handlers::register_patient).get(handlers::list_patients))
        .route("/dentists", post(handlers::register_dentist).get(handlers::list_dentists))
        .layer(middleware::from_fn(tenant_middleware))
        .with_state(registry)
}
