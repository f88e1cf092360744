use std::sync::Arc;

use axum::{routing::get, Router};

use directory_cell::registry::InMemoryRegistry;
use directory_cell::router::directory_routes;
use scheduling_cell::handlers::SchedulingState;
use scheduling_cell::router::appointment_routes;
use scheduling_cell::services::engine::SchedulingEngine;
use scheduling_cell::store::{MemoryStore, RetryingStore};
use shared_config::AppConfig;

pub fn create_router(config: &AppConfig) -> Router {
    let registry = Arc::new(InMemoryRegistry::new());
    let store = Arc::new(RetryingStore::new(
        MemoryStore::new(config.store_op_timeout),
        config.store_retry_attempts,
    ));
    let engine = Arc::new(
        SchedulingEngine::new(store, registry.clone(), registry.clone())
            .with_list_window_days(config.list_window_days),
    );

    Router::new()
        .route("/", get(|| async { "Clinic API is running!" }))
        .nest("/appointments", appointment_routes(SchedulingState { engine }))
        .nest("/directory", directory_routes(registry))
}
