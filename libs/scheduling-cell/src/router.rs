// libs/scheduling-cell/src/router.rs
use axum::{middleware, routing::post, Router};

use shared_utils::extractor::tenant_middleware;

use crate::handlers;
use crate::handlers::SchedulingState;

/// All appointment operations require an established tenant scope. Ids travel
/// as query parameters (`PATCH /appointments?id=...`) for wire compatibility.
pub fn appointment_routes(state: SchedulingState) -> Router {
    Router::new()
        .route(
            "/",
            post(handlers::book_appointment)
                .get(handlers::list_appointments)
                .patch(handlers::update_appointment)
                .delete(handlers::delete_appointment),
        )
        .layer(middleware::from_fn(tenant_middleware))
        .with_state(state)
}
