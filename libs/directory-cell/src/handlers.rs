use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;
use shared_models::tenant::TenantContext;

use crate::models::RegisterRequest;
use crate::registry::InMemoryRegistry;

#[axum::debug_handler]
pub async fn register_patient(
    State(registry): State<Arc<InMemoryRegistry>>,
    Extension(scope): Extension<TenantContext>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::BadRequest("Patient name must not be empty".to_string()));
    }

    let patient = registry
        .register_patient(scope.tenant_id, request.name.trim().to_string())
        .await;

    Ok((StatusCode::CREATED, Json(json!({ "patient": patient }))))
}

#[axum::debug_handler]
pub async fn register_dentist(
    State(registry): State<Arc<InMemoryRegistry>>,
    Extension(scope): Extension<TenantContext>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::BadRequest("Dentist name must not be empty".to_string()));
    }

    let dentist = registry
        .register_dentist(scope.tenant_id, request.name.trim().to_string())
        .await;

    Ok((StatusCode::CREATED, Json(json!({ "dentist": dentist }))))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(registry): State<Arc<InMemoryRegistry>>,
    Extension(scope): Extension<TenantContext>,
) -> Result<Json<Value>, AppError> {
    let patients = registry.list_patients(scope.tenant_id).await;
    Ok(Json(json!({ "patients": patients })))
}

#[axum::debug_handler]
pub async fn list_dentists(
    State(registry): State<Arc<InMemoryRegistry>>,
    Extension(scope): Extension<TenantContext>,
) -> Result<Json<Value>, AppError> {
    let dentists = registry.list_dentists(scope.tenant_id).await;
    Ok(Json(json!({ "dentists": dentists })))
}
