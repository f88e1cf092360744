#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use directory_cell::registry::InMemoryRegistry;
use scheduling_cell::handlers::SchedulingState;
use scheduling_cell::models::{BookingRequest, TreatmentType};
use scheduling_cell::router::appointment_routes;
use scheduling_cell::services::engine::SchedulingEngine;
use scheduling_cell::store::{MemoryStore, RetryingStore};
use shared_utils::extractor::{ROLE_HEADER, TENANT_HEADER, USER_HEADER};

pub struct TestClinic {
    pub engine: Arc<SchedulingEngine>,
    pub registry: Arc<InMemoryRegistry>,
    pub tenant_id: Uuid,
    pub dentist_id: Uuid,
    pub patient_id: Uuid,
}

pub async fn clinic() -> TestClinic {
    let registry = Arc::new(InMemoryRegistry::new());
    let store = Arc::new(RetryingStore::new(
        MemoryStore::new(Duration::from_secs(5)),
        3,
    ));
    let engine = Arc::new(SchedulingEngine::new(
        store,
        registry.clone(),
        registry.clone(),
    ));

    let tenant_id = Uuid::new_v4();
    let dentist = registry
        .register_dentist(tenant_id, "Dr. Hart".to_string())
        .await;
    let patient = registry
        .register_patient(tenant_id, "Maria Keane".to_string())
        .await;

    TestClinic {
        engine,
        registry,
        tenant_id,
        dentist_id: dentist.id,
        patient_id: patient.id,
    }
}

impl TestClinic {
    pub fn app(&self) -> axum::Router {
        appointment_routes(SchedulingState {
            engine: self.engine.clone(),
        })
    }
}

pub fn at(rfc3339: &str) -> DateTime<Utc> {
    rfc3339.parse().unwrap()
}

pub fn booking(patient_id: Uuid, dentist_id: Uuid, start: &str, minutes: i32) -> BookingRequest {
    BookingRequest {
        patient_id,
        dentist_id,
        start: at(start),
        duration_minutes: minutes,
        treatment_type: TreatmentType::Checkup,
        notes: None,
        room: None,
    }
}

pub fn scoped_request(
    method: &str,
    uri: &str,
    tenant_id: Uuid,
    user_id: Uuid,
    role: &str,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(TENANT_HEADER, tenant_id.to_string())
        .header(USER_HEADER, user_id.to_string())
        .header(ROLE_HEADER, role);

    match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            builder
                .body(Body::from(serde_json::to_vec(&value).unwrap()))
                .unwrap()
        }
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
