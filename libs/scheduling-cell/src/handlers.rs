// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::tenant::TenantContext;

use crate::models::{
    Appointment, AppointmentStatus, BookingOutcome, BookingRequest, ConflictResult, ListFilters,
    RescheduleRequest, SchedulingError, SuggestedSlot, TreatmentType,
};
use crate::services::engine::SchedulingEngine;

#[derive(Clone)]
pub struct SchedulingState {
    pub engine: Arc<SchedulingEngine>,
}

// ==============================================================================
// WIRE MODELS
// ==============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentBody {
    pub patient_id: Uuid,
    pub dentist_id: Uuid,
    pub date_time: DateTime<Utc>,
    pub duration: i32,
    #[serde(rename = "type")]
    pub treatment_type: TreatmentType,
    #[serde(default)]
    pub notes: Option<String>,
}

/// PATCH body: either a pure status change or a reschedule, never both in one
/// request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentBody {
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
    #[serde(default)]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Option<i32>,
    #[serde(default)]
    pub dentist_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQueryParams {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub dentist_id: Option<Uuid>,
    #[serde(default)]
    pub patient_id: Option<Uuid>,
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub dentist_id: Uuid,
    pub date_time: DateTime<Utc>,
    pub duration: i32,
    #[serde(rename = "type")]
    pub treatment_type: TreatmentType,
    pub status: AppointmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Appointment> for AppointmentView {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            patient_id: appointment.patient_id,
            dentist_id: appointment.dentist_id,
            date_time: appointment.start,
            duration: appointment.duration_minutes,
            treatment_type: appointment.treatment_type,
            status: appointment.status,
            notes: appointment.notes,
            room: appointment.room,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedTimeView {
    pub date_time: DateTime<Utc>,
    pub label: String,
}

impl From<SuggestedSlot> for SuggestedTimeView {
    fn from(slot: SuggestedSlot) -> Self {
        Self {
            date_time: slot.start,
            label: slot.label,
        }
    }
}

// ==============================================================================
// HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<SchedulingState>,
    Extension(scope): Extension<TenantContext>,
    Json(body): Json<BookAppointmentBody>,
) -> Result<Response, AppError> {
    let request = BookingRequest {
        patient_id: body.patient_id,
        dentist_id: body.dentist_id,
        start: body.date_time,
        duration_minutes: body.duration,
        treatment_type: body.treatment_type,
        notes: body.notes,
        room: None,
    };

    match state
        .engine
        .book(scope.tenant_id, request)
        .await
        .map_err(map_scheduling_error)?
    {
        BookingOutcome::Booked(appointment) => Ok((
            StatusCode::CREATED,
            Json(json!({ "appointment": AppointmentView::from(appointment) })),
        )
            .into_response()),
        BookingOutcome::Conflict(result) => Ok(conflict_response(result)),
    }
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<SchedulingState>,
    Extension(scope): Extension<TenantContext>,
    Query(params): Query<ListQueryParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (from, until) = match params.date {
        Some(date) => {
            let day_start = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
            (Some(day_start), Some(day_start + chrono::Duration::days(1)))
        }
        None => (None, None),
    };

    let filters = ListFilters {
        dentist_id: params.dentist_id,
        patient_id: params.patient_id,
        from,
        until,
        status: params.status,
    };

    let appointments = state
        .engine
        .list(scope.tenant_id, filters, scope.role, scope.user_id)
        .await
        .map_err(map_scheduling_error)?;

    let views: Vec<AppointmentView> = appointments.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "appointments": views })))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<SchedulingState>,
    Extension(scope): Extension<TenantContext>,
    Query(query): Query<IdQuery>,
    Json(body): Json<UpdateAppointmentBody>,
) -> Result<Response, AppError> {
    let wants_reschedule =
        body.date_time.is_some() || body.duration.is_some() || body.dentist_id.is_some();

    if body.status.is_some() && wants_reschedule {
        return Err(AppError::BadRequest(
            "Provide either status or reschedule fields, not both".to_string(),
        ));
    }

    if let Some(next) = body.status {
        let appointment = state
            .engine
            .transition(scope.tenant_id, query.id, next)
            .await
            .map_err(map_scheduling_error)?;
        return Ok(
            Json(json!({ "appointment": AppointmentView::from(appointment) })).into_response(),
        );
    }

    if wants_reschedule {
        let Some(new_start) = body.date_time else {
            return Err(AppError::BadRequest(
                "dateTime is required to reschedule".to_string(),
            ));
        };

        let request = RescheduleRequest {
            new_start,
            new_duration_minutes: body.duration,
            new_dentist_id: body.dentist_id,
        };

        return match state
            .engine
            .reschedule(scope.tenant_id, query.id, request)
            .await
            .map_err(map_scheduling_error)?
        {
            BookingOutcome::Booked(appointment) => Ok(Json(
                json!({ "appointment": AppointmentView::from(appointment) }),
            )
            .into_response()),
            BookingOutcome::Conflict(result) => Ok(conflict_response(result)),
        };
    }

    Err(AppError::BadRequest("Nothing to update".to_string()))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<SchedulingState>,
    Extension(scope): Extension<TenantContext>,
    Query(query): Query<IdQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !scope.role.is_admin() {
        return Err(AppError::Forbidden(
            "Only administrators may delete appointments".to_string(),
        ));
    }

    state
        .engine
        .delete(scope.tenant_id, query.id)
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({ "message": "Appointment deleted" })))
}

// ==============================================================================
// RESPONSE MAPPING
// ==============================================================================

fn conflict_response(result: ConflictResult) -> Response {
    let ConflictResult {
        message,
        suggestions,
    } = result;

    let mut body = json!({
        "error": "Appointment slot conflicts with an existing booking",
        "conflict": true,
        "message": message,
    });
    if !suggestions.is_empty() {
        let times: Vec<SuggestedTimeView> = suggestions.into_iter().map(Into::into).collect();
        body["suggestedTimes"] = json!(times);
    }

    (StatusCode::CONFLICT, Json(body)).into_response()
}

fn map_scheduling_error(err: SchedulingError) -> AppError {
    match err {
        SchedulingError::PatientNotFound
        | SchedulingError::DentistNotFound
        | SchedulingError::AppointmentNotFound => AppError::NotFound(err.to_string()),
        SchedulingError::InvalidInput(message) => AppError::BadRequest(message),
        SchedulingError::InvalidTransition { .. } => AppError::Conflict(err.to_string()),
        SchedulingError::Directory(inner) => {
            tracing::error!("Directory failure: {}", inner);
            AppError::Internal("Service temporarily unavailable".to_string())
        }
        SchedulingError::Store(inner) => {
            tracing::error!("Store failure: {}", inner);
            AppError::Internal("Service temporarily unavailable".to_string())
        }
    }
}
