// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use directory_cell::models::DirectoryError;

use crate::store::StoreError;

pub const MIN_DURATION_MINUTES: i32 = 15;
pub const MAX_DURATION_MINUTES: i32 = 480;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub patient_id: Uuid,
    pub dentist_id: Uuid,
    pub start: DateTime<Utc>,
    pub duration_minutes: i32,
    pub treatment_type: TreatmentType,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub room: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// The half-open slot this appointment occupies.
    pub fn interval(&self) -> Interval {
        Interval::starting_at(self.start, self.duration_minutes)
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::minutes(self.duration_minutes as i64)
    }
}

/// Half-open time range `[start, end)`. All overlap math runs on these; the
/// half-open end is what lets back-to-back appointments coexist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn starting_at(start: DateTime<Utc>, duration_minutes: i32) -> Self {
        Self {
            start,
            end: start + Duration::minutes(duration_minutes as i64),
        }
    }

    pub fn shifted(self, offset: Duration) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Whether an appointment in this status occupies the dentist's slot.
    /// CANCELLED frees the window; NO_SHOW keeps the historical record but
    /// also frees it for rebooking.
    pub fn blocks_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::NoShow)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "SCHEDULED"),
            AppointmentStatus::Confirmed => write!(f, "CONFIRMED"),
            AppointmentStatus::InProgress => write!(f, "IN_PROGRESS"),
            AppointmentStatus::Completed => write!(f, "COMPLETED"),
            AppointmentStatus::Cancelled => write!(f, "CANCELLED"),
            AppointmentStatus::NoShow => write!(f, "NO_SHOW"),
        }
    }
}

/// Treatment categories. Informational to the scheduling core: no timing or
/// conflict rule depends on the variant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentType {
    Checkup,
    Cleaning,
    Filling,
    RootCanal,
    Extraction,
    Crown,
    Orthodontics,
    Emergency,
}

impl fmt::Display for TreatmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreatmentType::Checkup => write!(f, "checkup"),
            TreatmentType::Cleaning => write!(f, "cleaning"),
            TreatmentType::Filling => write!(f, "filling"),
            TreatmentType::RootCanal => write!(f, "root_canal"),
            TreatmentType::Extraction => write!(f, "extraction"),
            TreatmentType::Crown => write!(f, "crown"),
            TreatmentType::Orthodontics => write!(f, "orthodontics"),
            TreatmentType::Emergency => write!(f, "emergency"),
        }
    }
}

// ==============================================================================
// ENGINE REQUEST/OUTCOME MODELS
// ==============================================================================

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub patient_id: Uuid,
    pub dentist_id: Uuid,
    pub start: DateTime<Utc>,
    pub duration_minutes: i32,
    pub treatment_type: TreatmentType,
    pub notes: Option<String>,
    pub room: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RescheduleRequest {
    pub new_start: DateTime<Utc>,
    pub new_duration_minutes: Option<i32>,
    pub new_dentist_id: Option<Uuid>,
}

/// A booking or reschedule attempt resolves to one of these. A conflict is a
/// normal outcome of concurrent clinic life, not an error.
#[derive(Debug, Clone)]
pub enum BookingOutcome {
    Booked(Appointment),
    Conflict(ConflictResult),
}

#[derive(Debug, Clone, Serialize)]
pub struct ConflictResult {
    pub message: String,
    pub suggestions: Vec<SuggestedSlot>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SuggestedSlot {
    pub start: DateTime<Utc>,
    pub label: String,
}

#[derive(Debug, Clone, Default)]
pub struct ListFilters {
    pub dentist_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<AppointmentStatus>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("Patient not found")]
    PatientNotFound,

    #[error("Dentist not found")]
    DentistNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Directory unavailable: {0}")]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Duration bounds apply to both booking and rescheduling, before any store
/// access.
pub fn validate_duration(duration_minutes: i32) -> Result<(), SchedulingError> {
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
        return Err(SchedulingError::InvalidInput(format!(
            "duration must be between {} and {} minutes",
            MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
        )));
    }
    Ok(())
}
