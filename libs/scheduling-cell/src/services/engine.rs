// libs/scheduling-cell/src/services/engine.rs
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use directory_cell::registry::{DentistDirectory, PatientDirectory};
use shared_models::tenant::CallerRole;

use crate::models::{
    validate_duration, Appointment, AppointmentStatus, BookingOutcome, BookingRequest,
    ConflictResult, ListFilters, RescheduleRequest, SchedulingError,
};
use crate::services::lifecycle::StatusMachine;
use crate::services::suggestion::SuggestionPlanner;
use crate::store::{AppointmentStore, InsertAttempt, MoveAttempt, StatusSwap, StoreError};

/// Bounded retries when a status compare-and-swap loses to a concurrent
/// writer. Each retry re-validates the transition against the winner.
const STATUS_RACE_RETRIES: u32 = 3;

const DEFAULT_LIST_WINDOW_DAYS: i64 = 60;

/// Orchestrates conflict detection, slot suggestion and the status lifecycle
/// over the store. Stateless between calls: every piece of shared state lives
/// behind the store, so any number of engine instances (or clones of one) can
/// serve requests concurrently.
pub struct SchedulingEngine {
    store: Arc<dyn AppointmentStore>,
    patients: Arc<dyn PatientDirectory>,
    dentists: Arc<dyn DentistDirectory>,
    planner: SuggestionPlanner,
    status_machine: StatusMachine,
    list_window: Duration,
}

impl SchedulingEngine {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        patients: Arc<dyn PatientDirectory>,
        dentists: Arc<dyn DentistDirectory>,
    ) -> Self {
        Self {
            store,
            patients,
            dentists,
            planner: SuggestionPlanner::new(),
            status_machine: StatusMachine::new(),
            list_window: Duration::days(DEFAULT_LIST_WINDOW_DAYS),
        }
    }

    pub fn with_list_window_days(mut self, days: i64) -> Self {
        self.list_window = Duration::days(days);
        self
    }

    /// Book a new appointment. On success exactly one row is inserted with
    /// initial status SCHEDULED; on conflict nothing is mutated and the
    /// outcome carries up to two alternative windows.
    pub async fn book(
        &self,
        tenant_id: Uuid,
        request: BookingRequest,
    ) -> Result<BookingOutcome, SchedulingError> {
        validate_duration(request.duration_minutes)?;

        if !self.dentists.exists(tenant_id, request.dentist_id).await? {
            return Err(SchedulingError::DentistNotFound);
        }
        if !self.patients.exists(tenant_id, request.patient_id).await? {
            return Err(SchedulingError::PatientNotFound);
        }

        let now = Utc::now();
        let candidate = Appointment {
            id: Uuid::new_v4(),
            tenant_id,
            patient_id: request.patient_id,
            dentist_id: request.dentist_id,
            start: request.start,
            duration_minutes: request.duration_minutes,
            treatment_type: request.treatment_type,
            status: AppointmentStatus::Scheduled,
            notes: request.notes,
            room: request.room,
            created_at: now,
            updated_at: now,
        };
        let requested = candidate.interval();

        match self.store.check_and_insert(candidate).await? {
            InsertAttempt::Inserted(appointment) => {
                info!(
                    "Booked appointment {} for dentist {} at {}",
                    appointment.id, appointment.dentist_id, appointment.start
                );
                Ok(BookingOutcome::Booked(appointment))
            }
            InsertAttempt::Conflicted(conflict_set) => {
                let suggestions = self.planner.propose(requested, &conflict_set);
                debug!(
                    "Booking conflict at {}; {} suggestion(s)",
                    requested.start,
                    suggestions.len()
                );
                Ok(BookingOutcome::Conflict(ConflictResult {
                    message: conflict_message(&suggestions),
                    suggestions,
                }))
            }
        }
    }

    /// Apply a lifecycle transition. The validate-and-swap loop retries a
    /// bounded number of times when a concurrent writer changes the status
    /// between our read and our swap; validation always runs against the
    /// latest observed state.
    pub async fn transition(
        &self,
        tenant_id: Uuid,
        appointment_id: Uuid,
        next: AppointmentStatus,
    ) -> Result<Appointment, SchedulingError> {
        for _ in 0..STATUS_RACE_RETRIES {
            let current = self
                .store
                .get(tenant_id, appointment_id)
                .await?
                .ok_or(SchedulingError::AppointmentNotFound)?;

            self.status_machine.validate(current.status, next)?;

            match self
                .store
                .swap_status(tenant_id, appointment_id, current.status, next)
                .await?
            {
                StatusSwap::Swapped(appointment) => {
                    info!(
                        "Appointment {} transitioned {} -> {}",
                        appointment_id, current.status, next
                    );
                    return Ok(appointment);
                }
                StatusSwap::Missing => return Err(SchedulingError::AppointmentNotFound),
                StatusSwap::Raced(winner) => {
                    debug!(
                        "Status swap raced on appointment {} (now {}), revalidating",
                        appointment_id, winner.status
                    );
                }
            }
        }

        warn!(
            "Status update on appointment {} kept racing after {} attempts",
            appointment_id, STATUS_RACE_RETRIES
        );
        Err(SchedulingError::Store(StoreError::Transient(
            "status update kept racing".to_string(),
        )))
    }

    /// Move an appointment to a new window (and optionally a new dentist),
    /// re-running the full conflict check with the appointment excluded from
    /// its own conflict set.
    pub async fn reschedule(
        &self,
        tenant_id: Uuid,
        appointment_id: Uuid,
        request: RescheduleRequest,
    ) -> Result<BookingOutcome, SchedulingError> {
        let current = self
            .store
            .get(tenant_id, appointment_id)
            .await?
            .ok_or(SchedulingError::AppointmentNotFound)?;

        if current.status.is_terminal() {
            return Err(SchedulingError::InvalidInput(format!(
                "cannot reschedule an appointment in terminal status {}",
                current.status
            )));
        }

        let duration = request
            .new_duration_minutes
            .unwrap_or(current.duration_minutes);
        validate_duration(duration)?;

        if let Some(dentist_id) = request.new_dentist_id {
            if dentist_id != current.dentist_id
                && !self.dentists.exists(tenant_id, dentist_id).await?
            {
                return Err(SchedulingError::DentistNotFound);
            }
        }

        let requested =
            crate::models::Interval::starting_at(request.new_start, duration);

        match self
            .store
            .check_and_move(
                tenant_id,
                appointment_id,
                request.new_start,
                duration,
                request.new_dentist_id,
            )
            .await?
        {
            MoveAttempt::Moved(appointment) => {
                info!(
                    "Rescheduled appointment {} to {} ({} min)",
                    appointment.id, appointment.start, appointment.duration_minutes
                );
                Ok(BookingOutcome::Booked(appointment))
            }
            MoveAttempt::Conflicted(conflict_set) => {
                let suggestions = self.planner.propose(requested, &conflict_set);
                Ok(BookingOutcome::Conflict(ConflictResult {
                    message: conflict_message(&suggestions),
                    suggestions,
                }))
            }
            MoveAttempt::Missing => Err(SchedulingError::AppointmentNotFound),
        }
    }

    /// Tenant-scoped listing. A dentist caller is always pinned to their own
    /// calendar, whatever filter they supplied; without a date range the
    /// configured forward window applies.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        mut filters: ListFilters,
        caller_role: CallerRole,
        caller_user_id: Uuid,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        if caller_role == CallerRole::Dentist {
            filters.dentist_id = Some(caller_user_id);
        }

        if filters.from.is_none() && filters.until.is_none() {
            let now = Utc::now();
            filters.from = Some(now);
            filters.until = Some(now + self.list_window);
        }

        Ok(self.store.list(tenant_id, &filters).await?)
    }

    pub async fn get(
        &self,
        tenant_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        self.store
            .get(tenant_id, appointment_id)
            .await?
            .ok_or(SchedulingError::AppointmentNotFound)
    }

    /// Administrative hard delete: removes the row outright, bypassing the
    /// status machine. Role enforcement happens at the HTTP boundary.
    pub async fn delete(
        &self,
        tenant_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<(), SchedulingError> {
        if self.store.delete(tenant_id, appointment_id).await? {
            info!("Hard-deleted appointment {}", appointment_id);
            Ok(())
        } else {
            Err(SchedulingError::AppointmentNotFound)
        }
    }
}

fn conflict_message(suggestions: &[crate::models::SuggestedSlot]) -> String {
    if suggestions.is_empty() {
        "The requested time conflicts with an existing appointment and no nearby slot is available"
            .to_string()
    } else {
        "The requested time conflicts with an existing appointment".to_string()
    }
}
