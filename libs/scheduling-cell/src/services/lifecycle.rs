// libs/scheduling-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentStatus, SchedulingError};

/// Validates appointment lifecycle transitions. Every status change goes
/// through here, including direct status-only updates; there is no unchecked
/// overwrite path.
pub struct StatusMachine;

impl StatusMachine {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(
        &self,
        current: AppointmentStatus,
        next: AppointmentStatus,
    ) -> Result<(), SchedulingError> {
        debug!("Validating status transition {} -> {}", current, next);

        if !self.valid_transitions(current).contains(&next) {
            warn!("Rejected status transition {} -> {}", current, next);
            return Err(SchedulingError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        Ok(())
    }

    /// The allowed next statuses. Happy path is SCHEDULED -> CONFIRMED ->
    /// IN_PROGRESS -> COMPLETED; every non-terminal state may also move to
    /// CANCELLED or NO_SHOW. Terminal states have no outgoing edges;
    /// un-cancelling means booking a new appointment.
    pub fn valid_transitions(&self, current: AppointmentStatus) -> &'static [AppointmentStatus] {
        match current {
            AppointmentStatus::Scheduled => &[
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::Confirmed => &[
                AppointmentStatus::InProgress,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::InProgress => &[
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::Completed
            | AppointmentStatus::Cancelled
            | AppointmentStatus::NoShow => &[],
        }
    }
}

impl Default for StatusMachine {
    fn default() -> Self {
        Self::new()
    }
}
