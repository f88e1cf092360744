mod common;

use assert_matches::assert_matches;
use chrono::Duration;
use uuid::Uuid;

use common::{at, booking, clinic};
use scheduling_cell::models::{
    AppointmentStatus, BookingOutcome, BookingRequest, ListFilters, RescheduleRequest,
    SchedulingError, TreatmentType,
};
use scheduling_cell::services::suggestion::{LABEL_AFTER, LABEL_BEFORE};
use shared_models::tenant::CallerRole;

#[tokio::test]
async fn back_to_back_bookings_both_succeed() {
    let clinic = clinic().await;

    let first = clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T09:00:00Z", 60),
        )
        .await
        .unwrap();
    let second = clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T10:00:00Z", 60),
        )
        .await
        .unwrap();

    assert_matches!(first, BookingOutcome::Booked(_));
    assert_matches!(second, BookingOutcome::Booked(_));
}

#[tokio::test]
async fn one_minute_overlap_conflicts_but_boundary_does_not() {
    let clinic = clinic().await;

    clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T09:00:00Z", 60),
        )
        .await
        .unwrap();

    let overlapping = clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T09:59:00Z", 31),
        )
        .await
        .unwrap();
    assert_matches!(overlapping, BookingOutcome::Conflict(_));

    let boundary = clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T10:00:00Z", 30),
        )
        .await
        .unwrap();
    assert_matches!(boundary, BookingOutcome::Booked(_));
}

#[tokio::test]
async fn conflict_carries_ordered_suggestions() {
    let clinic = clinic().await;

    clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T09:00:00Z", 60),
        )
        .await
        .unwrap();

    let outcome = clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T09:30:00Z", 30),
        )
        .await
        .unwrap();

    let BookingOutcome::Conflict(result) = outcome else {
        panic!("expected a conflict");
    };
    assert_eq!(result.suggestions.len(), 2);
    assert_eq!(result.suggestions[0].start, at("2024-06-01T08:30:00Z"));
    assert_eq!(result.suggestions[0].label, LABEL_BEFORE);
    assert_eq!(result.suggestions[1].start, at("2024-06-01T10:30:00Z"));
    assert_eq!(result.suggestions[1].label, LABEL_AFTER);
}

#[tokio::test]
async fn fully_booked_neighbourhood_reports_no_nearby_slot() {
    let clinic = clinic().await;

    // One long block covering the requested window and both ±1h candidates.
    clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T08:00:00Z", 240),
        )
        .await
        .unwrap();

    let outcome = clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T09:30:00Z", 30),
        )
        .await
        .unwrap();

    let BookingOutcome::Conflict(result) = outcome else {
        panic!("expected a conflict");
    };
    assert!(result.suggestions.is_empty());
    assert!(result.message.contains("no nearby slot"));
}

#[tokio::test]
async fn cancelled_appointment_frees_the_slot() {
    let clinic = clinic().await;

    let outcome = clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T09:00:00Z", 60),
        )
        .await
        .unwrap();
    let BookingOutcome::Booked(appointment) = outcome else {
        panic!("expected a booking");
    };

    clinic
        .engine
        .transition(clinic.tenant_id, appointment.id, AppointmentStatus::Cancelled)
        .await
        .unwrap();

    let rebooked = clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T09:00:00Z", 60),
        )
        .await
        .unwrap();
    assert_matches!(rebooked, BookingOutcome::Booked(_));
}

#[tokio::test]
async fn no_show_appointment_frees_the_slot() {
    let clinic = clinic().await;

    let outcome = clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T09:00:00Z", 60),
        )
        .await
        .unwrap();
    let BookingOutcome::Booked(appointment) = outcome else {
        panic!("expected a booking");
    };

    clinic
        .engine
        .transition(clinic.tenant_id, appointment.id, AppointmentStatus::NoShow)
        .await
        .unwrap();

    let rebooked = clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T09:30:00Z", 30),
        )
        .await
        .unwrap();
    assert_matches!(rebooked, BookingOutcome::Booked(_));
}

#[tokio::test]
async fn transitions_outside_the_graph_are_rejected() {
    let clinic = clinic().await;

    let outcome = clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T09:00:00Z", 30),
        )
        .await
        .unwrap();
    let BookingOutcome::Booked(appointment) = outcome else {
        panic!("expected a booking");
    };

    // Skipping CONFIRMED/IN_PROGRESS.
    let skipped = clinic
        .engine
        .transition(clinic.tenant_id, appointment.id, AppointmentStatus::Completed)
        .await;
    assert_matches!(skipped, Err(SchedulingError::InvalidTransition { .. }));

    // Terminal states have no exit.
    clinic
        .engine
        .transition(clinic.tenant_id, appointment.id, AppointmentStatus::Cancelled)
        .await
        .unwrap();
    for next in [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
    ] {
        let reverted = clinic
            .engine
            .transition(clinic.tenant_id, appointment.id, next)
            .await;
        assert_matches!(reverted, Err(SchedulingError::InvalidTransition { .. }));
    }
}

#[tokio::test]
async fn happy_path_lifecycle_completes() {
    let clinic = clinic().await;

    let outcome = clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T09:00:00Z", 30),
        )
        .await
        .unwrap();
    let BookingOutcome::Booked(appointment) = outcome else {
        panic!("expected a booking");
    };

    for next in [
        AppointmentStatus::Confirmed,
        AppointmentStatus::InProgress,
        AppointmentStatus::Completed,
    ] {
        let updated = clinic
            .engine
            .transition(clinic.tenant_id, appointment.id, next)
            .await
            .unwrap();
        assert_eq!(updated.status, next);
    }
}

#[tokio::test]
async fn duration_bounds_are_enforced_before_any_store_access() {
    let clinic = clinic().await;

    for minutes in [0, 14, 481] {
        let rejected = clinic
            .engine
            .book(
                clinic.tenant_id,
                booking(
                    clinic.patient_id,
                    clinic.dentist_id,
                    "2024-06-01T09:00:00Z",
                    minutes,
                ),
            )
            .await;
        assert_matches!(rejected, Err(SchedulingError::InvalidInput(_)));
    }
}

#[tokio::test]
async fn unknown_dentist_and_patient_are_not_found() {
    let clinic = clinic().await;

    let no_dentist = clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, Uuid::new_v4(), "2024-06-01T09:00:00Z", 30),
        )
        .await;
    assert_matches!(no_dentist, Err(SchedulingError::DentistNotFound));

    let no_patient = clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(Uuid::new_v4(), clinic.dentist_id, "2024-06-01T09:00:00Z", 30),
        )
        .await;
    assert_matches!(no_patient, Err(SchedulingError::PatientNotFound));
}

#[tokio::test]
async fn reschedule_excludes_the_moved_appointment_from_its_own_conflicts() {
    let clinic = clinic().await;

    let outcome = clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T09:00:00Z", 60),
        )
        .await
        .unwrap();
    let BookingOutcome::Booked(appointment) = outcome else {
        panic!("expected a booking");
    };

    // Shift by 30 minutes: the new window overlaps the old one, which must
    // not count against itself.
    let moved = clinic
        .engine
        .reschedule(
            clinic.tenant_id,
            appointment.id,
            RescheduleRequest {
                new_start: at("2024-06-01T09:30:00Z"),
                new_duration_minutes: None,
                new_dentist_id: None,
            },
        )
        .await
        .unwrap();

    let BookingOutcome::Booked(updated) = moved else {
        panic!("expected the reschedule to land");
    };
    assert_eq!(updated.start, at("2024-06-01T09:30:00Z"));
    assert_eq!(updated.duration_minutes, 60);
}

#[tokio::test]
async fn reschedule_onto_another_booking_conflicts() {
    let clinic = clinic().await;

    clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T09:00:00Z", 60),
        )
        .await
        .unwrap();
    let outcome = clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T11:00:00Z", 60),
        )
        .await
        .unwrap();
    let BookingOutcome::Booked(second) = outcome else {
        panic!("expected a booking");
    };

    let moved = clinic
        .engine
        .reschedule(
            clinic.tenant_id,
            second.id,
            RescheduleRequest {
                new_start: at("2024-06-01T09:30:00Z"),
                new_duration_minutes: Some(30),
                new_dentist_id: None,
            },
        )
        .await
        .unwrap();

    assert_matches!(moved, BookingOutcome::Conflict(_));
}

#[tokio::test]
async fn reschedule_of_missing_or_terminal_appointments_is_rejected() {
    let clinic = clinic().await;

    let missing = clinic
        .engine
        .reschedule(
            clinic.tenant_id,
            Uuid::new_v4(),
            RescheduleRequest {
                new_start: at("2024-06-01T09:00:00Z"),
                new_duration_minutes: None,
                new_dentist_id: None,
            },
        )
        .await;
    assert_matches!(missing, Err(SchedulingError::AppointmentNotFound));

    let outcome = clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T09:00:00Z", 30),
        )
        .await
        .unwrap();
    let BookingOutcome::Booked(appointment) = outcome else {
        panic!("expected a booking");
    };
    clinic
        .engine
        .transition(clinic.tenant_id, appointment.id, AppointmentStatus::Cancelled)
        .await
        .unwrap();

    let terminal = clinic
        .engine
        .reschedule(
            clinic.tenant_id,
            appointment.id,
            RescheduleRequest {
                new_start: at("2024-06-01T10:00:00Z"),
                new_duration_minutes: None,
                new_dentist_id: None,
            },
        )
        .await;
    assert_matches!(terminal, Err(SchedulingError::InvalidInput(_)));
}

#[tokio::test]
async fn bookings_in_one_tenant_never_conflict_with_another() {
    let clinic = clinic().await;
    let other_tenant = Uuid::new_v4();
    let other_dentist = clinic
        .registry
        .register_dentist(other_tenant, "Dr. Hart".to_string())
        .await;
    let other_patient = clinic
        .registry
        .register_patient(other_tenant, "Maria Keane".to_string())
        .await;

    clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T09:00:00Z", 60),
        )
        .await
        .unwrap();

    // Same wall-clock window, different tenant: no interference.
    let outcome = clinic
        .engine
        .book(
            other_tenant,
            booking(other_patient.id, other_dentist.id, "2024-06-01T09:00:00Z", 60),
        )
        .await
        .unwrap();
    assert_matches!(outcome, BookingOutcome::Booked(_));

    // Listing tenant B never shows tenant A's rows.
    let listed = clinic
        .engine
        .list(
            other_tenant,
            ListFilters {
                from: Some(at("2024-06-01T00:00:00Z")),
                until: Some(at("2024-06-02T00:00:00Z")),
                ..Default::default()
            },
            CallerRole::Receptionist,
            Uuid::new_v4(),
        )
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].tenant_id, other_tenant);
}

#[tokio::test]
async fn dentist_callers_are_pinned_to_their_own_calendar() {
    let clinic = clinic().await;
    let colleague = clinic
        .registry
        .register_dentist(clinic.tenant_id, "Dr. Voss".to_string())
        .await;

    clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T09:00:00Z", 30),
        )
        .await
        .unwrap();
    clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, colleague.id, "2024-06-01T09:00:00Z", 30),
        )
        .await
        .unwrap();

    // The dentist asks for a colleague's calendar; the filter is overridden.
    let listed = clinic
        .engine
        .list(
            clinic.tenant_id,
            ListFilters {
                dentist_id: Some(colleague.id),
                from: Some(at("2024-06-01T00:00:00Z")),
                until: Some(at("2024-06-02T00:00:00Z")),
                ..Default::default()
            },
            CallerRole::Dentist,
            clinic.dentist_id,
        )
        .await
        .unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].dentist_id, clinic.dentist_id);
}

#[tokio::test]
async fn default_list_window_looks_forward_only() {
    let clinic = clinic().await;

    // One booking far in the past, one inside the forward window.
    clinic
        .engine
        .book(
            clinic.tenant_id,
            booking(clinic.patient_id, clinic.dentist_id, "2024-06-01T09:00:00Z", 30),
        )
        .await
        .unwrap();
    let soon = chrono::Utc::now() + Duration::days(7);
    let outcome = clinic
        .engine
        .book(
            clinic.tenant_id,
            BookingRequest {
                patient_id: clinic.patient_id,
                dentist_id: clinic.dentist_id,
                start: soon,
                duration_minutes: 30,
                treatment_type: TreatmentType::Checkup,
                notes: None,
                room: None,
            },
        )
        .await
        .unwrap();
    assert_matches!(outcome, BookingOutcome::Booked(_));

    let listed = clinic
        .engine
        .list(
            clinic.tenant_id,
            ListFilters::default(),
            CallerRole::Receptionist,
            Uuid::new_v4(),
        )
        .await
        .unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].start, soon);
}

