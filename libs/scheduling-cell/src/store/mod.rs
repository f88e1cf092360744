// libs/scheduling-cell/src/store/mod.rs
pub mod memory;
pub mod retry;

pub use memory::MemoryStore;
pub use retry::RetryingStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, ListFilters};

/// Store-level failure. Everything here is infrastructure trouble; domain
/// outcomes (conflicts, missing rows, lost races) travel in the attempt enums
/// below so callers cannot confuse the two.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("transient store failure: {0}")]
    Transient(String),
}

/// Outcome of an atomic check-and-insert. `Conflicted` carries the bounded
/// conflict set fetched for the dentist (all slot-blocking appointments whose
/// start falls inside the scan window), so the caller can plan alternatives
/// without a second round trip.
#[derive(Debug)]
pub enum InsertAttempt {
    Inserted(Appointment),
    Conflicted(Vec<Appointment>),
}

/// Outcome of an atomic check-and-move (reschedule).
#[derive(Debug)]
pub enum MoveAttempt {
    Moved(Appointment),
    Conflicted(Vec<Appointment>),
    Missing,
}

/// Outcome of a compare-and-swap status update. `Raced` returns the current
/// row so the caller can re-validate against the winner and retry.
#[derive(Debug)]
pub enum StatusSwap {
    Swapped(Appointment),
    Raced(Appointment),
    Missing,
}

/// Durable, tenant-partitioned appointment storage. Every method takes the
/// tenant id and never looks outside that partition. The check-and-* methods
/// are the concurrency boundary: each one runs its conflict check and its
/// mutation atomically with respect to other calls for the same
/// (tenant, dentist) pair.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// Atomically fetch the bounded conflict set for the candidate's dentist,
    /// run the overlap check, and insert only when the window is free.
    async fn check_and_insert(&self, candidate: Appointment) -> Result<InsertAttempt, StoreError>;

    /// Atomically re-check the target window (excluding the appointment being
    /// moved) and update start/duration/dentist in place when free.
    async fn check_and_move(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        new_start: DateTime<Utc>,
        new_duration_minutes: i32,
        new_dentist_id: Option<Uuid>,
    ) -> Result<MoveAttempt, StoreError>;

    /// Compare-and-swap the status field. No conflict re-check: a pure status
    /// change never widens an occupied window.
    async fn swap_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        expected: AppointmentStatus,
        next: AppointmentStatus,
    ) -> Result<StatusSwap, StoreError>;

    async fn list(
        &self,
        tenant_id: Uuid,
        filters: &ListFilters,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// Administrative hard delete. Returns whether a row was removed.
    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, StoreError>;
}
