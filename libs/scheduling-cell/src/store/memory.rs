// libs/scheduling-cell/src/store/memory.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, Interval, ListFilters};
use crate::services::overlap;
use crate::store::{AppointmentStore, InsertAttempt, MoveAttempt, StatusSwap, StoreError};

type TenantPartition = HashMap<Uuid, Appointment>;
type SlotKey = (Uuid, Uuid); // (tenant_id, dentist_id)

/// In-process implementation of the store contract.
///
/// Atomicity strategy: one advisory lock per (tenant, dentist) pair, held
/// across the conflict fetch, the overlap check and the mutation. Two
/// concurrent bookings for the same dentist serialize on the lock; bookings
/// for different dentists (or tenants) proceed independently, which is safe
/// because conflicts can only arise within one (tenant, dentist) calendar.
///
/// Every lock acquisition is bounded by `op_timeout`; past it the operation
/// surfaces as transient rather than blocking the caller indefinitely.
pub struct MemoryStore {
    appointments: RwLock<HashMap<Uuid, TenantPartition>>,
    slot_locks: Mutex<HashMap<SlotKey, Arc<Mutex<()>>>>,
    op_timeout: Duration,
}

impl MemoryStore {
    pub fn new(op_timeout: Duration) -> Self {
        Self {
            appointments: RwLock::new(HashMap::new()),
            slot_locks: Mutex::new(HashMap::new()),
            op_timeout,
        }
    }

    async fn slot_guard(
        &self,
        tenant_id: Uuid,
        dentist_id: Uuid,
    ) -> Result<OwnedMutexGuard<()>, StoreError> {
        let lock = {
            let mut locks = timeout(self.op_timeout, self.slot_locks.lock())
                .await
                .map_err(|_| StoreError::Transient("slot lock table timed out".to_string()))?;
            locks
                .entry((tenant_id, dentist_id))
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        timeout(self.op_timeout, lock.lock_owned())
            .await
            .map_err(|_| {
                warn!(
                    "Timed out waiting for dentist {} slot lock (tenant {})",
                    dentist_id, tenant_id
                );
                StoreError::Transient("dentist slot lock timed out".to_string())
            })
    }

    async fn read(
        &self,
    ) -> Result<RwLockReadGuard<'_, HashMap<Uuid, TenantPartition>>, StoreError> {
        timeout(self.op_timeout, self.appointments.read())
            .await
            .map_err(|_| StoreError::Transient("store read timed out".to_string()))
    }

    async fn write(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<Uuid, TenantPartition>>, StoreError> {
        timeout(self.op_timeout, self.appointments.write())
            .await
            .map_err(|_| StoreError::Transient("store write timed out".to_string()))
    }

    /// The bounded conflict set: slot-blocking appointments for the dentist
    /// whose start falls inside the scan window. Tenant and dentist are both
    /// part of the filter; dentist ids are never assumed unique across
    /// tenants.
    fn conflict_set(
        partition: Option<&TenantPartition>,
        dentist_id: Uuid,
        candidate: Interval,
        exclude: Option<Uuid>,
    ) -> Vec<Appointment> {
        let window = overlap::conflict_scan_window(candidate);
        let Some(partition) = partition else {
            return Vec::new();
        };

        let mut set: Vec<Appointment> = partition
            .values()
            .filter(|a| a.dentist_id == dentist_id)
            .filter(|a| a.status.blocks_slot())
            .filter(|a| a.start >= window.start && a.start <= window.end)
            .filter(|a| Some(a.id) != exclude)
            .cloned()
            .collect();
        set.sort_by(|a, b| a.start.cmp(&b.start));
        set
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let appointments = self.read().await?;
        Ok(appointments
            .get(&tenant_id)
            .and_then(|partition| partition.get(&id))
            .cloned())
    }

    async fn check_and_insert(&self, candidate: Appointment) -> Result<InsertAttempt, StoreError> {
        let _guard = self
            .slot_guard(candidate.tenant_id, candidate.dentist_id)
            .await?;

        let conflict_set = {
            let appointments = self.read().await?;
            Self::conflict_set(
                appointments.get(&candidate.tenant_id),
                candidate.dentist_id,
                candidate.interval(),
                None,
            )
        };

        if overlap::has_conflict(candidate.interval(), &conflict_set) {
            debug!(
                "Booking conflict for dentist {} at {} ({} booking(s) in window)",
                candidate.dentist_id,
                candidate.start,
                conflict_set.len()
            );
            return Ok(InsertAttempt::Conflicted(conflict_set));
        }

        let mut appointments = self.write().await?;
        appointments
            .entry(candidate.tenant_id)
            .or_default()
            .insert(candidate.id, candidate.clone());
        Ok(InsertAttempt::Inserted(candidate))
    }

    async fn check_and_move(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        new_start: DateTime<Utc>,
        new_duration_minutes: i32,
        new_dentist_id: Option<Uuid>,
    ) -> Result<MoveAttempt, StoreError> {
        // Resolve the target dentist before locking; re-read under the lock
        // since the row may change while we wait.
        let target_dentist = {
            let appointments = self.read().await?;
            match appointments.get(&tenant_id).and_then(|p| p.get(&id)) {
                Some(current) => new_dentist_id.unwrap_or(current.dentist_id),
                None => return Ok(MoveAttempt::Missing),
            }
        };

        let _guard = self.slot_guard(tenant_id, target_dentist).await?;

        let candidate = Interval::starting_at(new_start, new_duration_minutes);
        let conflict_set = {
            let appointments = self.read().await?;
            if appointments.get(&tenant_id).and_then(|p| p.get(&id)).is_none() {
                return Ok(MoveAttempt::Missing);
            }
            Self::conflict_set(
                appointments.get(&tenant_id),
                target_dentist,
                candidate,
                Some(id),
            )
        };

        if overlap::has_conflict(candidate, &conflict_set) {
            return Ok(MoveAttempt::Conflicted(conflict_set));
        }

        let mut appointments = self.write().await?;
        let Some(appointment) = appointments
            .get_mut(&tenant_id)
            .and_then(|partition| partition.get_mut(&id))
        else {
            return Ok(MoveAttempt::Missing);
        };

        appointment.start = new_start;
        appointment.duration_minutes = new_duration_minutes;
        appointment.dentist_id = target_dentist;
        appointment.updated_at = Utc::now();
        Ok(MoveAttempt::Moved(appointment.clone()))
    }

    async fn swap_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        expected: AppointmentStatus,
        next: AppointmentStatus,
    ) -> Result<StatusSwap, StoreError> {
        let mut appointments = self.write().await?;
        let Some(appointment) = appointments
            .get_mut(&tenant_id)
            .and_then(|partition| partition.get_mut(&id))
        else {
            return Ok(StatusSwap::Missing);
        };

        if appointment.status != expected {
            return Ok(StatusSwap::Raced(appointment.clone()));
        }

        appointment.status = next;
        appointment.updated_at = Utc::now();
        Ok(StatusSwap::Swapped(appointment.clone()))
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        filters: &ListFilters,
    ) -> Result<Vec<Appointment>, StoreError> {
        let appointments = self.read().await?;
        let mut listed: Vec<Appointment> = appointments
            .get(&tenant_id)
            .map(|partition| {
                partition
                    .values()
                    .filter(|a| filters.dentist_id.map_or(true, |d| a.dentist_id == d))
                    .filter(|a| filters.patient_id.map_or(true, |p| a.patient_id == p))
                    .filter(|a| filters.status.map_or(true, |s| a.status == s))
                    .filter(|a| filters.from.map_or(true, |from| a.start >= from))
                    .filter(|a| filters.until.map_or(true, |until| a.start < until))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        listed.sort_by(|a, b| a.start.cmp(&b.start));
        Ok(listed)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut appointments = self.write().await?;
        Ok(appointments
            .get_mut(&tenant_id)
            .and_then(|partition| partition.remove(&id))
            .is_some())
    }
}
