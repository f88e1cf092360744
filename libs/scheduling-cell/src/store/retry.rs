// libs/scheduling-cell/src/store/retry.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, ListFilters};
use crate::store::{AppointmentStore, InsertAttempt, MoveAttempt, StatusSwap, StoreError};

const BASE_BACKOFF_MS: u64 = 50;
const MAX_JITTER_MS: u64 = 25;

/// Decorator retrying transient failures of the wrapped store. Only
/// `StoreError::Transient` is retried; domain outcomes (conflicts, missing
/// rows, races) pass straight through, they are answers, not failures.
pub struct RetryingStore<S> {
    inner: S,
    max_attempts: u32,
}

impl<S> RetryingStore<S> {
    pub fn new(inner: S, max_attempts: u32) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
        }
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let exponential = BASE_BACKOFF_MS << (attempt - 1).min(4);
    let jitter = rand::thread_rng().gen_range(0..MAX_JITTER_MS);
    Duration::from_millis(exponential + jitter)
}

macro_rules! with_retries {
    ($self:ident, $op:literal, $call:expr) => {{
        let mut attempt: u32 = 1;
        loop {
            match $call {
                Ok(value) => break Ok(value),
                Err(StoreError::Transient(reason)) if attempt < $self.max_attempts => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        "{} failed transiently ({}); retry {}/{} after {:?}",
                        $op,
                        reason,
                        attempt,
                        $self.max_attempts - 1,
                        delay
                    );
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(err) => break Err(err),
            }
        }
    }};
}

#[async_trait]
impl<S: AppointmentStore> AppointmentStore for RetryingStore<S> {
    async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        with_retries!(self, "get", self.inner.get(tenant_id, id).await)
    }

    async fn check_and_insert(&self, candidate: Appointment) -> Result<InsertAttempt, StoreError> {
        with_retries!(
            self,
            "check_and_insert",
            self.inner.check_and_insert(candidate.clone()).await
        )
    }

    async fn check_and_move(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        new_start: DateTime<Utc>,
        new_duration_minutes: i32,
        new_dentist_id: Option<Uuid>,
    ) -> Result<MoveAttempt, StoreError> {
        with_retries!(
            self,
            "check_and_move",
            self.inner
                .check_and_move(tenant_id, id, new_start, new_duration_minutes, new_dentist_id)
                .await
        )
    }

    async fn swap_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        expected: AppointmentStatus,
        next: AppointmentStatus,
    ) -> Result<StatusSwap, StoreError> {
        with_retries!(
            self,
            "swap_status",
            self.inner.swap_status(tenant_id, id, expected, next).await
        )
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        filters: &ListFilters,
    ) -> Result<Vec<Appointment>, StoreError> {
        with_retries!(self, "list", self.inner.list(tenant_id, filters).await)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        with_retries!(self, "delete", self.inner.delete(tenant_id, id).await)
    }
}
