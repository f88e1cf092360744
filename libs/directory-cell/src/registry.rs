use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Dentist, DirectoryError, Patient};

/// Existence checks the scheduling engine runs before touching the store.
/// Both lookups are tenant-scoped; an id registered under another tenant is
/// invisible here.
#[async_trait]
pub trait PatientDirectory: Send + Sync {
    async fn exists(&self, tenant_id: Uuid, patient_id: Uuid) -> Result<bool, DirectoryError>;
}

#[async_trait]
pub trait DentistDirectory: Send + Sync {
    async fn exists(&self, tenant_id: Uuid, dentist_id: Uuid) -> Result<bool, DirectoryError>;
}

/// In-process registry backing both directories, partitioned by tenant.
#[derive(Default)]
pub struct InMemoryRegistry {
    patients: RwLock<HashMap<Uuid, HashMap<Uuid, Patient>>>,
    dentists: RwLock<HashMap<Uuid, HashMap<Uuid, Dentist>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_patient(&self, tenant_id: Uuid, name: String) -> Patient {
        let patient = Patient {
            id: Uuid::new_v4(),
            tenant_id,
            name,
            created_at: Utc::now(),
        };
        let mut patients = self.patients.write().await;
        patients
            .entry(tenant_id)
            .or_default()
            .insert(patient.id, patient.clone());
        debug!("Registered patient {} for tenant {}", patient.id, tenant_id);
        patient
    }

    pub async fn register_dentist(&self, tenant_id: Uuid, name: String) -> Dentist {
        let dentist = Dentist {
            id: Uuid::new_v4(),
            tenant_id,
            name,
            created_at: Utc::now(),
        };
        let mut dentists = self.dentists.write().await;
        dentists
            .entry(tenant_id)
            .or_default()
            .insert(dentist.id, dentist.clone());
        debug!("Registered dentist {} for tenant {}", dentist.id, tenant_id);
        dentist
    }

    pub async fn list_patients(&self, tenant_id: Uuid) -> Vec<Patient> {
        let patients = self.patients.read().await;
        let mut listed: Vec<Patient> = patients
            .get(&tenant_id)
            .map(|by_id| by_id.values().cloned().collect())
            .unwrap_or_default();
        listed.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        listed
    }

    pub async fn list_dentists(&self, tenant_id: Uuid) -> Vec<Dentist> {
        let dentists = self.dentists.read().await;
        let mut listed: Vec<Dentist> = dentists
            .get(&tenant_id)
            .map(|by_id| by_id.values().cloned().collect())
            .unwrap_or_default();
        listed.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        listed
    }
}

#[async_trait]
impl PatientDirectory for InMemoryRegistry {
    async fn exists(&self, tenant_id: Uuid, patient_id: Uuid) -> Result<bool, DirectoryError> {
        let patients = self.patients.read().await;
        Ok(patients
            .get(&tenant_id)
            .is_some_and(|by_id| by_id.contains_key(&patient_id)))
    }
}

#[async_trait]
impl DentistDirectory for InMemoryRegistry {
    async fn exists(&self, tenant_id: Uuid, dentist_id: Uuid) -> Result<bool, DirectoryError> {
        let dentists = self.dentists.read().await;
        Ok(dentists
            .get(&tenant_id)
            .is_some_and(|by_id| by_id.contains_key(&dentist_id)))
    }
}
