use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Authenticated caller scope attached to every request by the tenant
/// middleware. All engine operations take the tenant id from here; cross-tenant
/// access is impossible by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub role: CallerRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallerRole {
    Admin,
    Dentist,
    Receptionist,
}

impl CallerRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, CallerRole::Admin)
    }
}

impl fmt::Display for CallerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallerRole::Admin => write!(f, "ADMIN"),
            CallerRole::Dentist => write!(f, "DENTIST"),
            CallerRole::Receptionist => write!(f, "RECEPTIONIST"),
        }
    }
}

impl FromStr for CallerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(CallerRole::Admin),
            "DENTIST" => Ok(CallerRole::Dentist),
            "RECEPTIONIST" => Ok(CallerRole::Receptionist),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}
