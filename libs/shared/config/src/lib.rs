use std::env;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Upper bound for a single store operation before it is reported as
    /// transient.
    pub store_op_timeout: Duration,
    /// Retry budget for transient store failures.
    pub store_retry_attempts: u32,
    /// Default listing window, in days, when a query supplies no date range.
    pub list_window_days: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: parse_var("PORT", 3000),
            store_op_timeout: Duration::from_millis(parse_var("STORE_OP_TIMEOUT_MS", 5000)),
            store_retry_attempts: parse_var("STORE_RETRY_ATTEMPTS", 3),
            list_window_days: parse_var("LIST_WINDOW_DAYS", 60),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            store_op_timeout: Duration::from_secs(5),
            store_retry_attempts: 3,
            list_window_days: 60,
        }
    }
}

fn parse_var<T: std::str::FromStr + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
