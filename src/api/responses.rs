//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{state::AppState, timer::Phase};

/// Snapshot of the timer as seen by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerStatus {
    pub state: Phase,
    /// Never negative: floored at zero near phase boundaries
    pub remaining_seconds: u64,
    pub extend_used: bool,
}

impl TimerStatus {
    pub fn capture(state: &AppState) -> Self {
        Self {
            state: state.timer.state(),
            remaining_seconds: state.remaining_seconds(),
            extend_used: state.timer.extend_used(),
        }
    }
}

/// API response structure for command endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerStatus,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, timer: TimerStatus) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            timer,
        }
    }

    pub fn ok(message: String, timer: TimerStatus) -> Self {
        Self::new("ok".to_string(), message, timer)
    }

    /// Create an error response
    pub fn error(message: String, timer: TimerStatus) -> Self {
        Self::new("error".to_string(), message, timer)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleStatus {
    pub enabled: bool,
    pub start: String,
    pub end: String,
    /// Whether the scheduler loop is running
    pub active: bool,
}

/// Full status with schedule and server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerStatus,
    pub always_on: bool,
    pub schedule: ScheduleStatus,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_change: Option<Phase>,
    pub last_change_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
