//! Capability interfaces for the host environment
//!
//! The timer and scheduler only talk to the machine through these traits so
//! that tests can swap in fakes.

use async_trait::async_trait;
use chrono::NaiveDateTime;

/// Sends a user-visible notification. Best-effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, message: &str) -> Result<(), String>;
}

/// Suspends the machine. Best-effort, never retried.
#[async_trait]
pub trait Suspender: Send + Sync {
    async fn suspend(&self) -> Result<(), String>;
}

/// Source of local wall-clock time for schedule decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}
