//! Timer phases and state change events

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Phase of the work cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Working,
    /// Work is about to end; the one extension may be taken
    Warning,
    Extended,
    Break,
    /// Transient: the suspend call is in flight
    Suspended,
}

impl Phase {
    pub fn is_idle(&self) -> bool {
        *self == Phase::Idle
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Idle => "Idle",
            Phase::Working => "Working",
            Phase::Warning => "Warning",
            Phase::Extended => "Extended",
            Phase::Break => "Break",
            Phase::Suspended => "Suspended",
        };
        f.write_str(label)
    }
}

/// A transition reported to the observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub phase: Phase,
    /// Length of the phase just entered, zero for Idle and Suspended
    pub duration: Duration,
}

impl StateChange {
    pub fn new(phase: Phase, duration: Duration) -> Self {
        Self { phase, duration }
    }
}

/// Receives every transition the timer makes.
///
/// Called synchronously while the timer holds its session lock, from whichever
/// task fired the transition. Implementations must not call back into the
/// timer.
pub trait TimerObserver: Send + Sync {
    fn on_state_change(&self, change: StateChange);
}
