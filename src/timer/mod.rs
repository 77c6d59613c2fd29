//! Timer module
//!
//! This module contains the work/break state machine and the scheduler that
//! starts and stops it against a daily time window.

pub mod engine;
pub mod phase;
pub mod scheduler;

// Re-export main types
pub use engine::Timer;
pub use phase::{Phase, StateChange, TimerObserver};
pub use scheduler::{ScheduleAction, ScheduleWindow, Scheduler};
