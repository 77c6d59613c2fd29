//! Host environment module
//!
//! This module contains the capability traits the timer depends on and the
//! Linux implementations of them (notifications, suspension, wall clock).

pub mod ports;
pub mod system;

// Re-export main types
pub use ports::{Clock, Notifier, Suspender};
pub use system::*;
