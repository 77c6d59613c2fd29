//! Pomoduru - a work/break timer that suspends the machine when work is over
//!
//! This library provides the timer state machine, the daily scheduler that
//! drives it, the settings file, and the HTTP control surface.

pub mod config;
pub mod settings;
pub mod timer;
pub mod state;
pub mod api;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use settings::Settings;
pub use state::AppState;
pub use timer::{Phase, Scheduler, Timer};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
