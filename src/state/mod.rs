//! State management module
//!
//! This module contains the application state shared with the HTTP API.

pub mod app_state;

// Re-export main types
pub use app_state::AppState;
