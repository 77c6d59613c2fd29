//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::timer::{Phase, Scheduler, StateChange, Timer, TimerObserver};

/// Shared state behind the HTTP API. Also the timer's observer: every
/// transition is logged and remembered for `/status`.
pub struct AppState {
    pub timer: Timer,
    pub scheduler: Scheduler,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last transition and when it happened
    last_change: Mutex<Option<(StateChange, DateTime<Utc>)>>,
}

impl AppState {
    /// Create the state and register it as the timer's observer
    pub fn new(timer: Timer, scheduler: Scheduler, port: u16, host: String) -> Arc<Self> {
        let state = Arc::new(Self {
            timer,
            scheduler,
            start_time: Instant::now(),
            port,
            host,
            last_change: Mutex::new(None),
        });
        state.timer.set_observer(&state);
        state
    }

    /// Last recorded transition, if any
    pub fn get_last_change(&self) -> Option<(StateChange, DateTime<Utc>)> {
        self.last_change.lock().ok().and_then(|change| *change)
    }

    /// Seconds left in the current phase, floored at zero
    pub fn remaining_seconds(&self) -> u64 {
        u64::try_from(self.timer.remaining_time().num_seconds()).unwrap_or(0)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

impl TimerObserver for AppState {
    fn on_state_change(&self, change: StateChange) {
        match change.phase {
            Phase::Idle | Phase::Suspended => info!("Timer is now {}", change.phase),
            _ => info!("Timer is now {} for {:?}", change.phase, change.duration),
        }

        if let Ok(mut last) = self.last_change.lock() {
            *last = Some((change, Utc::now()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::{Notifier, Suspender},
        settings::Settings,
    };
    use async_trait::async_trait;
    use chrono::NaiveDateTime;

    struct Quiet;

    #[async_trait]
    impl Notifier for Quiet {
        async fn notify(&self, _title: &str, _message: &str) -> Result<(), String> {
            Ok(())
        }
    }

    #[async_trait]
    impl Suspender for Quiet {
        async fn suspend(&self) -> Result<(), String> {
            Ok(())
        }
    }

    impl crate::services::Clock for Quiet {
        fn now(&self) -> NaiveDateTime {
            NaiveDateTime::default()
        }
    }

    fn app() -> Arc<AppState> {
        let timer = Timer::new(Settings::default(), Arc::new(Quiet), Arc::new(Quiet));
        let scheduler = Scheduler::new(timer.clone(), Arc::new(Quiet));
        AppState::new(timer, scheduler, 20554, "127.0.0.1".to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn records_transitions_as_observer() {
        let state = app();
        assert!(state.get_last_change().is_none());

        state.timer.start();
        let (change, _) = state.get_last_change().unwrap();
        assert_eq!(change.phase, Phase::Working);
        assert_eq!(state.remaining_seconds(), 3000);

        state.timer.stop();
        let (change, _) = state.get_last_change().unwrap();
        assert_eq!(change.phase, Phase::Idle);
        assert_eq!(state.remaining_seconds(), 0);
    }

    #[test]
    fn uptime_starts_in_seconds() {
        let state = app();
        assert!(state.get_uptime().ends_with('s'));
    }
}
