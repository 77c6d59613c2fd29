//! Daily schedule that starts and stops the timer automatically

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{engine::Timer, phase::Phase};
use crate::services::Clock;

/// How often the schedule is checked
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Parse a zero-padded 24-hour "HH:MM" time of day
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
}

/// A daily time-of-day window. An end before the start means the window runs
/// past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ScheduleWindow {
    pub fn parse(start: &str, end: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self {
            start: parse_time_of_day(start)?,
            end: parse_time_of_day(end)?,
        })
    }

    pub fn spans_midnight(&self) -> bool {
        self.end < self.start
    }

    /// Whether `now` lies strictly inside the window
    pub fn contains(&self, now: NaiveDateTime) -> bool {
        let today = now.date();
        let start = today.and_time(self.start);
        let mut end = today.and_time(self.end);
        if self.spans_midnight() {
            end += TimeDelta::days(1);
        }
        if start < now && now < end {
            return true;
        }

        // Early hours still belong to the window that opened yesterday
        self.spans_midnight()
            && start - TimeDelta::days(1) < now
            && now < end - TimeDelta::days(1)
    }
}

/// What a single schedule check did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleAction {
    /// The window could not be parsed
    Skipped,
    Unchanged,
    Started,
    Stopped,
}

/// Periodically compares the clock against the configured window and issues
/// start/stop commands to the timer. Holds no session state of its own.
#[derive(Clone)]
pub struct Scheduler {
    timer: Timer,
    clock: Arc<dyn Clock>,
    active: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    poll_interval: Duration,
}

impl Scheduler {
    pub fn new(timer: Timer, clock: Arc<dyn Clock>) -> Self {
        Self {
            timer,
            clock,
            active: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Launch the polling loop. Does nothing when scheduling is disabled or
    /// the loop is already running.
    pub fn start(&self) {
        if !self.timer.settings().schedule_enabled {
            debug!("Schedule disabled, not starting scheduler");
            return;
        }
        if self.active.swap(true, Ordering::SeqCst) {
            return;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.run(generation).await;
        });
    }

    /// Ask the loop to exit at its next wake
    pub fn stop(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            info!("Stopping scheduler");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Run one schedule check against the current time
    pub fn poll(&self) -> ScheduleAction {
        let settings = self.timer.settings();
        let parsed = ScheduleWindow::parse(&settings.schedule_start, &settings.schedule_end);
        let window = match parsed {
            Ok(window) => window,
            Err(e) => {
                warn!(
                    "Invalid schedule {} - {}: {}, skipping check",
                    settings.schedule_start, settings.schedule_end, e
                );
                return ScheduleAction::Skipped;
            }
        };

        // Always-on cycles perpetuate themselves
        if settings.always_on {
            return ScheduleAction::Unchanged;
        }

        let now = self.clock.now();
        let within = window.contains(now);

        // Phase checks happen inside the timer's lock so a concurrent start or
        // extend from the API is never overridden
        if within {
            if self.timer.start_if_idle() {
                info!("Inside schedule window at {}, started timer", now.time());
                return ScheduleAction::Started;
            }
            return ScheduleAction::Unchanged;
        }

        // Extensions and breaks are allowed to finish
        if self
            .timer
            .stop_if(|phase| matches!(phase, Phase::Working | Phase::Warning))
        {
            info!("Outside schedule window at {}, stopped timer", now.time());
            return ScheduleAction::Stopped;
        }

        ScheduleAction::Unchanged
    }

    fn is_current(&self, generation: u64) -> bool {
        self.active.load(Ordering::SeqCst)
            && self.generation.load(Ordering::SeqCst) == generation
    }

    async fn run(self, generation: u64) {
        let settings = self.timer.settings();
        info!(
            "Starting scheduler for {} - {} (every {:?})",
            settings.schedule_start, settings.schedule_end, self.poll_interval
        );

        let mut ticker = interval(self.poll_interval);
        // Don't burst missed checks after the machine wakes up
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if !self.is_current(generation) {
                break;
            }

            let action = self.poll();
            if action != ScheduleAction::Unchanged {
                debug!("Schedule check: {:?}", action);
            }
        }

        debug!("Scheduler loop {} exited", generation);
    }
}
