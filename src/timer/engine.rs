//! Work/break state machine
//!
//! The timer drives itself through delayed tasks spawned on the Tokio runtime.
//! Every transition runs under the session lock and re-checks the phase (and
//! the cycle epoch) it expects, so a stale task that fires after a `stop()` or
//! an `extend()` is a no-op rather than something that has to be cancelled.

use std::{
    fmt,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info, warn};

use super::phase::{Phase, StateChange, TimerObserver};
use crate::{
    services::{Notifier, Suspender},
    settings::Settings,
};

const NOTIFY_TITLE: &str = "Pomoduru";

/// Pause between the suspend call returning and the break starting
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Session {
    phase: Phase,
    /// When the current phase began
    started_at: Instant,
    extend_used: bool,
    /// Bumped on every start and stop; delayed tasks carry the epoch they
    /// were scheduled in.
    epoch: u64,
}

struct Inner {
    settings: Settings,
    session: Mutex<Session>,
    observer: Mutex<Option<Weak<dyn TimerObserver>>>,
    notifier: Arc<dyn Notifier>,
    suspender: Arc<dyn Suspender>,
}

/// Handle to a work/break timer. Clones share the same session.
///
/// Commands spawn Tokio tasks, so they must be issued from inside a runtime.
#[derive(Clone)]
pub struct Timer {
    inner: Arc<Inner>,
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("session", &*self.session())
            .field("settings", &self.inner.settings)
            .finish()
    }
}

impl Timer {
    /// Create an idle timer
    pub fn new(
        settings: Settings,
        notifier: Arc<dyn Notifier>,
        suspender: Arc<dyn Suspender>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                session: Mutex::new(Session {
                    phase: Phase::Idle,
                    started_at: Instant::now(),
                    extend_used: false,
                    epoch: 0,
                }),
                observer: Mutex::new(None),
                notifier,
                suspender,
            }),
        }
    }

    /// Register the state change observer, replacing any previous one. Only a
    /// weak reference is kept.
    pub fn set_observer<O: TimerObserver + 'static>(&self, observer: &Arc<O>) {
        let observer: Weak<O> = Arc::downgrade(observer);
        let observer: Weak<dyn TimerObserver> = observer;
        *self
            .inner
            .observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(observer);
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Begin a work cycle. Called while a cycle is running this restarts it.
    pub fn start(&self) {
        let mut session = self.session();
        if !session.phase.is_idle() {
            info!("Restarting timer from {} phase", session.phase);
        }
        self.begin_work(&mut session);
    }

    /// Return to idle from any phase
    pub fn stop(&self) {
        self.stop_if(|_| true);
    }

    /// Start a cycle only if the timer is idle, checked under the same lock
    pub fn start_if_idle(&self) -> bool {
        let mut session = self.session();
        if session.phase != Phase::Idle {
            return false;
        }
        self.begin_work(&mut session);
        true
    }

    /// Stop only if the current phase satisfies `expected`, checked under the
    /// same lock as the reset
    pub fn stop_if(&self, expected: impl Fn(Phase) -> bool) -> bool {
        let mut session = self.session();
        if !expected(session.phase) {
            return false;
        }
        info!("Stopping timer from {} phase", session.phase);
        self.reset(&mut session);
        true
    }

    /// Take the one extension allowed per cycle. Only valid during Warning.
    pub fn extend(&self) -> bool {
        let mut session = self.session();
        if session.extend_used || session.phase != Phase::Warning {
            debug!(
                "Extension refused (phase={}, extend_used={})",
                session.phase, session.extend_used
            );
            return false;
        }

        let extend = self.inner.settings.extend_duration;
        session.extend_used = true;
        session.phase = Phase::Extended;
        session.started_at = Instant::now();
        let epoch = session.epoch;

        info!("Work session extended by {:?}", extend);
        self.emit(StateChange::new(Phase::Extended, extend));
        self.after(extend, move |timer| timer.on_extend_complete(epoch));
        true
    }

    pub fn state(&self) -> Phase {
        self.session().phase
    }

    pub fn extend_used(&self) -> bool {
        self.session().extend_used
    }

    /// Time left in the current phase. Not clamped: close to a phase boundary
    /// this can be zero or negative, callers floor it for display.
    pub fn remaining_time(&self) -> chrono::Duration {
        let session = self.session();
        let settings = &self.inner.settings;
        let total = match session.phase {
            Phase::Working | Phase::Warning => settings.work_duration,
            Phase::Extended => settings.extend_duration,
            Phase::Break => settings.break_duration,
            Phase::Idle | Phase::Suspended => return chrono::Duration::zero(),
        };
        let elapsed = session.started_at.elapsed();
        chrono::Duration::milliseconds(millis(total).saturating_sub(millis(elapsed)))
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, change: StateChange) {
        debug!("Timer state change: {} ({:?})", change.phase, change.duration);
        let observer = self
            .inner
            .observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade);
        if let Some(observer) = observer {
            observer.on_state_change(change);
        }
    }

    /// Run `task` once `delay` has elapsed, measured from now
    fn after<F, Fut>(&self, delay: Duration, task: F)
    where
        F: FnOnce(Timer) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let deadline = Instant::now() + delay;
        let timer = self.clone();
        tokio::spawn(async move {
            sleep_until(deadline).await;
            task(timer).await;
        });
    }

    fn begin_work(&self, session: &mut Session) {
        let settings = &self.inner.settings;
        session.phase = Phase::Working;
        session.started_at = Instant::now();
        session.extend_used = false;
        session.epoch += 1;
        let epoch = session.epoch;

        info!("Work session started for {:?}", settings.work_duration);
        self.emit(StateChange::new(Phase::Working, settings.work_duration));

        let warning_at = settings
            .work_duration
            .saturating_sub(settings.warning_time);
        self.after(warning_at, move |timer| timer.on_warning(epoch));
        self.after(settings.work_duration, move |timer| {
            timer.on_work_complete(epoch)
        });
    }

    fn reset(&self, session: &mut Session) {
        session.phase = Phase::Idle;
        session.extend_used = false;
        session.epoch += 1;
        self.emit(StateChange::new(Phase::Idle, Duration::ZERO));
    }

    async fn on_warning(self, epoch: u64) {
        let warning = self.inner.settings.warning_time;
        {
            let mut session = self.session();
            if session.epoch != epoch || session.phase != Phase::Working {
                return;
            }
            session.phase = Phase::Warning;
            info!("Work session ends in {}", describe(warning));
            self.emit(StateChange::new(Phase::Warning, warning));
        }

        let message = format!(
            "System will suspend in {}! Use 'extend' to delay.",
            describe(warning)
        );
        self.notify(&message).await;
    }

    async fn on_work_complete(self, epoch: u64) {
        let entered = self.enter_suspended(epoch, |phase| {
            matches!(phase, Phase::Working | Phase::Warning)
        });
        if entered {
            self.suspend_then_rest(epoch).await;
        }
    }

    async fn on_extend_complete(self, epoch: u64) {
        if self.enter_suspended(epoch, |phase| phase == Phase::Extended) {
            self.suspend_then_rest(epoch).await;
        }
    }

    fn enter_suspended(&self, epoch: u64, expected: impl Fn(Phase) -> bool) -> bool {
        let mut session = self.session();
        if session.epoch != epoch || !expected(session.phase) {
            return false;
        }
        session.phase = Phase::Suspended;
        self.emit(StateChange::new(Phase::Suspended, Duration::ZERO));
        true
    }

    async fn suspend_then_rest(&self, epoch: u64) {
        self.notify("Time's up! Taking a break...").await;

        if let Err(e) = self.inner.suspender.suspend().await {
            warn!("Failed to suspend system: {}", e);
        }

        sleep(SETTLE_DELAY).await;
        self.begin_break(epoch);
    }

    fn begin_break(&self, epoch: u64) {
        let mut session = self.session();
        // A stop() while the suspend call was in flight wins
        if session.epoch != epoch || session.phase != Phase::Suspended {
            return;
        }

        let rest = self.inner.settings.break_duration;
        session.phase = Phase::Break;
        session.started_at = Instant::now();

        info!("Break started for {:?}", rest);
        self.emit(StateChange::new(Phase::Break, rest));
        self.after(rest, move |timer| async move {
            timer.on_break_complete(epoch);
        });
    }

    fn on_break_complete(&self, epoch: u64) {
        let mut session = self.session();
        if session.epoch != epoch || session.phase != Phase::Break {
            return;
        }

        if self.inner.settings.always_on {
            info!("Break over, always-on starts the next cycle");
            self.begin_work(&mut session);
        } else {
            info!("Break over");
            self.reset(&mut session);
        }
    }

    async fn notify(&self, message: &str) {
        if let Err(e) = self.inner.notifier.notify(NOTIFY_TITLE, message).await {
            warn!("Failed to send notification: {}", e);
        }
    }
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// "5 minutes", "1 minute", "90 seconds"
fn describe(duration: Duration) -> String {
    let secs = duration.as_secs();
    match secs {
        60 => "1 minute".to_string(),
        s if s >= 60 && s % 60 == 0 => format!("{} minutes", s / 60),
        1 => "1 second".to_string(),
        s => format!("{} seconds", s),
    }
}
