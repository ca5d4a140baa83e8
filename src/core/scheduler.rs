//! # Scheduler: restartable, pausable periodic timer.
//!
//! The scheduler owns at most one periodic timer. A timer is a task spawned on the
//! runtime that sleeps `period`, invokes the fire callback, and repeats until its
//! [`CancellationToken`] is cancelled.
//!
//! ## Operations
//! ```text
//! restart():  read interval ─► cancel current timer (if any)
//!                           ├─► interval <= 0 → disabled, no timer
//!                           └─► interval  > 0 → spawn timer(period = interval × unit)
//! start():    same as restart()
//! pause():    cancel current timer (if any), keep the interval
//! close():    pause() and make later restart() calls no-ops (shutdown)
//! ```
//!
//! `restart()` is one idempotent operation: whatever the previous state, afterwards
//! there is exactly one live timer iff the interval is positive and the scheduler
//! is not closed. The callback is registered once at build time and survives every
//! restart, so an interval change never loses it.
//!
//! ## Rules
//! - `timer` is `None` iff interval `<= 0`, paused, or closed.
//! - Dropping the scheduler stops its timer task.
//! - All methods take `&self` and lock a std mutex: callable from any thread,
//!   including the background save task.
//! - Fixed spacing: the coordinator pauses while saving and restarts afterwards,
//!   so the next fire comes a full period after the save finished.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::config::Config;
use crate::events::{Bus, Event, EventKind};
use crate::state::IntervalSource;

/// Callback invoked on every timer fire.
pub(crate) type FireFn = Arc<dyn Fn() + Send + Sync>;

/// Handle to one live timer task. Dropping it stops the task.
struct Timer {
    token: CancellationToken,
    period: Duration,
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

struct SchedulerState {
    /// Interval read by the last `restart()`.
    interval: i64,
    timer: Option<Timer>,
    closed: bool,
}

/// Restartable periodic timer driving autosave attempts.
pub struct Scheduler {
    cfg: Config,
    interval: Arc<dyn IntervalSource>,
    bus: Bus,
    runtime: Handle,
    on_fire: OnceLock<FireFn>,
    state: Mutex<SchedulerState>,
}

impl Scheduler {
    pub(crate) fn new(
        cfg: Config,
        interval: Arc<dyn IntervalSource>,
        bus: Bus,
        runtime: Handle,
    ) -> Self {
        Self {
            cfg,
            interval,
            bus,
            runtime,
            on_fire: OnceLock::new(),
            state: Mutex::new(SchedulerState {
                interval: 0,
                timer: None,
                closed: false,
            }),
        }
    }

    /// Registers the fire callback. Only the first registration takes effect.
    pub(crate) fn bind(&self, on_fire: FireFn) {
        let _ = self.on_fire.set(on_fire);
    }

    /// Equivalent to [`restart`](Self::restart).
    pub fn start(&self) {
        self.restart();
    }

    /// Re-reads the interval and (re)creates or removes the timer accordingly.
    pub fn restart(&self) {
        let minutes = self.interval.interval_minutes();
        let mut st = self.state();
        if st.closed {
            return;
        }
        st.interval = minutes;
        let had_timer = cancel(&mut st.timer);

        match self.cfg.period(minutes) {
            None => {
                tracing::debug!(minutes, had_timer, "autosave disabled; no timer");
                self.bus
                    .publish(Event::new(EventKind::SchedulerDisabled).with_interval(minutes));
            }
            Some(period) => {
                tracing::debug!(minutes, ?period, had_timer, "starting autosave timer");
                st.timer = Some(self.spawn_timer(period));
                self.bus.publish(
                    Event::new(EventKind::SchedulerStarted)
                        .with_interval(minutes)
                        .with_duration(period),
                );
            }
        }
    }

    /// Stops firing without forgetting the interval. No-op when no timer is active.
    pub fn pause(&self) {
        let mut st = self.state();
        if cancel(&mut st.timer) {
            tracing::debug!("autosave timer paused");
            self.bus.publish(Event::new(EventKind::SchedulerPaused));
        }
    }

    /// Stops the timer for good; later `start()`/`restart()` calls do nothing.
    pub fn close(&self) {
        let mut st = self.state();
        st.closed = true;
        if cancel(&mut st.timer) {
            self.bus.publish(Event::new(EventKind::SchedulerPaused));
        }
    }

    /// True while a timer is live.
    pub fn is_running(&self) -> bool {
        self.state().timer.is_some()
    }

    /// Period of the live timer, if any.
    pub fn period(&self) -> Option<Duration> {
        self.state().timer.as_ref().map(|t| t.period)
    }

    /// Interval read by the last `restart()`.
    pub fn interval_minutes(&self) -> i64 {
        self.state().interval
    }

    fn spawn_timer(&self, period: Duration) -> Timer {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let on_fire = self.on_fire.get().cloned();

        self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = time::sleep(period) => {}
                }
                if cancelled.is_cancelled() {
                    break;
                }
                if let Some(fire) = &on_fire {
                    fire();
                }
            }
        });

        Timer { token, period }
    }

    fn state(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cancels and clears `timer`. Returns whether one was live.
fn cancel(timer: &mut Option<Timer>) -> bool {
    timer.take().is_some()
}
