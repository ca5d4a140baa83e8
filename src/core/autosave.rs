//! # Autosave: coordinates snapshot, save lock, background write and rescheduling.
//!
//! [`Autosave`] is what the scheduler calls on every fire. One attempt is:
//!
//! ```text
//! attempt()                                   (calling thread)
//!   ├─► ownership.is_authoritative()?  no ──► Skipped(NotAuthoritative)
//!   ├─► source.snapshot()              err ─► early failure (see below)
//!   └─► spawn save task ──────────────────────────────────────────────┐
//!                                                                     ▼
//! save task                                   (runtime worker)
//!   ├─► lock.try_acquire()             none ─► Skipped(SaveInProgress)
//!   ├─► scheduler.pause()
//!   ├─► publish AutosaveStarted
//!   ├─► persist(snapshot, path)        (panics caught)
//!   │     ├─ Ok  ─► publish AutosaveCompleted{duration}
//!   │     └─ Err ─► publish AutosaveFailed{reason}
//!   └─► [drop Cycle] release lock, scheduler.restart()   (every exit path)
//! ```
//!
//! ## Rules
//! - The snapshot is taken before the lock is even looked at, so it reflects the
//!   state at trigger time and the caller never waits on a running save.
//! - The snapshot is moved into the save task; nothing else aliases it.
//! - A skipped attempt changes nothing: no status, no pause, no restart.
//! - A started attempt always ends with the lock released and exactly one
//!   `restart()`, whether persistence succeeded, failed or panicked.
//! - Early failure (before the lock was taken): if the lock is found set by a
//!   holder that no longer exists, it is forced idle and reported as
//!   [`AutosaveError::InconsistentFlag`]. A live holder, such as a manual save,
//!   keeps the lock.

use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::task::TaskTracker;

use crate::core::builder::{AutosaveBuilder, SubscriberListener};
use crate::core::config::Config;
use crate::core::lock::{SaveGuard, SaveLock};
use crate::core::scheduler::Scheduler;
use crate::core::shutdown;
use crate::error::{AutosaveError, RuntimeError, SkipReason};
use crate::events::{Bus, Event, EventKind};
use crate::path::AutosavePath;
use crate::recovery::Recovery;
use crate::state::{Ownership, Persist, RecoveryPrompt, SnapshotSource, Workspace};

/// Result of [`Autosave::attempt`].
#[derive(Debug)]
pub enum Attempt {
    /// Dropped before a snapshot was taken.
    Skipped(SkipReason),
    /// Snapshot taken and handed to a background save task.
    Spawned(JoinHandle<SaveOutcome>),
}

/// How a background save task ended.
#[derive(Debug)]
pub enum SaveOutcome {
    /// The snapshot was written.
    Completed {
        /// Time spent in the persistence collaborator.
        duration: std::time::Duration,
    },
    /// The lock was held by another save; nothing was written.
    Skipped(SkipReason),
    /// Persistence failed or panicked.
    Failed(AutosaveError),
}

/// Crash-recovery autosave coordinator.
///
/// Build with [`Autosave::builder`]; the builder wires the scheduler's fire
/// callback back into [`attempt`](Self::attempt).
pub struct Autosave<S> {
    pub(crate) cfg: Config,
    pub(crate) bus: Bus,
    pub(crate) lock: SaveLock,
    pub(crate) scheduler: Arc<Scheduler>,
    pub(crate) source: Arc<dyn SnapshotSource<S>>,
    pub(crate) persist: Arc<dyn Persist<S>>,
    pub(crate) ownership: Arc<dyn Ownership>,
    pub(crate) path: AutosavePath,
    pub(crate) runtime: Handle,
    pub(crate) tracker: TaskTracker,
    pub(crate) listener: Mutex<Option<SubscriberListener>>,
}

impl<S: Send + 'static> Autosave<S> {
    /// Starts building a coordinator for `path`.
    pub fn builder(
        cfg: Config,
        path: AutosavePath,
        source: Arc<dyn SnapshotSource<S>>,
        persist: Arc<dyn Persist<S>>,
    ) -> AutosaveBuilder<S> {
        AutosaveBuilder::new(cfg, path, source, persist)
    }

    /// Starts the periodic timer (same as [`restart`](Self::restart)).
    pub fn start(&self) {
        self.scheduler.start();
    }

    /// Re-reads the interval and reschedules; call after the preference changes.
    pub fn restart(&self) {
        self.scheduler.restart();
    }

    /// Stops the periodic timer until the next `restart()`.
    pub fn pause(&self) {
        self.scheduler.pause();
    }

    /// Runs one autosave attempt.
    ///
    /// Called by the scheduler on every fire; hosts may call it directly for an
    /// out-of-band save. Never blocks on a running save.
    ///
    /// Returns `Err` only when the snapshot could not be produced; that failure
    /// has already been published as [`EventKind::AutosaveFailed`].
    pub fn attempt(&self) -> Result<Attempt, AutosaveError> {
        if !self.ownership.is_authoritative() {
            tracing::trace!("autosave skipped: not authoritative for the document");
            return Ok(Attempt::Skipped(SkipReason::NotAuthoritative));
        }

        let started = Instant::now();
        let snapshot = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.source.snapshot()
        })) {
            Ok(Ok(s)) => s,
            Ok(Err(e)) => return Err(self.early_failure(e)),
            Err(panic) => return Err(self.early_failure(AutosaveError::from_panic(panic))),
        };
        let copy = started.elapsed();
        tracing::info!(
            copy_ms = u64::try_from(copy.as_millis()).unwrap_or(u64::MAX),
            "snapshot taken"
        );
        self.bus
            .publish(Event::new(EventKind::SnapshotTaken).with_duration(copy));

        let job = SaveJob {
            bus: self.bus.clone(),
            lock: self.lock.clone(),
            scheduler: Arc::clone(&self.scheduler),
            persist: Arc::clone(&self.persist),
            path: self.path.clone(),
        };
        let handle = self
            .tracker
            .spawn_on(job.run(snapshot), &self.runtime);
        Ok(Attempt::Spawned(handle))
    }

    /// Recovery manager sharing this coordinator's path and event bus.
    pub fn recovery(
        &self,
        prompt: Arc<dyn RecoveryPrompt>,
        workspace: Arc<dyn Workspace>,
    ) -> Recovery {
        Recovery::new(self.path.clone(), self.bus.clone(), prompt, workspace)
    }

    /// Stops scheduling and waits up to `grace` for an in-flight save.
    ///
    /// Attempts triggered after this call still run the protocol but the
    /// scheduler is not re-armed. Subscribers have received every event,
    /// including the final `AllStoppedWithin`/`GraceExceeded`, by the time this
    /// returns (again bounded by `grace`).
    pub async fn shutdown(&self, grace: std::time::Duration) -> Result<(), RuntimeError> {
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.scheduler.close();
        self.tracker.close();

        let res = match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                tracing::warn!(?grace, "autosave still running at shutdown");
                self.bus.publish(Event::new(EventKind::GraceExceeded));
                Err(RuntimeError::GraceExceeded { grace })
            }
        };

        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(listener) = listener {
            if tokio::time::timeout(grace, listener.stop()).await.is_err() {
                tracing::warn!(?grace, "subscribers still draining at shutdown");
            }
        }
        res
    }

    /// Starts the timer, waits for a termination signal, then shuts down with `Config::grace`.
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        self.start();
        if let Err(e) = shutdown::wait_for_shutdown_signal().await {
            tracing::warn!(error = %e, "signal registration failed; shutting down");
        }
        self.shutdown(self.cfg.grace).await
    }

    /// Shared save lock; hand a clone to the manual-save path.
    pub fn save_lock(&self) -> &SaveLock {
        &self.lock
    }

    /// The scheduler driving attempts.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The autosave artifact path.
    pub fn path(&self) -> &AutosavePath {
        &self.path
    }

    /// The event bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// New receiver for subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Reports a failure that happened before a save task owned the lock.
    fn early_failure(&self, cause: AutosaveError) -> AutosaveError {
        if self.lock.release_orphan() {
            let err = AutosaveError::InconsistentFlag {
                cause: Box::new(cause),
            };
            tracing::error!(error = %err, "save flag was left set by a vanished owner; forced idle");
            self.bus.publish(
                Event::new(EventKind::FlagForceReset).with_reason(err.as_message()),
            );
            self.bus.publish(
                Event::new(EventKind::AutosaveFailed).with_reason(err.to_string()),
            );
            err
        } else {
            tracing::warn!(error = %cause, "autosave failed before saving");
            self.bus.publish(
                Event::new(EventKind::AutosaveFailed).with_reason(cause.to_string()),
            );
            cause
        }
    }
}

/// Everything the background task needs, detached from the coordinator.
struct SaveJob<S> {
    bus: Bus,
    lock: SaveLock,
    scheduler: Arc<Scheduler>,
    persist: Arc<dyn Persist<S>>,
    path: AutosavePath,
}

impl<S: Send + 'static> SaveJob<S> {
    async fn run(self, snapshot: S) -> SaveOutcome {
        tracing::debug!("beginning autosave");
        let Some(guard) = self.lock.try_acquire() else {
            tracing::debug!("autosave dropped: another save is in progress");
            drop(snapshot);
            return SaveOutcome::Skipped(SkipReason::SaveInProgress);
        };
        self.scheduler.pause();
        let _cycle = Cycle {
            guard: Some(guard),
            scheduler: &self.scheduler,
        };

        self.bus
            .publish(Event::new(EventKind::AutosaveStarted).with_path(&self.path));

        let started = Instant::now();
        let res = std::panic::AssertUnwindSafe(self.write(snapshot))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(AutosaveError::from_panic(panic)));

        match res {
            Ok(()) => {
                let duration = started.elapsed();
                tracing::debug!(
                    took_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                    "autosave written"
                );
                self.bus.publish(
                    Event::new(EventKind::AutosaveCompleted)
                        .with_path(&self.path)
                        .with_duration(duration),
                );
                SaveOutcome::Completed { duration }
            }
            Err(e) => {
                tracing::error!(error = %e, "autosave failed");
                self.bus.publish(
                    Event::new(EventKind::AutosaveFailed)
                        .with_path(&self.path)
                        .with_reason(e.to_string()),
                );
                SaveOutcome::Failed(e)
            }
        }
    }

    async fn write(&self, snapshot: S) -> Result<(), AutosaveError> {
        self.path.ensure_dir().await?;
        self.persist.persist(snapshot, self.path.as_path()).await
    }
}

/// Holds the lock for one save; on drop releases it, then re-arms the scheduler.
struct Cycle<'a> {
    guard: Option<SaveGuard>,
    scheduler: &'a Scheduler,
}

impl Drop for Cycle<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        tracing::debug!("save flag released; rescheduling");
        self.scheduler.restart();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AutosaveInterval, SharedState};
    use async_trait::async_trait;
    use std::path::Path;
    use crate::subscribers::Subscribe;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time;

    #[derive(Clone, Copy)]
    enum Mode {
        Succeed,
        Fail,
        Panic,
    }

    struct Recorder {
        delay: Duration,
        mode: Mode,
        calls: AtomicUsize,
        written: Mutex<Vec<Vec<u32>>>,
    }

    impl Recorder {
        fn new(delay: Duration, mode: Mode) -> Arc<Self> {
            Arc::new(Self {
                delay,
                mode,
                calls: AtomicUsize::new(0),
                written: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Persist<Vec<u32>> for Recorder {
        async fn persist(&self, snapshot: Vec<u32>, _path: &Path) -> Result<(), AutosaveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            time::sleep(self.delay).await;
            match self.mode {
                Mode::Succeed => {
                    self.written.lock().unwrap().push(snapshot);
                    Ok(())
                }
                Mode::Fail => Err(AutosaveError::Persist {
                    error: "disk full".into(),
                }),
                Mode::Panic => panic!("writer crashed"),
            }
        }
    }

    struct Fixture {
        _home: tempfile::TempDir,
        live: SharedState<Vec<u32>>,
        prefs: AutosaveInterval,
        persist: Arc<Recorder>,
        autosave: Arc<Autosave<Vec<u32>>>,
    }

    fn fixture(persist: Arc<Recorder>, owner: bool) -> Fixture {
        let live = SharedState::new(vec![1, 2, 3]);
        fixture_with_source(persist, owner, Arc::new(live.clone()), live)
    }

    fn fixture_with_source(
        persist: Arc<Recorder>,
        owner: bool,
        source: Arc<dyn SnapshotSource<Vec<u32>>>,
        live: SharedState<Vec<u32>>,
    ) -> Fixture {
        let home = tempfile::tempdir().unwrap();
        let prefs = AutosaveInterval::new(1);
        let autosave = Autosave::<Vec<u32>>::builder(
            Config::default(),
            AutosavePath::new(home.path(), "cmpgn"),
            source,
            persist.clone(),
        )
        .with_interval(Arc::new(prefs.clone()))
        .with_ownership(Arc::new(move || owner))
        .build()
        .unwrap();
        Fixture {
            _home: home,
            live,
            prefs,
            persist,
            autosave,
        }
    }

    fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    fn kinds(events: &[Event]) -> Vec<EventKind> {
        events.iter().map(|e| e.kind).collect()
    }

    fn count(events: &[Event], kind: EventKind) -> usize {
        events.iter().filter(|e| e.kind == kind).count()
    }

    async fn spawned(attempt: Result<Attempt, AutosaveError>) -> SaveOutcome {
        match attempt.unwrap() {
            Attempt::Spawned(handle) => handle.await.unwrap(),
            Attempt::Skipped(reason) => panic!("unexpected skip: {reason:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_fire_persists_trigger_time_snapshot() {
        let fx = fixture(Recorder::new(Duration::from_secs(5), Mode::Succeed), true);
        let mut rx = fx.autosave.subscribe();
        fx.autosave.start();

        // Timer fires at 60s; persistence runs until 65s.
        time::sleep(Duration::from_secs(61)).await;
        assert!(fx.autosave.save_lock().is_saving());
        assert!(!fx.autosave.scheduler().is_running());
        fx.live.write().push(99);

        time::sleep(Duration::from_secs(10)).await;
        assert!(!fx.autosave.save_lock().is_saving());
        assert!(fx.autosave.scheduler().is_running());
        assert_eq!(*fx.persist.written.lock().unwrap(), vec![vec![1, 2, 3]]);

        let events = drain(&mut rx);
        assert_eq!(
            kinds(&events),
            vec![
                EventKind::SchedulerStarted,
                EventKind::SnapshotTaken,
                EventKind::SchedulerPaused,
                EventKind::AutosaveStarted,
                EventKind::AutosaveCompleted,
                EventKind::SchedulerStarted,
            ]
        );
        let completed = &events[4];
        assert!(completed.duration_ms.unwrap() >= 5_000);
        assert_eq!(completed.path.as_deref(), Some(fx.autosave.path().as_path()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_fire_is_spaced_from_completion() {
        let fx = fixture(Recorder::new(Duration::from_secs(30), Mode::Succeed), true);
        fx.autosave.start();

        // First fire at 60s, save finishes at 90s, next fire due at 150s.
        time::sleep(Duration::from_secs(121)).await;
        assert_eq!(fx.persist.calls.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fx.persist.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_in_progress_skips_without_side_effects() {
        let fx = fixture(Recorder::new(Duration::ZERO, Mode::Succeed), true);
        fx.autosave.start();
        let manual = fx.autosave.save_lock().try_acquire().unwrap();
        let mut rx = fx.autosave.subscribe();

        let outcome = spawned(fx.autosave.attempt()).await;

        assert!(matches!(
            outcome,
            SaveOutcome::Skipped(SkipReason::SaveInProgress)
        ));
        assert_eq!(fx.persist.calls.load(Ordering::SeqCst), 0);
        assert!(fx.autosave.save_lock().is_saving());
        assert!(fx.autosave.scheduler().is_running());

        let events = drain(&mut rx);
        assert_eq!(kinds(&events), vec![EventKind::SnapshotTaken]);
        assert!(!events.iter().any(Event::is_status));

        drop(manual);
        assert!(!fx.autosave.save_lock().is_saving());
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_fires_second_skips() {
        let fx = fixture(Recorder::new(Duration::from_secs(5), Mode::Succeed), true);
        let mut rx = fx.autosave.subscribe();

        let first = fx.autosave.attempt().unwrap();
        let second = fx.autosave.attempt().unwrap();

        let (Attempt::Spawned(first), Attempt::Spawned(second)) = (first, second) else {
            panic!("both attempts should spawn");
        };
        assert!(matches!(
            second.await.unwrap(),
            SaveOutcome::Skipped(SkipReason::SaveInProgress)
        ));
        assert!(matches!(
            first.await.unwrap(),
            SaveOutcome::Completed { .. }
        ));

        let events = drain(&mut rx);
        assert_eq!(count(&events, EventKind::AutosaveStarted), 1);
        assert_eq!(count(&events, EventKind::AutosaveCompleted), 1);
        assert_eq!(count(&events, EventKind::SchedulerStarted), 1);
        assert_eq!(fx.persist.written.lock().unwrap().len(), 1);
        assert!(!fx.autosave.save_lock().is_saving());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_releases_flag_and_restarts_once() {
        let fx = fixture(Recorder::new(Duration::from_secs(1), Mode::Fail), true);
        let mut rx = fx.autosave.subscribe();

        let outcome = spawned(fx.autosave.attempt()).await;

        let SaveOutcome::Failed(err) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(err.as_label(), "autosave_persist_failed");
        assert!(!fx.autosave.save_lock().is_saving());
        assert!(fx.autosave.scheduler().is_running());

        let events = drain(&mut rx);
        assert_eq!(count(&events, EventKind::SchedulerStarted), 1);
        assert_eq!(count(&events, EventKind::AutosaveCompleted), 0);
        let failed = events
            .iter()
            .find(|e| e.kind == EventKind::AutosaveFailed)
            .unwrap();
        assert!(failed.reason.as_deref().unwrap().contains("disk full"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_writer_is_contained() {
        let fx = fixture(Recorder::new(Duration::ZERO, Mode::Panic), true);
        let mut rx = fx.autosave.subscribe();

        let outcome = spawned(fx.autosave.attempt()).await;

        let SaveOutcome::Failed(err) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(err.as_label(), "autosave_panicked");
        assert!(!fx.autosave.save_lock().is_saving());

        let events = drain(&mut rx);
        assert_eq!(count(&events, EventKind::AutosaveFailed), 1);
        assert_eq!(count(&events, EventKind::SchedulerStarted), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_authoritative_is_silent() {
        let fx = fixture(Recorder::new(Duration::ZERO, Mode::Succeed), false);
        let mut rx = fx.autosave.subscribe();

        let attempt = fx.autosave.attempt().unwrap();

        assert!(matches!(
            attempt,
            Attempt::Skipped(SkipReason::NotAuthoritative)
        ));
        tokio::task::yield_now().await;
        assert!(drain(&mut rx).is_empty());
        assert_eq!(fx.persist.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_failure_is_reported() {
        let source = || -> Result<Vec<u32>, AutosaveError> {
            Err(AutosaveError::Snapshot {
                error: "model locked".into(),
            })
        };
        let fx = fixture_with_source(
            Recorder::new(Duration::ZERO, Mode::Succeed),
            true,
            Arc::new(source),
            SharedState::default(),
        );
        let mut rx = fx.autosave.subscribe();

        let err = fx.autosave.attempt().unwrap_err();

        assert_eq!(err.as_label(), "autosave_snapshot_failed");
        assert!(!fx.autosave.save_lock().is_saving());
        assert_eq!(kinds(&drain(&mut rx)), vec![EventKind::AutosaveFailed]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_failure_with_stuck_flag_forces_idle() {
        let source = || -> Result<Vec<u32>, AutosaveError> { panic!("clone blew up") };
        let fx = fixture_with_source(
            Recorder::new(Duration::ZERO, Mode::Succeed),
            true,
            Arc::new(source),
            SharedState::default(),
        );
        fx.autosave.save_lock().orphan();
        let mut rx = fx.autosave.subscribe();

        let err = fx.autosave.attempt().unwrap_err();

        let AutosaveError::InconsistentFlag { cause } = &err else {
            panic!("expected inconsistent flag, got {err:?}");
        };
        assert_eq!(cause.as_label(), "autosave_panicked");
        assert!(!fx.autosave.save_lock().is_saving());
        assert_eq!(
            kinds(&drain(&mut rx)),
            vec![EventKind::FlagForceReset, EventKind::AutosaveFailed]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_failure_keeps_manual_save_lock() {
        let failing = Arc::new(AtomicBool::new(true));
        let flag = failing.clone();
        let source = move || -> Result<Vec<u32>, AutosaveError> {
            if flag.load(Ordering::SeqCst) {
                Err(AutosaveError::Snapshot {
                    error: "model locked".into(),
                })
            } else {
                Ok(vec![7])
            }
        };
        let fx = fixture_with_source(
            Recorder::new(Duration::from_secs(5), Mode::Succeed),
            true,
            Arc::new(source),
            SharedState::default(),
        );
        let manual = fx.autosave.save_lock().try_acquire().unwrap();
        let mut rx = fx.autosave.subscribe();

        let err = fx.autosave.attempt().unwrap_err();
        assert_eq!(err.as_label(), "autosave_snapshot_failed");
        assert!(fx.autosave.save_lock().is_saving());
        assert_eq!(kinds(&drain(&mut rx)), vec![EventKind::AutosaveFailed]);

        failing.store(false, Ordering::SeqCst);
        let outcome = spawned(fx.autosave.attempt()).await;
        assert!(matches!(
            outcome,
            SaveOutcome::Skipped(SkipReason::SaveInProgress)
        ));
        assert_eq!(fx.persist.calls.load(Ordering::SeqCst), 0);
        assert!(fx.autosave.save_lock().is_saving());

        drop(manual);
        assert!(!fx.autosave.save_lock().is_saving());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_interval_after_save_leaves_no_timer() {
        let fx = fixture(Recorder::new(Duration::ZERO, Mode::Succeed), true);
        fx.autosave.start();
        fx.prefs.set(0);

        let outcome = spawned(fx.autosave.attempt()).await;

        assert!(matches!(outcome, SaveOutcome::Completed { .. }));
        assert!(!fx.autosave.scheduler().is_running());
        assert_eq!(fx.autosave.scheduler().interval_minutes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_inflight_save() {
        let fx = fixture(Recorder::new(Duration::from_secs(5), Mode::Succeed), true);
        fx.autosave.start();
        let _attempt = fx.autosave.attempt().unwrap();

        fx.autosave.shutdown(Duration::from_secs(10)).await.unwrap();

        assert_eq!(fx.persist.written.lock().unwrap().len(), 1);
        assert!(!fx.autosave.save_lock().is_saving());
        assert!(!fx.autosave.scheduler().is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_grace_exceeded() {
        let fx = fixture(Recorder::new(Duration::from_secs(60), Mode::Succeed), true);
        let mut rx = fx.autosave.subscribe();
        let _attempt = fx.autosave.attempt().unwrap();

        let err = fx
            .autosave
            .shutdown(Duration::from_secs(1))
            .await
            .unwrap_err();

        assert_eq!(err.as_label(), "runtime_grace_exceeded");
        assert!(drain(&mut rx).iter().any(|e| e.kind == EventKind::GraceExceeded));
    }

    #[test]
    fn test_build_outside_runtime_fails() {
        let live = SharedState::new(vec![1_u32]);
        let res = Autosave::<Vec<u32>>::builder(
            Config::default(),
            AutosavePath::new("/tmp/none", "cmpgn"),
            Arc::new(live),
            Recorder::new(Duration::ZERO, Mode::Succeed),
        )
        .build();
        assert!(matches!(res, Err(RuntimeError::NoRuntime { .. })));
    }

    struct Seen(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Seen {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().unwrap().push(ev.kind);
        }
        fn name(&self) -> &'static str {
            "seen"
        }
    }

    fn with_subscriber(seen: Arc<Seen>) -> Arc<Autosave<Vec<u32>>> {
        Autosave::<Vec<u32>>::builder(
            Config::default(),
            AutosavePath::new("/tmp/none", "cmpgn"),
            Arc::new(SharedState::new(vec![1_u32])),
            Recorder::new(Duration::ZERO, Mode::Succeed),
        )
        .with_subscribers(vec![seen as Arc<dyn Subscribe>])
        .build()
        .unwrap()
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_final_event_when_shutdown_returns() {
        let seen = Arc::new(Seen(Mutex::new(Vec::new())));
        let autosave = with_subscriber(seen.clone());
        autosave.start();

        autosave.shutdown(Duration::from_secs(1)).await.unwrap();

        let kinds = seen.0.lock().unwrap().clone();
        assert_eq!(kinds.first(), Some(&EventKind::SchedulerStarted));
        assert_eq!(kinds.last(), Some(&EventKind::AllStoppedWithin));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tasks_outlive_shutdown() {
        let seen = Arc::new(Seen(Mutex::new(Vec::new())));
        let autosave = with_subscriber(seen);
        autosave.start();

        autosave.shutdown(Duration::from_secs(1)).await.unwrap();
        drop(autosave);
        settle().await;

        assert_eq!(Handle::current().metrics().num_alive_tasks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_coordinator_stops_its_tasks() {
        let seen = Arc::new(Seen(Mutex::new(Vec::new())));
        let autosave = with_subscriber(seen);
        autosave.start();

        drop(autosave);
        settle().await;

        assert_eq!(Handle::current().metrics().num_alive_tasks(), 0);
    }
}
