//! Builder wiring the bus, subscribers, scheduler and coordinator together.

use std::sync::{Arc, Mutex};

use tokio::runtime::Handle;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::{autosave::Autosave, config::Config, lock::SaveLock, scheduler::Scheduler};
use crate::{
    error::RuntimeError,
    events::Bus,
    path::AutosavePath,
    state::{AutosaveInterval, IntervalSource, Ownership, Persist, SnapshotSource},
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing an [`Autosave`] coordinator.
///
/// Defaults:
/// - interval: [`AutosaveInterval::default`] (5 minutes)
/// - ownership: always authoritative
/// - save lock: a fresh, unshared [`SaveLock`]
/// - subscribers: none
pub struct AutosaveBuilder<S> {
    cfg: Config,
    path: AutosavePath,
    source: Arc<dyn SnapshotSource<S>>,
    persist: Arc<dyn Persist<S>>,
    interval: Arc<dyn IntervalSource>,
    ownership: Arc<dyn Ownership>,
    lock: SaveLock,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<S: Send + 'static> AutosaveBuilder<S> {
    /// Creates a new builder with the required collaborators.
    pub fn new(
        cfg: Config,
        path: AutosavePath,
        source: Arc<dyn SnapshotSource<S>>,
        persist: Arc<dyn Persist<S>>,
    ) -> Self {
        Self {
            cfg,
            path,
            source,
            persist,
            interval: Arc::new(AutosaveInterval::default()),
            ownership: Arc::new(|| true),
            lock: SaveLock::new(),
            subscribers: Vec::new(),
        }
    }

    /// Sets where the interval (minutes) is read from on every restart.
    pub fn with_interval(mut self, interval: Arc<dyn IntervalSource>) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the ownership predicate consulted before every attempt.
    pub fn with_ownership(mut self, ownership: Arc<dyn Ownership>) -> Self {
        self.ownership = ownership;
        self
    }

    /// Shares `lock` with the host's manual-save path.
    pub fn with_save_lock(mut self, lock: SaveLock) -> Self {
        self.lock = lock;
        self
    }

    /// Sets event subscribers for status and error reporting.
    ///
    /// Subscribers receive events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the coordinator. Does not start the timer.
    ///
    /// Must be called from within a tokio runtime; the runtime handle is kept so
    /// the coordinator can later be driven from any thread.
    pub fn build(self) -> Result<Arc<Autosave<S>>, RuntimeError> {
        let runtime = Handle::try_current().map_err(|e| RuntimeError::NoRuntime {
            error: e.to_string(),
        })?;
        let bus = Bus::new(self.cfg.bus_capacity_clamped());

        let listener = (!self.subscribers.is_empty()).then(|| {
            let subs = SubscriberSet::new(self.subscribers, bus.clone(), &runtime);
            SubscriberListener::spawn(&bus, subs, &runtime)
        });

        let scheduler = Arc::new(Scheduler::new(
            self.cfg.clone(),
            self.interval,
            bus.clone(),
            runtime.clone(),
        ));

        let autosave = Arc::new(Autosave {
            cfg: self.cfg,
            bus,
            lock: self.lock,
            scheduler: Arc::clone(&scheduler),
            source: self.source,
            persist: self.persist,
            ownership: self.ownership,
            path: self.path,
            runtime,
            tracker: TaskTracker::new(),
            listener: Mutex::new(listener),
        });

        let weak = Arc::downgrade(&autosave);
        scheduler.bind(Arc::new(move || {
            if let Some(autosave) = weak.upgrade() {
                // Failures are already published on the bus.
                let _ = autosave.attempt();
            }
        }));

        Ok(autosave)
    }
}

/// Task forwarding bus events to the subscriber set.
///
/// The bus never closes while the coordinator lives, so the listener stops on
/// its own token: [`stop`](Self::stop) on shutdown, or when dropped.
pub(crate) struct SubscriberListener {
    stop: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl SubscriberListener {
    fn spawn(bus: &Bus, subs: SubscriberSet, runtime: &Handle) -> Self {
        let mut rx = bus.subscribe();
        let stop = CancellationToken::new();
        let stopped = stop.clone();

        let handle = runtime.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = stopped.cancelled() => break,
                    res = rx.recv() => match res {
                        Ok(ev) => subs.emit(&ev),
                        Err(RecvError::Lagged(n)) => {
                            tracing::warn!(skipped = n, "subscriber listener lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            // Events published before the stop request are still delivered.
            loop {
                match rx.try_recv() {
                    Ok(ev) => subs.emit(&ev),
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
            subs.shutdown().await;
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Stops forwarding, delivers what is already queued and waits for every worker.
    pub(crate) async fn stop(mut self) {
        self.stop.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "subscriber listener ended abnormally");
            }
        }
    }
}

impl Drop for SubscriberListener {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}
