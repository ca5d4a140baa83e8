//! # Runtime events emitted by the scheduler, the coordinator and recovery.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Scheduler events**: timer started, disabled, paused
//! - **Save events**: snapshot taken, autosave started/completed/failed, flag reset
//! - **Recovery events**: artifact offered, accepted/declined, purged, detached
//! - **Runtime events**: shutdown and subscriber health
//!
//! The [`Event`] struct carries additional metadata such as timestamps, durations,
//! the autosave path and failure reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use autosave::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::AutosaveCompleted)
//!     .with_duration(Duration::from_millis(250))
//!     .with_path("/tmp/autosave/AutoSave.cmpgn");
//!
//! assert_eq!(ev.kind, EventKind::AutosaveCompleted);
//! assert_eq!(ev.duration_ms, Some(250));
//! ```

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: subscriber name and panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `reason`: subscriber name and cause (`full`, `closed`)
    SubscriberOverflow,

    // === Scheduler events ===
    /// A periodic timer was (re)created.
    ///
    /// Sets:
    /// - `interval_minutes`: configured interval
    /// - `duration_ms`: effective period
    SchedulerStarted,

    /// `restart()` read an interval `<= 0`; no timer is active.
    ///
    /// Sets:
    /// - `interval_minutes`: configured interval
    SchedulerDisabled,

    /// The active timer was stopped by `pause()`.
    SchedulerPaused,

    // === Save events ===
    /// A snapshot of the live state was produced.
    ///
    /// Sets:
    /// - `duration_ms`: time spent copying the state
    SnapshotTaken,

    /// Status: the save lock was acquired and persistence is running.
    ///
    /// Sets:
    /// - `path`: autosave artifact path
    AutosaveStarted,

    /// Status: the snapshot was persisted.
    ///
    /// Sets:
    /// - `path`: autosave artifact path
    /// - `duration_ms`: time spent persisting
    AutosaveCompleted,

    /// Error report: snapshotting or persisting failed.
    ///
    /// Sets:
    /// - `reason`: failure message
    /// - `path`: autosave artifact path (when persistence was reached)
    AutosaveFailed,

    /// The save flag was found set on a path that never acquired it and was forced idle.
    ///
    /// Sets:
    /// - `reason`: failure that exposed the inconsistency
    FlagForceReset,

    // === Recovery events ===
    /// A leftover artifact was found and the user was asked about it.
    ///
    /// Sets:
    /// - `path`: artifact path
    /// - `reason`: last-modified time, rendered
    RecoveryOffered,

    /// The user confirmed recovery and the artifact was loaded.
    RecoveryAccepted,

    /// The user declined recovery.
    RecoveryDeclined,

    /// The autosave artifact was deleted.
    AutosavePurged,

    /// The active document identity pointed at the autosave artifact and was cleared.
    DocumentDetached,

    // === Shutdown events ===
    /// Shutdown requested (OS signal observed or explicit call).
    ShutdownRequested,

    /// The in-flight save (if any) finished within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; an autosave was still running.
    GraceExceeded,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Duration associated with the event in milliseconds (compact).
    pub duration_ms: Option<u64>,
    /// Configured interval in minutes.
    pub interval_minutes: Option<i64>,
    /// Path of the autosave artifact.
    pub path: Option<Arc<Path>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            duration_ms: None,
            interval_minutes: None,
            path: None,
            reason: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a duration (stored as milliseconds).
    #[inline]
    pub fn with_duration(mut self, d: Duration) -> Self {
        let ms = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        self.duration_ms = Some(ms);
        self
    }

    /// Attaches the configured interval.
    #[inline]
    pub fn with_interval(mut self, minutes: i64) -> Self {
        self.interval_minutes = Some(minutes);
        self
    }

    /// Attaches the artifact path.
    #[inline]
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(Arc::from(path.as_ref()));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }

    /// True for the two status notifications (`AutosaveStarted`, `AutosaveCompleted`).
    #[inline]
    pub fn is_status(&self) -> bool {
        matches!(
            self.kind,
            EventKind::AutosaveStarted | EventKind::AutosaveCompleted
        )
    }

    /// True for error notifications surfaced to the user.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self.kind, EventKind::AutosaveFailed | EventKind::FlagForceReset)
    }
}
