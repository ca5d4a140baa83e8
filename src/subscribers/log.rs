//! # Logging subscriber.
//!
//! [`LogWriter`] renders events through `tracing` in a compact, human-readable
//! format. Useful during development and as a reference [`Subscribe`] impl.
//!
//! ## Output format
//! ```text
//! [scheduler-started] interval=5min period=300000ms
//! [snapshot] copy=12ms
//! [autosave-started] path=".../autosave/AutoSave.cmpgn"
//! [autosave-completed] took=340ms
//! [autosave-failed] err="persist failed: disk full"
//! [purged] path=".../autosave/AutoSave.cmpgn"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// `tracing`-backed logging subscriber.
///
/// Enabled via the `logging` feature.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    /// Creates a new log writer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::SchedulerStarted => tracing::debug!(
                "[scheduler-started] interval={:?}min period={:?}ms",
                e.interval_minutes,
                e.duration_ms
            ),
            EventKind::SchedulerDisabled => {
                tracing::debug!("[scheduler-disabled] interval={:?}min", e.interval_minutes)
            }
            EventKind::SchedulerPaused => tracing::debug!("[scheduler-paused]"),
            EventKind::SnapshotTaken => tracing::info!("[snapshot] copy={:?}ms", e.duration_ms),
            EventKind::AutosaveStarted => tracing::info!("[autosave-started] path={:?}", e.path),
            EventKind::AutosaveCompleted => {
                tracing::info!("[autosave-completed] took={:?}ms", e.duration_ms)
            }
            EventKind::AutosaveFailed => tracing::error!("[autosave-failed] err={:?}", e.reason),
            EventKind::FlagForceReset => tracing::error!("[flag-force-reset] err={:?}", e.reason),
            EventKind::RecoveryOffered => {
                tracing::info!("[recovery-offered] path={:?} modified={:?}", e.path, e.reason)
            }
            EventKind::RecoveryAccepted => tracing::info!("[recovery-accepted] path={:?}", e.path),
            EventKind::RecoveryDeclined => tracing::info!("[recovery-declined] path={:?}", e.path),
            EventKind::AutosavePurged => tracing::debug!("[purged] path={:?}", e.path),
            EventKind::DocumentDetached => tracing::debug!("[detached] path={:?}", e.path),
            EventKind::ShutdownRequested => tracing::info!("[shutdown-requested]"),
            EventKind::AllStoppedWithin => tracing::info!("[all-stopped-within-grace]"),
            EventKind::GraceExceeded => tracing::warn!("[grace-exceeded]"),
            EventKind::SubscriberPanicked | EventKind::SubscriberOverflow => {
                tracing::warn!("[subscriber] {:?}", e.reason)
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::span;

    const ALL: [EventKind; 18] = [
        EventKind::SubscriberPanicked,
        EventKind::SubscriberOverflow,
        EventKind::SchedulerStarted,
        EventKind::SchedulerDisabled,
        EventKind::SchedulerPaused,
        EventKind::SnapshotTaken,
        EventKind::AutosaveStarted,
        EventKind::AutosaveCompleted,
        EventKind::AutosaveFailed,
        EventKind::FlagForceReset,
        EventKind::RecoveryOffered,
        EventKind::RecoveryAccepted,
        EventKind::RecoveryDeclined,
        EventKind::AutosavePurged,
        EventKind::DocumentDetached,
        EventKind::ShutdownRequested,
        EventKind::AllStoppedWithin,
        EventKind::GraceExceeded,
    ];

    #[derive(Default)]
    struct Counts {
        total: AtomicUsize,
        warn: AtomicUsize,
        error: AtomicUsize,
    }

    /// Counts records per level.
    struct Tally(Arc<Counts>);

    impl tracing::Subscriber for Tally {
        fn enabled(&self, _: &tracing::Metadata<'_>) -> bool {
            true
        }
        fn new_span(&self, _: &span::Attributes<'_>) -> span::Id {
            span::Id::from_u64(1)
        }
        fn record(&self, _: &span::Id, _: &span::Record<'_>) {}
        fn record_follows_from(&self, _: &span::Id, _: &span::Id) {}
        fn event(&self, event: &tracing::Event<'_>) {
            self.0.total.fetch_add(1, Ordering::SeqCst);
            let level = *event.metadata().level();
            if level == tracing::Level::WARN {
                self.0.warn.fetch_add(1, Ordering::SeqCst);
            } else if level == tracing::Level::ERROR {
                self.0.error.fetch_add(1, Ordering::SeqCst);
            }
        }
        fn enter(&self, _: &span::Id) {}
        fn exit(&self, _: &span::Id) {}
    }

    #[test]
    fn test_every_event_kind_is_logged_once() {
        let counts = Arc::new(Counts::default());
        let writer = LogWriter::new();

        tracing::subscriber::with_default(Tally(counts.clone()), || {
            futures::executor::block_on(async {
                for kind in ALL {
                    let ev = Event::new(kind)
                        .with_reason("disk full")
                        .with_path("/home/gm/autosave/AutoSave.cmpgn");
                    writer.on_event(&ev).await;
                }
            });
        });

        assert_eq!(counts.total.load(Ordering::SeqCst), ALL.len());
        assert_eq!(counts.error.load(Ordering::SeqCst), 2);
        assert_eq!(counts.warn.load(Ordering::SeqCst), 3);
        assert_eq!(writer.name(), "log-writer");
    }
}
