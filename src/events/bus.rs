//! # Event bus.
//!
//! [`Bus`] carries [`Event`]s from the scheduler, save tasks and the recovery
//! manager to whoever listens: the builder's subscriber listener, host code
//! holding a receiver, and tests.
//!
//! ```text
//! Scheduler ──┐
//! Save task ──┼─► Bus ──┬─► subscriber listener ─► SubscriberSet
//! Recovery ───┘         └─► Autosave::subscribe()
//! ```
//!
//! Publishing never waits. Receivers that fall behind the ring buffer see
//! `RecvError::Lagged(n)`; events sent with no receiver attached are gone.

use tokio::sync::broadcast;

use super::event::Event;

/// Fire-and-forget broadcast of coordinator events. Clones share one channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus holding up to `capacity` undelivered events (at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Sends `event` to every current receiver; dropped if there are none.
    pub fn publish(&self, event: Event) {
        if self.tx.send(event).is_err() {
            tracing::trace!("event dropped: no receivers");
        }
    }

    /// Receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
