//! # Event subscriber trait.
//!
//! [`Subscribe`] is how the host turns coordinator events into user feedback:
//! a status line while autosaving, an error dialog on failure, a log record.
//! [`SubscriberSet`](crate::SubscriberSet) gives every subscriber its own queue
//! and worker task, so a slow dialog never holds up a save.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use autosave::{Event, EventKind, Subscribe};
//!
//! struct StatusBar;
//!
//! #[async_trait]
//! impl Subscribe for StatusBar {
//!     async fn on_event(&self, ev: &Event) {
//!         match ev.kind {
//!             EventKind::AutosaveStarted => { /* "Autosaving..." */ }
//!             EventKind::AutosaveCompleted => { /* "Autosave complete" */ }
//!             EventKind::AutosaveFailed => { /* show error dialog */ }
//!             _ => {}
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "status-bar" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receives coordinator events on a dedicated worker task.
///
/// Do not block the executor in `on_event`; hand UI work to the UI thread.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event. Events arrive in publish order.
    async fn on_event(&self, event: &Event);

    /// Name reported in overflow and panic events. Defaults to the type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue length before events are dropped for this subscriber (min 1).
    fn queue_capacity(&self) -> usize {
        256
    }
}
