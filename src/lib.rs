//! # autosave
//!
//! **autosave** is a crash-recovery autosave coordinator for tokio applications.
//!
//! It periodically snapshots mutable application state and writes it to one
//! well-known recovery file, without racing a concurrent manual save of the same
//! state, and without blocking the interactive side beyond the cost of the copy.
//!
//! ## Architecture
//! ```text
//!   ┌───────────────┐  fire every N min   ┌──────────────────────────────────────┐
//!   │   Scheduler   │ ──────────────────► │ Autosave::attempt()   (caller thread)│
//!   │ (one timer,   │                     │  - ownership check                   │
//!   │  restartable) │ ◄───── pause ────┐  │  - snapshot (SnapshotSource)         │
//!   └───────────────┘ ◄──── restart ─┐ │  └──────────────────┬───────────────────┘
//!                                    │ │                     ▼ spawn (owns snapshot)
//!                                    │ │  ┌──────────────────────────────────────┐
//!   ┌───────────────┐ try_acquire    │ └──│ save task             (runtime)      │
//!   │   SaveLock    │ ◄──────────────┼────│  - lock or skip                      │
//!   │ (shared with  │                │    │  - Persist::persist(snapshot, path)  │
//!   │  manual save) │ ◄── release ───┴────│  - release + restart on every exit   │
//!   └───────────────┘                     └──────────────────┬───────────────────┘
//!                                                            ▼ publish
//!                                     Bus ──► SubscriberSet ──► status bar / error dialog
//! ```
//!
//! On startup, [`Recovery::check`] offers to reload a leftover artifact;
//! [`Recovery::purge`] and [`Recovery::tidy`] clean it up after a real save.
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                          |
//! |-------------------|-----------------------------------------------------------------|---------------------------------------------|
//! | **Coordination**  | Snapshot, lock arbitration, background write, rescheduling.     | [`Autosave`], [`SaveLock`], [`Scheduler`]   |
//! | **Collaborators** | Host hooks for state, persistence, ownership, interval.         | [`SnapshotSource`], [`Persist`], [`Ownership`] |
//! | **Recovery**      | Startup detection, purge, tidy.                                 | [`Recovery`], [`RecoveryPrompt`], [`Workspace`] |
//! | **Events**        | Status/error notifications and lifecycle events.                | [`Event`], [`EventKind`], [`Subscribe`]     |
//! | **Errors**        | Typed errors for save attempts and the runtime.                 | [`AutosaveError`], [`RuntimeError`]         |
//! | **Configuration** | Interval unit, bus capacity, shutdown grace.                    | [`Config`], [`AutosaveInterval`]            |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a subscriber rendering events through `tracing`.
//!
//! ## Example
//! ```rust,no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use autosave::{
//!     Autosave, AutosaveError, AutosaveInterval, AutosavePath, Config, PersistFn, SharedState,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let live = SharedState::new(vec![String::from("map-1")]);
//!     let prefs = AutosaveInterval::new(5);
//!
//!     let writer = PersistFn::arc(|maps: Vec<String>, path: PathBuf| async move {
//!         tokio::fs::write(&path, maps.join("\n"))
//!             .await
//!             .map_err(|source| AutosaveError::Io { path, source })
//!     });
//!
//!     let autosave = Autosave::<Vec<String>>::builder(
//!         Config::default(),
//!         AutosavePath::new("/home/gm/.myapp", "cmpgn"),
//!         Arc::new(live.clone()),
//!         writer,
//!     )
//!     .with_interval(Arc::new(prefs.clone()))
//!     .build()?;
//!
//!     // Manual saves contend for the same lock.
//!     let manual = autosave.save_lock().clone();
//!     if let Some(_guard) = manual.try_acquire() {
//!         // write the named file...
//!     }
//!
//!     autosave.run_until_signal().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod path;
mod recovery;
mod state;
mod subscribers;

// ---- Public re-exports ----

pub use self::core::{
    Attempt, Autosave, AutosaveBuilder, Config, SaveGuard, SaveLock, SaveOutcome, Scheduler,
};
pub use error::{AutosaveError, RuntimeError, SkipReason};
pub use events::{Bus, Event, EventKind};
pub use path::{AUTOSAVE_DIR, AUTOSAVE_STEM, AutosavePath};
pub use recovery::Recovery;
pub use state::{
    AutosaveInterval, IntervalSource, Ownership, Persist, PersistFn, RecoveryPrompt, SharedState,
    SnapshotSource, Workspace,
};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

