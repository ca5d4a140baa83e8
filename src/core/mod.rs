//! Runtime core: scheduling, save arbitration and lifecycle.
//!
//! Public API from this module: [`Autosave`] (with [`AutosaveBuilder`]),
//! [`Scheduler`], [`SaveLock`] / [`SaveGuard`] and [`Config`].
//!
//! Internal modules:
//! - [`config`]: runtime settings;
//! - [`lock`]: the shared save flag and its release-on-drop guard;
//! - [`scheduler`]: restartable periodic timer;
//! - [`autosave`]: per-fire protocol (snapshot, background save, reschedule);
//! - [`builder`]: wiring of bus, subscribers, scheduler and coordinator;
//! - [`shutdown`]: OS signal handling.

mod autosave;
mod builder;
mod config;
mod lock;
mod scheduler;
mod shutdown;

pub use autosave::{Attempt, Autosave, SaveOutcome};
pub use builder::AutosaveBuilder;
pub use config::Config;
pub use lock::{SaveGuard, SaveLock};
pub use scheduler::Scheduler;
