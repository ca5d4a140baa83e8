//! # Collaborators supplied by the host application.
//!
//! - [`SnapshotSource`] / [`SharedState`]: copy the live state
//! - [`Persist`] / [`PersistFn`]: write a snapshot to disk
//! - [`Ownership`], [`IntervalSource`] / [`AutosaveInterval`]: per-attempt and per-restart queries
//! - [`RecoveryPrompt`], [`Workspace`]: startup recovery surface

mod host;
mod persist;
mod snapshot;

pub use host::{AutosaveInterval, IntervalSource, Ownership, RecoveryPrompt, Workspace};
pub use persist::{Persist, PersistFn};
pub use snapshot::{SharedState, SnapshotSource};
