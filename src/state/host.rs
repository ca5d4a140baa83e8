//! # Host-side collaborators.
//!
//! Small traits through which the coordinator and the recovery manager query or
//! drive the host application:
//!
//! - [`Ownership`]: "is this process authoritative for the document?"
//! - [`IntervalSource`]: configured autosave interval in minutes
//! - [`RecoveryPrompt`]: yes/no confirmation for recovering a leftover artifact
//! - [`Workspace`]: active document identity and loading
//!
//! Closures implement the single-method traits, so hosts rarely need named types.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::SystemTime;

use crate::error::AutosaveError;

/// Ownership predicate consulted before every autosave attempt.
pub trait Ownership: Send + Sync + 'static {
    /// True when this process hosts or solely owns the document.
    fn is_authoritative(&self) -> bool;
}

impl<F> Ownership for F
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    fn is_authoritative(&self) -> bool {
        self()
    }
}

/// Source of the configured autosave interval.
///
/// Read on every `restart()`; `<= 0` disables autosave.
pub trait IntervalSource: Send + Sync + 'static {
    /// Interval in minutes.
    fn interval_minutes(&self) -> i64;
}

impl<F> IntervalSource for F
where
    F: Fn() -> i64 + Send + Sync + 'static,
{
    fn interval_minutes(&self) -> i64 {
        self()
    }
}

/// Shareable interval preference.
///
/// Clones observe the same value, so the preferences UI can hold one handle
/// while the scheduler reads another.
#[derive(Clone, Debug)]
pub struct AutosaveInterval {
    minutes: Arc<AtomicI64>,
}

impl AutosaveInterval {
    /// Default interval in minutes.
    pub const DEFAULT_MINUTES: i64 = 5;

    /// Creates a preference holding `minutes`.
    pub fn new(minutes: i64) -> Self {
        Self {
            minutes: Arc::new(AtomicI64::new(minutes)),
        }
    }

    /// Updates the value. Takes effect on the next `restart()`.
    pub fn set(&self, minutes: i64) {
        self.minutes.store(minutes, Ordering::Release);
    }

    /// Current value.
    pub fn get(&self) -> i64 {
        self.minutes.load(Ordering::Acquire)
    }
}

impl Default for AutosaveInterval {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MINUTES)
    }
}

impl IntervalSource for AutosaveInterval {
    fn interval_minutes(&self) -> i64 {
        self.get()
    }
}

/// Confirmation surface for recovering a leftover autosave.
pub trait RecoveryPrompt: Send + Sync + 'static {
    /// Asks the user whether to recover the artifact last modified at `modified`.
    fn confirm_recovery(&self, modified: SystemTime) -> bool;
}

impl<F> RecoveryPrompt for F
where
    F: Fn(SystemTime) -> bool + Send + Sync + 'static,
{
    fn confirm_recovery(&self, modified: SystemTime) -> bool {
        self(modified)
    }
}

/// Host workspace: the active document and how to load one.
pub trait Workspace: Send + Sync + 'static {
    /// Identity (file path) of the active document, `None` for an unsaved one.
    fn active_document(&self) -> Option<PathBuf>;

    /// Forgets the active document's identity so the next save is a "save as new".
    fn clear_active_document(&self);

    /// Loads `path` as the active document.
    fn load_document(&self, path: &Path) -> Result<(), AutosaveError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_clones_share_value() {
        let prefs = AutosaveInterval::default();
        assert_eq!(prefs.interval_minutes(), AutosaveInterval::DEFAULT_MINUTES);

        let reader = prefs.clone();
        prefs.set(0);
        assert_eq!(reader.interval_minutes(), 0);
    }

    #[test]
    fn test_closures_implement_collaborators() {
        let owner = || true;
        let interval = || 3_i64;
        let prompt = |_at: SystemTime| false;

        assert!(owner.is_authoritative());
        assert_eq!(interval.interval_minutes(), 3);
        assert!(!prompt.confirm_recovery(SystemTime::UNIX_EPOCH));
    }
}
