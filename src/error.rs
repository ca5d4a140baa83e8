//! Error types used by the autosave runtime and its collaborators.
//!
//! This module defines two main error enums:
//!
//! - [`RuntimeError`]: errors raised while building or shutting down the runtime.
//! - [`AutosaveError`]: errors raised by a single save attempt or a recovery operation.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//!
//! Skipped attempts are **not** errors; see [`SkipReason`].

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the autosave runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The builder was used outside of a tokio runtime.
    #[error("no tokio runtime available: {error}")]
    NoRuntime {
        /// The underlying error message.
        error: String,
    },

    /// An in-flight save did not finish within the shutdown grace period.
    #[error("shutdown timeout {grace:?} exceeded; autosave still in flight")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use autosave::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5) };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::NoRuntime { .. } => "runtime_missing",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::NoRuntime { error } => format!("no runtime: {error}"),
            RuntimeError::GraceExceeded { grace } => {
                format!("grace exceeded after {grace:?}")
            }
        }
    }
}

/// # Errors produced by save attempts and recovery operations.
///
/// None of these are fatal: the coordinator reports them as
/// [`EventKind::AutosaveFailed`](crate::EventKind::AutosaveFailed) and keeps
/// scheduling the next attempt.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AutosaveError {
    /// The snapshot producer could not copy the live state.
    #[error("snapshot failed: {error}")]
    Snapshot {
        /// The underlying error message.
        error: String,
    },

    /// The persistence collaborator failed to write the snapshot.
    #[error("persist failed: {error}")]
    Persist {
        /// The underlying error message.
        error: String,
    },

    /// A collaborator panicked while snapshotting or persisting.
    #[error("collaborator panicked: {error}")]
    Panicked {
        /// Panic payload rendered as text.
        error: String,
    },

    /// The save flag was found set on a path where nothing could have set it.
    /// The flag has been forced back to idle.
    #[error("save flag was left set and has been reset; cause: {cause}")]
    InconsistentFlag {
        /// The failure that exposed the inconsistent state.
        cause: Box<AutosaveError>,
    },

    /// Filesystem operation on the autosave artifact failed.
    #[error("io error on {path:?}: {source}")]
    Io {
        /// Path the operation targeted.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The workspace could not load the recovered artifact.
    #[error("load failed: {error}")]
    Load {
        /// The underlying error message.
        error: String,
    },
}

impl AutosaveError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use autosave::AutosaveError;
    ///
    /// let err = AutosaveError::Persist { error: "disk full".into() };
    /// assert_eq!(err.as_label(), "autosave_persist_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            AutosaveError::Snapshot { .. } => "autosave_snapshot_failed",
            AutosaveError::Persist { .. } => "autosave_persist_failed",
            AutosaveError::Panicked { .. } => "autosave_panicked",
            AutosaveError::InconsistentFlag { .. } => "autosave_inconsistent_flag",
            AutosaveError::Io { .. } => "autosave_io",
            AutosaveError::Load { .. } => "autosave_load_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            AutosaveError::Snapshot { error } => format!("snapshot: {error}"),
            AutosaveError::Persist { error } => format!("persist: {error}"),
            AutosaveError::Panicked { error } => format!("panic: {error}"),
            AutosaveError::InconsistentFlag { cause } => {
                format!("save flag was still set; {}", cause.as_message())
            }
            AutosaveError::Io { path, source } => format!("io: {}: {source}", path.display()),
            AutosaveError::Load { error } => format!("load: {error}"),
        }
    }

    /// Builds a [`AutosaveError::Panicked`] from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let error = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        AutosaveError::Panicked { error }
    }
}

/// Why an attempt was dropped without saving.
///
/// Dropped attempts are neither queued nor retried; the periodic timer simply
/// fires again after the next interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// This process is not authoritative for the document.
    NotAuthoritative,
    /// Another save (typically a manual one) holds the save lock.
    SaveInProgress,
}

impl SkipReason {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SkipReason::NotAuthoritative => "skipped_not_authoritative",
            SkipReason::SaveInProgress => "skipped_save_in_progress",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inconsistent_flag_wraps_cause() {
        let err = AutosaveError::InconsistentFlag {
            cause: Box::new(AutosaveError::Snapshot {
                error: "boom".into(),
            }),
        };
        assert_eq!(err.as_label(), "autosave_inconsistent_flag");
        assert!(err.as_message().contains("snapshot: boom"));
        assert!(err.to_string().contains("snapshot failed: boom"));
    }

    #[test]
    fn test_panic_payload_rendering() {
        let err = AutosaveError::from_panic(Box::new("static str"));
        assert_eq!(err.as_message(), "panic: static str");

        let err = AutosaveError::from_panic(Box::new(String::from("owned")));
        assert_eq!(err.as_message(), "panic: owned");

        let err = AutosaveError::from_panic(Box::new(42_u8));
        assert_eq!(err.as_message(), "panic: non-string panic payload");
    }

    #[test]
    fn test_skip_labels() {
        assert_eq!(
            SkipReason::NotAuthoritative.as_label(),
            "skipped_not_authoritative"
        );
        assert_eq!(
            SkipReason::SaveInProgress.as_label(),
            "skipped_save_in_progress"
        );
    }
}
