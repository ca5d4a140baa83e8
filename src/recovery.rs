//! # Recovery manager: leftover autosave detection and cleanup.
//!
//! - [`Recovery::check`]: on startup, offer to reload a leftover artifact.
//! - [`Recovery::purge`]: delete the artifact if present.
//! - [`Recovery::tidy`]: detach the active document from the artifact, then purge.
//!
//! All operations are synchronous: they run at startup or right after a manual
//! save, on the interactive thread, next to a modal prompt.

use std::io;
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::AutosaveError;
use crate::events::{Bus, Event, EventKind};
use crate::path::AutosavePath;
use crate::state::{RecoveryPrompt, Workspace};

/// Startup recovery and artifact cleanup.
pub struct Recovery {
    path: AutosavePath,
    bus: Bus,
    prompt: Arc<dyn RecoveryPrompt>,
    workspace: Arc<dyn Workspace>,
}

impl Recovery {
    /// Creates a recovery manager for `path`.
    pub fn new(
        path: AutosavePath,
        bus: Bus,
        prompt: Arc<dyn RecoveryPrompt>,
        workspace: Arc<dyn Workspace>,
    ) -> Self {
        Self {
            path,
            bus,
            prompt,
            workspace,
        }
    }

    /// Offers to recover a leftover artifact. Returns `true` if it was loaded.
    ///
    /// No artifact → `Ok(false)` without prompting.
    pub fn check(&self) -> Result<bool, AutosaveError> {
        let Some(modified) = self.modified()? else {
            return Ok(false);
        };

        self.bus.publish(
            Event::new(EventKind::RecoveryOffered)
                .with_path(&self.path)
                .with_reason(format!("{modified:?}")),
        );
        if !self.prompt.confirm_recovery(modified) {
            tracing::info!(path = %self.path.as_path().display(), "autosave recovery declined");
            self.bus
                .publish(Event::new(EventKind::RecoveryDeclined).with_path(&self.path));
            return Ok(false);
        }

        self.workspace.load_document(self.path.as_path())?;
        tracing::info!(path = %self.path.as_path().display(), "autosave recovered");
        self.bus
            .publish(Event::new(EventKind::RecoveryAccepted).with_path(&self.path));
        Ok(true)
    }

    /// Deletes the artifact. Returns `true` if one was removed.
    pub fn purge(&self) -> Result<bool, AutosaveError> {
        match std::fs::remove_file(self.path.as_path()) {
            Ok(()) => {
                self.bus
                    .publish(Event::new(EventKind::AutosavePurged).with_path(&self.path));
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(self.io_error(source)),
        }
    }

    /// Forces "save as new" when working from the artifact, then purges.
    ///
    /// The document identity is cleared only if it equals the artifact path.
    pub fn tidy(&self) -> Result<bool, AutosaveError> {
        let active = self.workspace.active_document();
        if active.as_deref().is_some_and(|p| self.path.matches(p)) {
            self.workspace.clear_active_document();
            self.bus
                .publish(Event::new(EventKind::DocumentDetached).with_path(&self.path));
        }
        self.purge()
    }

    /// The artifact path.
    pub fn path(&self) -> &AutosavePath {
        &self.path
    }

    /// Last-modified time of the artifact, `None` if it does not exist.
    fn modified(&self) -> Result<Option<SystemTime>, AutosaveError> {
        let meta = match std::fs::metadata(self.path.as_path()) {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };
        meta.modified().map(Some).map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: io::Error) -> AutosaveError {
        AutosaveError::Io {
            path: self.path.as_path().to_path_buf(),
            source,
        }
    }
}
