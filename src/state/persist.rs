//! # Persistence collaborator and function-backed implementation.
//!
//! [`Persist`] writes an exclusively-owned snapshot to the autosave path. The
//! serialization format and write strategy belong to the implementor; the
//! coordinator only awaits the returned future and treats `Err` (or a panic) as
//! a failed save.
//!
//! The future must not hand work off to a detached task: the save lock is
//! released as soon as it resolves.
//!
//! [`PersistFn`] wraps a closure `F: Fn(S, PathBuf) -> Fut`, producing a fresh
//! future per save.
//!
//! ## Example
//! ```rust
//! use std::path::PathBuf;
//! use autosave::{AutosaveError, Persist, PersistFn};
//!
//! let writer = PersistFn::arc(|snapshot: Vec<u8>, path: PathBuf| async move {
//!     tokio::fs::write(&path, &snapshot)
//!         .await
//!         .map_err(|source| AutosaveError::Io { path, source })
//! });
//! # let _ = writer;
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AutosaveError;

/// Writes a snapshot to the autosave artifact.
#[async_trait]
pub trait Persist<S>: Send + Sync + 'static {
    /// Persists `snapshot` at `path`, returning once the write finished or failed.
    async fn persist(&self, snapshot: S, path: &Path) -> Result<(), AutosaveError>;
}

/// Function-backed persistence.
pub struct PersistFn<S, F> {
    f: F,
    _snapshot: PhantomData<fn(S)>,
}

impl<S, F> PersistFn<S, F> {
    /// Creates a new function-backed writer.
    pub fn new<Fut>(f: F) -> Self
    where
        F: Fn(S, PathBuf) -> Fut,
    {
        Self {
            f,
            _snapshot: PhantomData,
        }
    }

    /// Creates the writer and returns it as a shared handle.
    pub fn arc<Fut>(f: F) -> Arc<Self>
    where
        F: Fn(S, PathBuf) -> Fut,
    {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<S, F, Fut> Persist<S> for PersistFn<S, F>
where
    S: Send + 'static,
    F: Fn(S, PathBuf) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), AutosaveError>> + Send + 'static,
{
    async fn persist(&self, snapshot: S, path: &Path) -> Result<(), AutosaveError> {
        (self.f)(snapshot, path.to_path_buf()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_persist_fn_receives_snapshot_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.bin");

        let writer = PersistFn::new(|snapshot: Vec<u8>, path: PathBuf| async move {
            tokio::fs::write(&path, &snapshot)
                .await
                .map_err(|source| AutosaveError::Io { path, source })
        });
        writer.persist(vec![7, 8, 9], &target).await.unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), vec![7, 8, 9]);
    }

    #[tokio::test]
    async fn test_persist_fn_propagates_error() {
        let writer = PersistFn::new(|_s: (), _p: PathBuf| async {
            Err::<(), _>(AutosaveError::Persist {
                error: "disk full".into(),
            })
        });
        let err = writer.persist((), Path::new("/nowhere")).await.unwrap_err();
        assert_eq!(err.as_label(), "autosave_persist_failed");
    }
}
