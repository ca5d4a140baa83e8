//! # Snapshot producer.
//!
//! A [`SnapshotSource`] turns the live, mutable application state into an
//! independent value that the background save task can own exclusively.
//! It runs **synchronously on the triggering thread**, before any locking, so the
//! snapshot reflects the state at trigger time.
//!
//! Any `Fn() -> Result<S, AutosaveError>` is a source. [`SharedState`] covers the
//! common case of a `Clone` model behind a read-write lock.
//!
//! ## Example
//! ```rust
//! use autosave::{SharedState, SnapshotSource};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Campaign { name: String, tokens: Vec<u32> }
//!
//! let live = SharedState::new(Campaign { name: "crypt".into(), tokens: vec![1, 2] });
//! let snap = live.snapshot().unwrap();
//!
//! live.write().tokens.push(3);
//! assert_eq!(snap.tokens, vec![1, 2]);
//! ```

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::AutosaveError;

/// Produces independent copies of the live state.
pub trait SnapshotSource<S>: Send + Sync + 'static {
    /// Returns a copy that is unaffected by later mutation of the live state.
    fn snapshot(&self) -> Result<S, AutosaveError>;
}

impl<S, F> SnapshotSource<S> for F
where
    F: Fn() -> Result<S, AutosaveError> + Send + Sync + 'static,
{
    fn snapshot(&self) -> Result<S, AutosaveError> {
        self()
    }
}

/// Live application model shared between the interactive side and the autosave source.
///
/// Cloning the handle shares the same model. Snapshots are deep copies via `T: Clone`.
#[derive(Debug, Default)]
pub struct SharedState<T> {
    inner: Arc<RwLock<T>>,
}

impl<T> Clone for SharedState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SharedState<T> {
    /// Wraps the initial model.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
        }
    }

    /// Read access to the live model.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write access to the live model.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> SnapshotSource<T> for SharedState<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn snapshot(&self) -> Result<T, AutosaveError> {
        Ok(self.read().clone())
    }
}
