//! # Save lock: the single flag shared by automatic and manual saves.
//!
//! [`SaveLock`] wraps one mutex-guarded holder slot. Every read and write of the
//! flag happens inside the mutex, and the only way to set it is
//! [`SaveLock::try_acquire`], which returns a [`SaveGuard`] that clears it on
//! drop. The flag therefore cannot stay "saving" after the holder returns,
//! fails, or panics.
//!
//! Each acquisition is stamped with a generation: a guard only ever clears its
//! own generation, and a flag whose guard is gone is the only one that may be
//! forced idle.
//!
//! ## State machine
//! ```text
//! idle ──try_acquire()──► saving ──drop(SaveGuard)──► idle
//!   ▲                       │
//!   └───────────────────────┘ try_acquire() while saving → None (no-op)
//! ```
//!
//! The same handle is injected into the autosave coordinator and handed to the
//! host's manual-save path, so both contend for one resource:
//!
//! ```rust
//! use autosave::SaveLock;
//!
//! let lock = SaveLock::new();
//! let manual = lock.clone();
//!
//! let guard = manual.try_acquire().expect("idle");
//! assert!(lock.is_saving());
//! assert!(lock.try_acquire().is_none());
//!
//! drop(guard);
//! assert!(!lock.is_saving());
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Shared "save in progress" flag.
#[derive(Clone, Debug, Default)]
pub struct SaveLock {
    state: Arc<Mutex<LockState>>,
}

#[derive(Debug, Default)]
struct LockState {
    holder: Option<Holder>,
    next_generation: u64,
}

/// Current owner of the flag.
#[derive(Debug)]
struct Holder {
    generation: u64,
    /// Dead once the owning guard is gone without having released.
    alive: Weak<()>,
}

impl SaveLock {
    /// Creates an idle lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically checks and sets the flag.
    ///
    /// Returns `None` (and changes nothing) when a save is already in progress.
    #[must_use = "dropping the guard immediately releases the lock"]
    pub fn try_acquire(&self) -> Option<SaveGuard> {
        let mut st = self.state();
        if st.holder.is_some() {
            return None;
        }
        let generation = st.next_generation;
        st.next_generation = st.next_generation.wrapping_add(1);

        let alive = Arc::new(());
        st.holder = Some(Holder {
            generation,
            alive: Arc::downgrade(&alive),
        });
        Some(SaveGuard {
            lock: self.clone(),
            generation,
            _alive: alive,
        })
    }

    /// True while some holder owns the lock.
    pub fn is_saving(&self) -> bool {
        self.state().holder.is_some()
    }

    /// Clears the flag only if its holder no longer exists. Returns whether it did.
    ///
    /// A live holder (e.g. a manual save in progress) is never touched.
    pub(crate) fn release_orphan(&self) -> bool {
        let mut st = self.state();
        match &st.holder {
            Some(h) if h.alive.strong_count() == 0 => {
                tracing::warn!(generation = h.generation, "releasing orphaned save flag");
                st.holder = None;
                true
            }
            _ => false,
        }
    }

    /// Marks the flag as held by an owner that is already gone.
    #[cfg(test)]
    pub(crate) fn orphan(&self) {
        let mut st = self.state();
        let generation = st.next_generation;
        st.next_generation += 1;
        st.holder = Some(Holder {
            generation,
            alive: Weak::new(),
        });
    }

    fn state(&self) -> MutexGuard<'_, LockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof of holding the [`SaveLock`]; releases it on drop.
#[derive(Debug)]
pub struct SaveGuard {
    lock: SaveLock,
    generation: u64,
    _alive: Arc<()>,
}

impl Drop for SaveGuard {
    fn drop(&mut self) {
        let mut st = self.lock.state();
        if st
            .holder
            .as_ref()
            .is_some_and(|h| h.generation == self.generation)
        {
            st.holder = None;
        }
    }
}
