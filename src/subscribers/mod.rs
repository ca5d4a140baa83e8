//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out,
//! and (with the `logging` feature) the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Scheduler / save task / Recovery ── publish(Event) ──► Bus
//!                                                          │
//!                                               subscriber listener
//!                                                          │
//!                                                          ▼
//!                                                   SubscriberSet::emit
//!                                               ┌──────────┼──────────┐
//!                                               ▼          ▼          ▼
//!                                          StatusBar  ErrorDialog  LogWriter
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
