//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the autosave runtime.
//!
//! The autosave *interval* itself is not part of `Config`: it is read from an
//! [`IntervalSource`](crate::IntervalSource) on every `restart()`, so a
//! preference change takes effect on the next restart.
//!
//! ## Sentinel values
//! - interval `<= 0` → autosave disabled (no timer)
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

/// Global configuration for the autosave runtime.
///
/// ## Field semantics
/// - `unit`: length of one interval "minute" (`60s` in production, shorter in tests and demos)
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `grace`: Maximum wait for an in-flight save during shutdown
#[derive(Clone, Debug)]
pub struct Config {
    /// Wall-clock length of one configured interval unit.
    pub unit: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` messages will
    /// receive `Lagged` and skip older items.
    pub bus_capacity: usize,

    /// Maximum time to wait for an in-flight save during shutdown.
    pub grace: Duration,
}

impl Config {
    /// Converts a configured interval into a timer period.
    ///
    /// - `None` → disabled (`minutes <= 0`)
    /// - `Some(d)` → `minutes × unit`
    #[inline]
    pub fn period(&self, minutes: i64) -> Option<Duration> {
        if minutes <= 0 {
            return None;
        }
        let minutes = u32::try_from(minutes).unwrap_or(u32::MAX);
        Some(self.unit.saturating_mul(minutes))
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `unit = 60s`
    /// - `bus_capacity = 1024`
    /// - `grace = 30s`
    fn default() -> Self {
        Self {
            unit: Duration::from_secs(60),
            bus_capacity: 1024,
            grace: Duration::from_secs(30),
        }
    }
}
