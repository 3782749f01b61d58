//! Wall-clock abstraction
//!
//! Every timestamp the engine records (cooldowns, cache ages, rate-limit
//! windows, feedback events) is read through a [`Clock`] so tests can move
//! time forward without sleeping.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Source of the current time in milliseconds since the Unix epoch
pub trait Clock: Send + Sync {
    /// Current time in epoch milliseconds
    fn now_millis(&self) -> i64;
}

/// Clock backed by the system wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for tests and simulations
///
/// # Examples
///
/// ```
/// use vinylvibe::clock::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new(1_000);
/// clock.advance(Duration::from_secs(2));
/// assert_eq!(clock.now_millis(), 3_000);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at `start_millis`
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }

    /// Jump to an absolute time
    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
