//! Per-window call ceiling for model requests
//!
//! The limiter keeps a single counter and the timestamp of the last admitted
//! call. A call arriving within `window` of the previous admitted call bumps
//! the counter; one arriving later starts a fresh window with the counter at
//! one. This is not a sliding window: a steady trickle of calls spaced just
//! under `window` apart keeps the same window open indefinitely, and a denied
//! call does not move the last-call timestamp.

use crate::error::{Result, VibeError};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Default)]
struct WindowState {
    count: u32,
    last_call_at: Option<i64>,
}

/// Fixed-ceiling call limiter
///
/// # Examples
///
/// ```
/// use vinylvibe::gateway::RateLimiter;
/// use std::time::Duration;
///
/// let limiter = RateLimiter::new(Duration::from_secs(60), 2);
/// assert!(limiter.try_acquire(0).is_ok());
/// assert!(limiter.try_acquire(1_000).is_ok());
/// assert!(limiter.try_acquire(2_000).is_err());
/// assert!(limiter.try_acquire(62_000).is_ok());
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    window_ms: i64,
    max_calls: u32,
    state: Mutex<WindowState>,
}

impl RateLimiter {
    /// Create a limiter admitting `max_calls` per `window`
    pub fn new(window: Duration, max_calls: u32) -> Self {
        Self {
            window_ms: window.as_millis() as i64,
            max_calls,
            state: Mutex::new(WindowState::default()),
        }
    }

    /// Admit or refuse a call at `now_ms`
    ///
    /// # Errors
    ///
    /// Returns `VibeError::RateLimitExceeded` when the call would exceed the
    /// ceiling. No state other than the counter changes in that case.
    pub fn try_acquire(&self, now_ms: i64) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let within_window = state
            .last_call_at
            .map(|last| now_ms - last < self.window_ms)
            .unwrap_or(false);

        if within_window {
            state.count = state.count.saturating_add(1);
            if state.count > self.max_calls {
                return Err(VibeError::RateLimitExceeded {
                    limit: self.max_calls,
                    message: format!(
                        "maximum {} calls per {} seconds",
                        self.max_calls,
                        self.window_ms / 1000
                    ),
                }
                .into());
            }
        } else {
            state.count = 1;
        }

        state.last_call_at = Some(now_ms);
        Ok(())
    }

    /// Calls counted in the current window
    pub fn current_count(&self) -> u32 {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .count
    }

    /// Configured ceiling
    pub fn max_calls(&self) -> u32 {
        self.max_calls
    }
}
