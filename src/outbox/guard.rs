//! Duplicate-submit suppression for input surfaces.
//!
//! Rapid UI events (double Enter, double click) can fire one user action
//! twice. The queue deliberately does not de-duplicate, so input
//! handlers hold a [`SubmitGuard`] and only forward acquisitions.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default suppression window.
const DEFAULT_WINDOW: Duration = Duration::from_millis(300);

/// Allows one submission per time window.
#[derive(Debug)]
pub struct SubmitGuard {
    window: Duration,
    last: Mutex<Option<Instant>>,
}

impl Default for SubmitGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmitGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    #[must_use]
    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            last: Mutex::new(None),
        }
    }

    /// Returns `true` if the submission may proceed; `false` when a
    /// previous acquisition is still inside the window.
    pub fn try_acquire(&self) -> bool {
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();
        match *last {
            Some(previous) if now.duration_since(previous) < self.window => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}
