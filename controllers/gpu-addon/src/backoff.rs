//! # Fibonacci Backoff
//!
//! Requeue delays for failed reconcile passes, tracked per GPUAddon.
//!
//! Sequence: 1m, 1m, 2m, 3m, 5m, 8m, 10m (max). A successful pass resets the
//! sequence for that add-on.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub const MIN_BACKOFF_MINUTES: u64 = 1;
pub const MAX_BACKOFF_MINUTES: u64 = 10;

/// Fibonacci backoff calculator, in minutes
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min_minutes: u64,
    prev_minutes: u64,
    current_minutes: u64,
    max_minutes: u64,
}

impl FibonacciBackoff {
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            min_minutes,
            prev_minutes: 0,
            current_minutes: min_minutes,
            max_minutes,
        }
    }

    /// Current delay in seconds; advances the sequence
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let result_seconds = self.current_minutes * 60;

        let next_minutes = self.prev_minutes + self.current_minutes;
        self.prev_minutes = self.current_minutes;
        self.current_minutes = std::cmp::min(next_minutes, self.max_minutes);

        result_seconds
    }

    pub fn next_backoff(&mut self) -> Duration {
        Duration::from_secs(self.next_backoff_seconds())
    }

    pub fn reset(&mut self) {
        self.prev_minutes = 0;
        self.current_minutes = self.min_minutes;
    }
}

impl Default for FibonacciBackoff {
    fn default() -> Self {
        Self::new(MIN_BACKOFF_MINUTES, MAX_BACKOFF_MINUTES)
    }
}

/// Backoff state per add-on, keyed by `namespace/name`
#[derive(Debug, Default)]
pub struct BackoffTracker {
    states: Mutex<HashMap<String, FibonacciBackoff>>,
}

impl BackoffTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay before retrying `key` after another failure
    pub fn next_backoff(&self, key: &str) -> Duration {
        let mut states = self.states.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        states.entry(key.to_string()).or_default().next_backoff()
    }

    /// Forget the failures of `key`
    pub fn reset(&self, key: &str) {
        let mut states = self.states.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        states.remove(key);
    }
}
