//! Per-dependency circuit breaker
//!
//! Each dependency name has its own failure counter. Once the counter reaches
//! the threshold the dependency is blocked for `reset_timeout`. There is no
//! background timer: the block is lifted by the first `should_block` call
//! made after it expires, which also clears the counter.
//!
//! Successful calls are not reported to the breaker, so a partial failure
//! count survives any number of successes until a full open/expire cycle.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
pub const DEFAULT_RESET_TIMEOUT: Duration = Duration::from_secs(60);

/// Observable breaker state for one dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitStatus {
    /// Calls are allowed
    Closed,
    /// Calls are blocked until the cool-down expires
    Open,
}

#[derive(Debug, Default)]
struct CircuitState {
    consecutive_failures: u32,
    blocked_until: Option<Instant>,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    reset_timeout: Duration,
    states: Mutex<HashMap<String, CircuitState>>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD, DEFAULT_RESET_TIMEOUT)
    }
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            reset_timeout,
            states: Mutex::new(HashMap::new()),
        }
    }

    fn states(&self) -> MutexGuard<'_, HashMap<String, CircuitState>> {
        // The map holds plain counters, so a panic elsewhere cannot leave it torn.
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count a failed call against `key`, opening the circuit at the threshold.
    pub fn record_failure(&self, key: &str) {
        let mut states = self.states();
        let state = states.entry(key.to_string()).or_default();
        state.consecutive_failures += 1;

        if state.consecutive_failures >= self.failure_threshold {
            state.blocked_until = Some(Instant::now() + self.reset_timeout);
            warn!(
                "Circuit for '{}' opened after {} failures, blocking for {}s",
                key,
                state.consecutive_failures,
                self.reset_timeout.as_secs()
            );
        }
    }

    /// True while `key` is inside its cool-down window.
    ///
    /// The first call at or after the window's end resets the dependency's
    /// state and returns false.
    pub fn should_block(&self, key: &str) -> bool {
        let mut states = self.states();
        let Some(blocked_until) = states.get(key).and_then(|state| state.blocked_until) else {
            return false;
        };

        if Instant::now() < blocked_until {
            true
        } else {
            states.remove(key);
            info!("Circuit for '{}' closed, cool-down expired", key);
            false
        }
    }

    /// Current state of `key` without triggering the lazy reset
    #[must_use]
    pub fn status(&self, key: &str) -> CircuitStatus {
        match self.states().get(key).and_then(|state| state.blocked_until) {
            Some(until) if Instant::now() < until => CircuitStatus::Open,
            _ => CircuitStatus::Closed,
        }
    }

    /// Failures recorded against `key` since its last reset
    #[must_use]
    pub fn failure_count(&self, key: &str) -> u32 {
        self.states()
            .get(key)
            .map_or(0, |state| state.consecutive_failures)
    }
}
