//! # Circuit Breaker Module
//!
//! This module implements the circuit breaker pattern for learning-store
//! writes. When the store fails repeatedly, writes are skipped for a while so
//! message handling is not slowed down by a database that is known to be down.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::StoreRecoveryConfig;

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    last_failure_time: Option<Instant>,
}

/// Circuit breaker for learning-store writes
///
/// # State Machine
///
/// - **Closed**: Normal operation, writes pass through
/// - **Open**: Failure threshold reached, writes are skipped
/// - **Half-Open**: Reset timeout elapsed, the next write is attempted
///
/// # Configuration
///
/// Uses `StoreRecoveryConfig` for:
/// - `circuit_breaker_threshold`: Failures before opening (default: 5)
/// - `circuit_breaker_reset_secs`: Time before attempting reset (default: 60s)
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    config: StoreRecoveryConfig,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given configuration
    ///
    /// # Examples
    ///
    /// ```rust
    /// use isp_support_bot::circuit_breaker::CircuitBreaker;
    /// use isp_support_bot::config::StoreRecoveryConfig;
    ///
    /// let breaker = CircuitBreaker::new(StoreRecoveryConfig::default());
    /// assert!(!breaker.is_open());
    /// ```
    pub fn new(config: StoreRecoveryConfig) -> Self {
        Self {
            state: Mutex::new(BreakerState::default()),
            config,
        }
    }

    fn state(&self) -> MutexGuard<'_, BreakerState> {
        // The state is two plain counters, still usable after a panic elsewhere
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Check if the circuit is open (writes should be skipped)
    ///
    /// Resets to closed once the reset timeout has elapsed since the last failure.
    pub fn is_open(&self) -> bool {
        let mut state = self.state();

        if state.failure_count >= self.config.circuit_breaker_threshold {
            if let Some(last_time) = state.last_failure_time {
                if last_time.elapsed() < Duration::from_secs(self.config.circuit_breaker_reset_secs)
                {
                    return true;
                }
                *state = BreakerState::default();
            }
        }
        false
    }

    /// Record a failed write
    pub fn record_failure(&self) {
        let mut state = self.state();
        state.failure_count += 1;
        state.last_failure_time = Some(Instant::now());
    }

    /// Record a successful write, closing the circuit
    pub fn record_success(&self) {
        *self.state() = BreakerState::default();
    }

    pub fn failure_count(&self) -> u32 {
        self.state().failure_count
    }
}
