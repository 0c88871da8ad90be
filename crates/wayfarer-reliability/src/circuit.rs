//! Circuit breaker state machine (spec.md §4.3 / C3): Closed -> Open ->
//! HalfOpen -> Closed. Follows the phase-based locking pattern used
//! throughout this codebase: scope the guard, copy out what's needed, drop
//! the lock, and only then do anything that might contend or block.

use crate::detection::DetectionStrategy;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};
use wayfarer_types::ports::circuit_breaker::{CircuitBreaker, CircuitStats, CircuitState};

#[derive(Debug, Clone)]
enum State {
    Closed {
        consecutive_failures: u32,
        window_failures: u64,
        window_successes: u64,
        window_start: Instant,
    },
    Open {
        opened_at: Instant,
    },
    HalfOpen {
        test_successes: u32,
        test_failures: u32,
    },
}

impl Default for State {
    fn default() -> Self {
        State::Closed {
            consecutive_failures: 0,
            window_failures: 0,
            window_successes: 0,
            window_start: Instant::now(),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    total_calls: AtomicU64,
    total_failures: AtomicU64,
    total_successes: AtomicU64,
    opened_count: AtomicU64,
}

pub struct CircuitBreakerImpl {
    state: Mutex<State>,
    counters: Counters,
    detector: Box<dyn DetectionStrategy>,
    open_cooldown: Duration,
    rolling_window: Duration,
    half_open_success_threshold: u32,
    half_open_max_attempts: u32,
    name: String,
}

impl CircuitBreakerImpl {
    pub fn new(
        name: impl Into<String>,
        detector: Box<dyn DetectionStrategy>,
        open_cooldown: Duration,
        rolling_window: Duration,
        half_open_success_threshold: u32,
    ) -> Self {
        Self {
            state: Mutex::new(State::default()),
            counters: Counters::default(),
            detector,
            open_cooldown,
            rolling_window,
            half_open_success_threshold,
            half_open_max_attempts: half_open_success_threshold * 2,
            name: name.into(),
        }
    }

    /// Returns the window's counts, resetting them first if the window has
    /// elapsed since it started — the Closed state's failure/success counts
    /// only ever reflect calls seen within the active rolling window.
    fn fresh_window(&self, window_failures: u64, window_successes: u64, window_start: Instant) -> (u64, u64, Instant) {
        if window_start.elapsed() >= self.rolling_window {
            (0, 0, Instant::now())
        } else {
            (window_failures, window_successes, window_start)
        }
    }
}

#[async_trait]
impl CircuitBreaker for CircuitBreakerImpl {
    fn state(&self) -> CircuitState {
        match self.state.try_lock() {
            Ok(guard) => match &*guard {
                State::Closed { .. } => CircuitState::Closed,
                State::Open { .. } => CircuitState::Open,
                State::HalfOpen { .. } => CircuitState::HalfOpen,
            },
            // A concurrent mutation is in flight; `Closed` is the safe
            // default since callers use `allow_call` for the real gate.
            Err(_) => CircuitState::Closed,
        }
    }

    fn stats(&self) -> CircuitStats {
        CircuitStats {
            total_calls: self.counters.total_calls.load(Ordering::Relaxed),
            total_failures: self.counters.total_failures.load(Ordering::Relaxed),
            total_successes: self.counters.total_successes.load(Ordering::Relaxed),
            consecutive_failures: 0,
            opened_count: self.counters.opened_count.load(Ordering::Relaxed),
        }
    }

    async fn allow_call(&self) -> bool {
        self.counters.total_calls.fetch_add(1, Ordering::Relaxed);

        let mut transitioned_to_half_open = false;
        let allowed = {
            let mut state = self.state.lock().await;
            match &*state {
                State::Closed { .. } => true,
                State::Open { opened_at } => {
                    if opened_at.elapsed() >= self.open_cooldown {
                        *state = State::HalfOpen {
                            test_successes: 0,
                            test_failures: 0,
                        };
                        transitioned_to_half_open = true;
                        true
                    } else {
                        false
                    }
                }
                State::HalfOpen { test_successes, test_failures } => {
                    (test_successes + test_failures) < self.half_open_max_attempts
                }
            }
        }; // lock dropped

        if transitioned_to_half_open {
            info!(breaker = %self.name, "circuit breaker entering half-open");
        }
        allowed
    }

    async fn on_success(&self) {
        self.counters.total_successes.fetch_add(1, Ordering::Relaxed);

        let closed = {
            let mut state = self.state.lock().await;
            let mut just_closed = false;
            *state = match &*state {
                State::Closed { window_failures, window_successes, window_start, .. } => {
                    let (failures, successes, start) = self.fresh_window(*window_failures, *window_successes, *window_start);
                    State::Closed {
                        consecutive_failures: 0,
                        window_failures: failures,
                        window_successes: successes + 1,
                        window_start: start,
                    }
                }
                State::Open { opened_at } => State::Open { opened_at: *opened_at },
                State::HalfOpen { test_successes, test_failures } => {
                    let successes = test_successes + 1;
                    if successes >= self.half_open_success_threshold {
                        just_closed = true;
                        State::Closed {
                            consecutive_failures: 0,
                            window_failures: 0,
                            window_successes: 0,
                            window_start: Instant::now(),
                        }
                    } else {
                        State::HalfOpen { test_successes: successes, test_failures: *test_failures }
                    }
                }
            };
            just_closed
        }; // lock dropped

        if closed {
            info!(breaker = %self.name, "circuit breaker closed after successful recovery");
        }
    }

    async fn on_failure(&self) {
        self.counters.total_failures.fetch_add(1, Ordering::Relaxed);

        let opened = {
            let mut state = self.state.lock().await;
            let mut just_opened = false;
            *state = match &*state {
                State::Closed { consecutive_failures, window_failures, window_successes, window_start } => {
                    let (base_failures, base_successes, start) =
                        self.fresh_window(*window_failures, *window_successes, *window_start);
                    let consecutive = consecutive_failures + 1;
                    let failures = base_failures + 1;
                    if self.detector.should_trip(consecutive, failures, base_successes) {
                        just_opened = true;
                        self.counters.opened_count.fetch_add(1, Ordering::Relaxed);
                        State::Open { opened_at: Instant::now() }
                    } else {
                        State::Closed {
                            consecutive_failures: consecutive,
                            window_failures: failures,
                            window_successes: base_successes,
                            window_start: start,
                        }
                    }
                }
                State::Open { opened_at } => State::Open { opened_at: *opened_at },
                State::HalfOpen { test_successes, test_failures } => {
                    just_opened = true;
                    self.counters.opened_count.fetch_add(1, Ordering::Relaxed);
                    let _ = (test_successes, test_failures);
                    State::Open { opened_at: Instant::now() }
                }
            };
            just_opened
        }; // lock dropped

        if opened {
            warn!(breaker = %self.name, detector = %self.detector.name(), "circuit breaker opened");
        }
    }

    async fn reset(&self) {
        let mut state = self.state.lock().await;
        *state = State::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::ConsecutiveFailures;

    fn breaker() -> CircuitBreakerImpl {
        CircuitBreakerImpl::new(
            "test",
            Box::new(ConsecutiveFailures { threshold: 3 }),
            Duration::from_millis(50),
            Duration::from_secs(60),
            2,
        )
    }

    #[tokio::test]
    async fn opens_after_consecutive_failures_then_blocks_calls() {
        let b = breaker();
        for _ in 0..3 {
            assert!(b.allow_call().await);
            b.on_failure().await;
        }
        assert_eq!(b.stats().opened_count, 1);
        assert!(!b.allow_call().await);
    }

    #[tokio::test]
    async fn half_open_closes_after_success_threshold() {
        let b = breaker();
        for _ in 0..3 {
            b.allow_call().await;
            b.on_failure().await;
        }
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(b.allow_call().await); // transitions to half-open
        b.on_success().await;
        assert!(b.allow_call().await);
        b.on_success().await;

        // closed again: failures should need 3 consecutive to re-open
        assert!(b.allow_call().await);
        b.on_failure().await;
        assert!(b.allow_call().await);
    }

    #[tokio::test]
    async fn threshold_window_waits_for_minimum_throughput_before_opening() {
        use crate::detection::ThresholdWindow;
        let b = CircuitBreakerImpl::new(
            "test",
            Box::new(ThresholdWindow { failure_threshold: 2, minimum_throughput: 3 }),
            Duration::from_millis(50),
            Duration::from_secs(60),
            2,
        );
        b.on_failure().await;
        b.on_failure().await;
        assert_eq!(b.stats().opened_count, 0); // only 2 calls seen, below minimum_throughput

        b.on_success().await;
        assert_eq!(b.stats().opened_count, 1); // 3rd call in window trips the 2-failure threshold
    }

    #[tokio::test]
    async fn window_reset_forgets_failures_outside_it() {
        use crate::detection::ThresholdWindow;
        let b = CircuitBreakerImpl::new(
            "test",
            Box::new(ThresholdWindow { failure_threshold: 2, minimum_throughput: 1 }),
            Duration::from_millis(50),
            Duration::from_millis(20),
            2,
        );
        b.on_failure().await;
        tokio::time::sleep(Duration::from_millis(25)).await; // window elapses
        b.on_failure().await;
        assert_eq!(b.stats().opened_count, 0); // the stale failure doesn't carry over
    }
}
