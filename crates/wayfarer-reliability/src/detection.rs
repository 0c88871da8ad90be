//! Pluggable trip-detection strategies the circuit breaker consults before
//! deciding whether accumulated failures should open the circuit.

/// Given the breaker's running counters, decides whether `Closed` should
/// transition to `Open`. Implementations must be pure and side-effect free.
pub trait DetectionStrategy: Send + Sync {
    fn should_trip(&self, consecutive_failures: u32, window_failures: u64, window_successes: u64) -> bool;
    fn name(&self) -> &'static str;
}

/// Trips after N consecutive failures, regardless of overall volume. Good
/// default for low-traffic targets where a ratio would never reach its
/// minimum sample size.
#[derive(Debug, Clone, Copy)]
pub struct ConsecutiveFailures {
    pub threshold: u32,
}

impl DetectionStrategy for ConsecutiveFailures {
    fn should_trip(&self, consecutive_failures: u32, _window_failures: u64, _window_successes: u64) -> bool {
        consecutive_failures >= self.threshold
    }
    fn name(&self) -> &'static str {
        "consecutive"
    }
}

/// Trips once the failure rate over the rolling window crosses a percentage
/// threshold, but only after `min_samples` calls have accumulated.
#[derive(Debug, Clone, Copy)]
pub struct FailureRatio {
    pub min_samples: u64,
    pub threshold_pct: f64,
}

impl DetectionStrategy for FailureRatio {
    fn should_trip(&self, _consecutive_failures: u32, window_failures: u64, window_successes: u64) -> bool {
        let total = window_failures + window_successes;
        if total < self.min_samples {
            return false;
        }
        (window_failures as f64 / total as f64) * 100.0 >= self.threshold_pct
    }
    fn name(&self) -> &'static str {
        "failure_ratio"
    }
}

/// Ratio-based trip with a threshold that tightens as volume grows, so a
/// handful of early failures on a cold target don't trip as eagerly as the
/// same ratio would once it has a track record.
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveRatio {
    pub min_samples: u64,
    pub base_threshold_pct: f64,
    pub min_threshold_pct: f64,
}

impl DetectionStrategy for AdaptiveRatio {
    fn should_trip(&self, _consecutive_failures: u32, window_failures: u64, window_successes: u64) -> bool {
        let total = window_failures + window_successes;
        if total < self.min_samples {
            return false;
        }
        let tightened = self.base_threshold_pct - (total as f64).log2();
        let effective_threshold = tightened.max(self.min_threshold_pct);
        (window_failures as f64 / total as f64) * 100.0 >= effective_threshold
    }
    fn name(&self) -> &'static str {
        "adaptive_ratio"
    }
}

/// Trips once the raw failure count in the active window reaches
/// `failure_threshold`, but only once the window has seen at least
/// `minimum_throughput` calls — guards against a single unlucky request
/// opening the circuit on a target that's barely been exercised.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdWindow {
    pub failure_threshold: u32,
    pub minimum_throughput: u32,
}

impl DetectionStrategy for ThresholdWindow {
    fn should_trip(&self, _consecutive_failures: u32, window_failures: u64, window_successes: u64) -> bool {
        let total = window_failures + window_successes;
        window_failures >= self.failure_threshold as u64 && total >= self.minimum_throughput as u64
    }
    fn name(&self) -> &'static str {
        "threshold_window"
    }
}
