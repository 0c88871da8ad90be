//! Circuit breaker state machine, trip-detection strategies, a per-key
//! breaker registry and jittered retry backoff.

pub mod backoff;
pub mod circuit;
pub mod detection;
pub mod registry;

pub use backoff::{DecorrelatedJitterBackoff, FibonacciBackoff, FullJitterBackoff};
pub use circuit::CircuitBreakerImpl;
pub use detection::{AdaptiveRatio, ConsecutiveFailures, DetectionStrategy, FailureRatio, ThresholdWindow};
pub use registry::{DetectorFactory, LruCircuitBreakerRegistry};
