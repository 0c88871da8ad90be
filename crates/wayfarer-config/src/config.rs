//! Typed configuration surface for the control plane, assembled from the
//! environment with sane defaults so a bare `WayfarerConfig::from_env()`
//! works in development.

use crate::env::{EnvConfigLoader, EnvError};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub min_size: u32,
    pub max_size: u32,
    pub max_pages_per_browser: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    pub soft_memory_limit_mb: u64,
    pub hard_memory_limit_mb: u64,
    pub health_check_interval: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_size: 1,
            max_size: 10,
            max_pages_per_browser: 20,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(300),
            max_lifetime: Duration::from_secs(3600),
            soft_memory_limit_mb: 512,
            hard_memory_limit_mb: 1024,
            health_check_interval: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub minimum_throughput: u32,
    pub success_threshold: u32,
    pub open_cooldown: Duration,
    pub rolling_window: Duration,
    pub registry_capacity: usize,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            minimum_throughput: 3,
            success_threshold: 2,
            open_cooldown: Duration::from_secs(30),
            rolling_window: Duration::from_secs(60),
            registry_capacity: 512,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub rotation_interval: Duration,
    pub failover_threshold: u32,
    pub health_check_interval: Duration,
    pub strategy: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            rotation_interval: Duration::from_secs(600),
            failover_threshold: 3,
            health_check_interval: Duration::from_secs(60),
            strategy: "best_health".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub default_ttl: Duration,
    pub max_contexts_per_session: u32,
    pub max_pages_per_context: u32,
    pub eviction_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(1800),
            max_contexts_per_session: 10,
            max_pages_per_context: 20,
            eviction_interval: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub max_script_length: usize,
    pub max_selector_length: usize,
    pub allow_file_uploads: bool,
    pub allowed_download_dirs: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_script_length: 65536,
            max_selector_length: 1024,
            allow_file_uploads: true,
            allowed_download_dirs: vec!["/tmp/wayfarer-downloads".to_string()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            backoff_factor: 2.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WayfarerConfig {
    pub pool: PoolConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub proxy: ProxyConfig,
    pub session: SessionConfig,
    pub validator: ValidatorConfig,
    pub retry: RetryConfig,
}

impl WayfarerConfig {
    /// Loads configuration from `WAYFARER_*` environment variables, falling
    /// back to [`Default`] values for anything unset.
    pub fn from_env() -> Result<Self, EnvError> {
        let loader = EnvConfigLoader::new().with_prefix("WAYFARER_");
        let defaults = Self::default();

        let pool = PoolConfig {
            min_size: env_u32(&loader, "pool_min_size", defaults.pool.min_size)?,
            max_size: env_u32(&loader, "pool_max_size", defaults.pool.max_size)?,
            max_pages_per_browser: env_u32(
                &loader,
                "pool_max_pages_per_browser",
                defaults.pool.max_pages_per_browser,
            )?,
            acquire_timeout: env_duration(&loader, "pool_acquire_timeout", defaults.pool.acquire_timeout)?,
            idle_timeout: env_duration(&loader, "pool_idle_timeout", defaults.pool.idle_timeout)?,
            max_lifetime: env_duration(&loader, "pool_max_lifetime", defaults.pool.max_lifetime)?,
            soft_memory_limit_mb: env_u32(
                &loader,
                "pool_soft_memory_limit_mb",
                defaults.pool.soft_memory_limit_mb as u32,
            )? as u64,
            hard_memory_limit_mb: env_u32(
                &loader,
                "pool_hard_memory_limit_mb",
                defaults.pool.hard_memory_limit_mb as u32,
            )? as u64,
            health_check_interval: env_duration(
                &loader,
                "pool_health_check_interval",
                defaults.pool.health_check_interval,
            )?,
        };

        let circuit_breaker = CircuitBreakerConfig {
            failure_threshold: env_u32(
                &loader,
                "breaker_failure_threshold",
                defaults.circuit_breaker.failure_threshold,
            )?,
            minimum_throughput: env_u32(
                &loader,
                "breaker_minimum_throughput",
                defaults.circuit_breaker.minimum_throughput,
            )?,
            success_threshold: env_u32(
                &loader,
                "breaker_success_threshold",
                defaults.circuit_breaker.success_threshold,
            )?,
            open_cooldown: env_duration(&loader, "breaker_open_cooldown", defaults.circuit_breaker.open_cooldown)?,
            rolling_window: env_duration(&loader, "breaker_rolling_window", defaults.circuit_breaker.rolling_window)?,
            registry_capacity: env_u32(
                &loader,
                "breaker_registry_capacity",
                defaults.circuit_breaker.registry_capacity as u32,
            )? as usize,
        };

        let proxy = ProxyConfig {
            rotation_interval: env_duration(&loader, "proxy_rotation_interval", defaults.proxy.rotation_interval)?,
            failover_threshold: env_u32(&loader, "proxy_failover_threshold", defaults.proxy.failover_threshold)?,
            health_check_interval: env_duration(
                &loader,
                "proxy_health_check_interval",
                defaults.proxy.health_check_interval,
            )?,
            strategy: loader
                .get_optional("proxy_strategy")
                .unwrap_or(defaults.proxy.strategy),
        };

        let session = SessionConfig {
            default_ttl: env_duration(&loader, "session_default_ttl", defaults.session.default_ttl)?,
            max_contexts_per_session: env_u32(
                &loader,
                "session_max_contexts",
                defaults.session.max_contexts_per_session,
            )?,
            max_pages_per_context: env_u32(
                &loader,
                "session_max_pages_per_context",
                defaults.session.max_pages_per_context,
            )?,
            eviction_interval: env_duration(&loader, "session_eviction_interval", defaults.session.eviction_interval)?,
        };

        let validator = ValidatorConfig {
            max_script_length: env_u32(
                &loader,
                "validator_max_script_length",
                defaults.validator.max_script_length as u32,
            )? as usize,
            max_selector_length: env_u32(
                &loader,
                "validator_max_selector_length",
                defaults.validator.max_selector_length as u32,
            )? as usize,
            allow_file_uploads: loader
                .get_optional("validator_allow_file_uploads")
                .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes" | "on"))
                .unwrap_or(defaults.validator.allow_file_uploads),
            allowed_download_dirs: loader
                .get_list("validator_allowed_download_dirs")
                .unwrap_or(defaults.validator.allowed_download_dirs),
        };

        let retry = RetryConfig {
            max_attempts: env_u32(&loader, "retry_max_attempts", defaults.retry.max_attempts)?,
            base_delay: env_duration(&loader, "retry_base_delay", defaults.retry.base_delay)?,
            max_delay: env_duration(&loader, "retry_max_delay", defaults.retry.max_delay)?,
            backoff_factor: loader
                .get_f64("retry_backoff_factor")
                .unwrap_or(defaults.retry.backoff_factor),
        };

        Ok(Self {
            pool,
            circuit_breaker,
            proxy,
            session,
            validator,
            retry,
        })
    }
}

fn env_u32(loader: &EnvConfigLoader, var: &str, default: u32) -> Result<u32, EnvError> {
    Ok(loader.get_u32(var).unwrap_or(default))
}

fn env_duration(loader: &EnvConfigLoader, var: &str, default: Duration) -> Result<Duration, EnvError> {
    Ok(loader.get_duration(var).unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_internally_consistent() {
        let cfg = WayfarerConfig::default();
        assert!(cfg.pool.max_size >= cfg.pool.min_size);
        assert!(cfg.pool.hard_memory_limit_mb >= cfg.pool.soft_memory_limit_mb);
    }

    #[test]
    fn from_env_falls_back_to_defaults_when_unset() {
        let cfg = WayfarerConfig::from_env().unwrap();
        assert_eq!(cfg.pool.max_size, PoolConfig::default().max_size);
    }
}
