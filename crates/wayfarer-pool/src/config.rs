//! Pool configuration. Kept local to this crate (rather than pulled from
//! `wayfarer-config`) the way the teacher keeps its pool config scoped to
//! the pool itself.

use std::time::Duration;

#[derive(Clone, Debug)]
pub struct BrowserPoolConfig {
    pub min_pool_size: usize,
    pub max_pool_size: usize,
    pub initial_pool_size: usize,
    pub max_pages_per_browser: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    pub fast_check_interval: Duration,
    pub full_check_interval: Duration,
    pub soft_memory_limit_mb: u64,
    pub hard_memory_limit_mb: u64,
    pub cleanup_timeout: Duration,
}

impl Default for BrowserPoolConfig {
    fn default() -> Self {
        Self {
            min_pool_size: 1,
            max_pool_size: 10,
            initial_pool_size: 2,
            max_pages_per_browser: 20,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(300),
            max_lifetime: Duration::from_secs(3600),
            fast_check_interval: Duration::from_secs(2),
            full_check_interval: Duration::from_secs(15),
            soft_memory_limit_mb: 512,
            hard_memory_limit_mb: 1024,
            cleanup_timeout: Duration::from_secs(5),
        }
    }
}
