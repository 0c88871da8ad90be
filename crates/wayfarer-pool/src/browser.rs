//! A single pooled browser instance: the engine handle plus the lifecycle
//! bookkeeping (age, idle time, use count, health) the pool needs to decide
//! when to recycle it.

use std::time::{Duration, Instant};
use wayfarer_types::model::BrowserState;
use wayfarer_types::ports::BrowserEngine;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserHealth {
    Healthy,
    Unhealthy,
    Crashed,
}

pub struct PooledBrowser {
    pub id: String,
    pub engine: Arc<dyn BrowserEngine>,
    pub created_at: Instant,
    pub last_used: Instant,
    pub use_count: u64,
    pub page_count: u32,
    pub health: BrowserHealth,
    pub in_use: bool,
}

impl PooledBrowser {
    pub fn new(id: String, engine: Arc<dyn BrowserEngine>) -> Self {
        let now = Instant::now();
        Self {
            id,
            engine,
            created_at: now,
            last_used: now,
            use_count: 0,
            page_count: 0,
            health: BrowserHealth::Healthy,
            in_use: false,
        }
    }

    pub fn is_expired(&self, max_lifetime: Duration) -> bool {
        self.created_at.elapsed() > max_lifetime
    }

    pub fn is_idle(&self, idle_timeout: Duration) -> bool {
        !self.in_use && self.last_used.elapsed() > idle_timeout
    }

    pub fn mark_checked_out(&mut self) {
        self.in_use = true;
        self.use_count += 1;
        self.last_used = Instant::now();
    }

    pub fn mark_checked_in(&mut self) {
        self.in_use = false;
        self.last_used = Instant::now();
    }

    /// Quick liveness ping; used by the fast tier of health checks.
    pub async fn fast_health_check(&self) -> bool {
        self.engine.is_alive().await
    }

    /// Comprehensive check used by the slow tier: liveness plus page-count
    /// pressure relative to the per-browser cap (a stand-in for a real RSS
    /// sample, which would require an OS-level process sampler this crate
    /// doesn't have access to).
    pub async fn full_health_check(&mut self, max_pages: u32) -> BrowserHealth {
        if !self.engine.is_alive().await {
            self.health = BrowserHealth::Crashed;
            return self.health;
        }
        self.page_count = self.engine.page_count().await as u32;
        self.health = if self.page_count > max_pages {
            BrowserHealth::Unhealthy
        } else {
            BrowserHealth::Healthy
        };
        self.health
    }

    pub fn health_score(&self) -> f64 {
        match self.health {
            BrowserHealth::Healthy => 1.0,
            BrowserHealth::Unhealthy => 0.3,
            BrowserHealth::Crashed => 0.0,
        }
    }

    pub fn state(&self) -> BrowserState {
        match (self.in_use, self.health) {
            (_, BrowserHealth::Crashed) => BrowserState::Closed,
            (_, BrowserHealth::Unhealthy) => BrowserState::Unhealthy,
            (true, _) => BrowserState::InUse,
            (false, _) => BrowserState::Idle,
        }
    }

    pub async fn cleanup(&mut self) {
        let _ = self.engine.close().await;
    }
}
