//! Proxy pool management: selection strategies, assignment, rotation and
//! health/throughput tracking per proxy.

pub mod manager;
pub mod strategy;

pub use manager::ProxyPoolManager;
pub use strategy::{BestHealth, LeastUsed, Random, RoundRobin};
