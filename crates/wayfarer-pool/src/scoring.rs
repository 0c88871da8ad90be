//! Default recycling scorer: higher score means "recycle me first".

use std::time::Duration;
use wayfarer_types::ports::RecyclingScorer;

pub struct DefaultRecyclingScorer;

impl RecyclingScorer for DefaultRecyclingScorer {
    fn score(&self, page_count: u32, use_count: u64, idle: Duration, age: Duration, health_score: f64) -> f64 {
        let unhealthy_weight = (1.0 - health_score) * 10.0;
        let idle_weight = idle.as_secs_f64() / 60.0;
        let age_weight = age.as_secs_f64() / 3600.0;
        let churn_weight = (page_count as f64) / 20.0 + (use_count as f64) / 1000.0;
        unhealthy_weight + idle_weight + age_weight + churn_weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unhealthy_browsers_score_highest() {
        let scorer = DefaultRecyclingScorer;
        let healthy = scorer.score(5, 10, Duration::from_secs(30), Duration::from_secs(60), 1.0);
        let crashed = scorer.score(5, 10, Duration::from_secs(30), Duration::from_secs(60), 0.0);
        assert!(crashed > healthy);
    }
}
