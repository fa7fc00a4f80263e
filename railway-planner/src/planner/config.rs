//! Planner configuration.

use chrono::Duration;

/// Configuration parameters for itinerary search and graph builds.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Minimum time required to change trains (minutes).
    /// Tighter connections roll over to the next day's departure.
    pub min_stop_minutes: u32,

    /// Maximum one-transfer results kept per speed-mix bucket.
    /// `None` returns every pairing.
    pub bucket_cap: Option<usize>,

    /// Number of alternatives a multi-transfer search returns by default.
    pub default_result_count: usize,

    /// Alternatives whose total time exceeds this are not returned (minutes).
    pub cost_ceiling_minutes: u32,

    /// Node expansions allowed per path-engine run.
    pub max_expansions: usize,

    /// Hub stations fetched concurrently during a graph build.
    pub fetch_batch_size: usize,
}

impl PlannerConfig {
    /// Returns the minimum stop time as a Duration.
    pub fn min_stop(&self) -> Duration {
        Duration::minutes(self.min_stop_minutes as i64)
    }

    /// Returns the cost ceiling as a Duration.
    pub fn cost_ceiling(&self) -> Duration {
        Duration::minutes(self.cost_ceiling_minutes as i64)
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            min_stop_minutes: 15,
            bucket_cap: Some(10),
            default_result_count: 5,
            cost_ceiling_minutes: 43_200, // 30 days
            max_expansions: 2_000_000,
            fetch_batch_size: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlannerConfig::default();

        assert_eq!(config.min_stop_minutes, 15);
        assert_eq!(config.bucket_cap, Some(10));
        assert_eq!(config.default_result_count, 5);
        assert_eq!(config.cost_ceiling_minutes, 43_200);
        assert_eq!(config.max_expansions, 2_000_000);
        assert_eq!(config.fetch_batch_size, 8);
    }

    #[test]
    fn duration_methods() {
        let config = PlannerConfig::default();

        assert_eq!(config.min_stop(), Duration::minutes(15));
        assert_eq!(config.cost_ceiling(), Duration::days(30));
    }
}
