//! Engine tuning knobs.

use std::time::Duration;

/// Configuration for the crawl/extract engine.
///
/// Site location, credentials and file paths belong to the application; this
/// only carries what the engine itself consumes.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Upper bound on concurrent lanes (one rendering session each).
    ///
    /// The actual lane count is `min(backlog length, max_lanes)`. Default: 4.
    pub max_lanes: usize,

    /// Pause between navigation attempts. Default: 500 ms.
    pub navigation_retry_interval: Duration,

    /// Pause before looking for chevrons in a row. Default: 100 ms.
    pub chevron_settle_delay: Duration,

    /// Pause after a chevron was activated. Default: 250 ms.
    pub chevron_expansion_delay: Duration,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_lanes: 4,
            navigation_retry_interval: Duration::from_millis(500),
            chevron_settle_delay: Duration::from_millis(100),
            chevron_expansion_delay: Duration::from_millis(250),
        }
    }
}

impl HarvestConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lane upper bound (at least one).
    pub fn with_max_lanes(mut self, max_lanes: usize) -> Self {
        self.max_lanes = max_lanes.max(1);
        self
    }

    /// Set the post-expansion delay.
    pub fn with_expansion_delay(mut self, delay: Duration) -> Self {
        self.chevron_expansion_delay = delay;
        self
    }

    /// Number of lanes to open for a backlog of `backlog_len` entries.
    pub fn lane_count(&self, backlog_len: usize) -> usize {
        backlog_len.min(self.max_lanes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarvestConfig::default();
        assert_eq!(config.max_lanes, 4);
        assert_eq!(config.navigation_retry_interval, Duration::from_millis(500));
        assert_eq!(config.chevron_expansion_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_lane_count_is_bounded_by_backlog() {
        let config = HarvestConfig::new().with_max_lanes(4);
        assert_eq!(config.lane_count(2), 2);
        assert_eq!(config.lane_count(10), 4);
        assert_eq!(config.lane_count(0), 0);
    }

    #[test]
    fn test_max_lanes_never_zero() {
        assert_eq!(HarvestConfig::new().with_max_lanes(0).max_lanes, 1);
    }
}
