// ── Runtime acquisition configuration ──
//
// Timing knobs for the acquisition loop. Built by the CLI (or any other
// front end) and handed in; core never reads config files.

use std::time::Duration;

/// Default delay between two polls of the device observer.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Polls spent searching quietly before the troubleshooting report appears.
pub const DEFAULT_SEARCH_BUDGET: u32 = 200;

/// Polls between two refreshes of the troubleshooting report.
pub const DEFAULT_REFRESH_BUDGET: u32 = 20;

/// Configuration for a single acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionConfig {
    /// Cadence of the poll loop.
    pub poll_interval: Duration,
    /// Polls allowed in `Searching` before escalating to troubleshooting.
    pub search_budget: u32,
    /// Polls between troubleshooting refreshes.
    pub refresh_budget: u32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            search_budget: DEFAULT_SEARCH_BUDGET,
            refresh_budget: DEFAULT_REFRESH_BUDGET,
        }
    }
}

impl AcquisitionConfig {
    /// How long the operator waits before the troubleshooting report shows up.
    pub fn escalation_delay(&self) -> Duration {
        self.poll_interval.saturating_mul(self.search_budget)
    }

    /// How long a troubleshooting report stays on screen before it is refreshed.
    pub fn refresh_period(&self) -> Duration {
        self.poll_interval.saturating_mul(self.refresh_budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_escalate_after_twenty_seconds() {
        let config = AcquisitionConfig::default();
        assert_eq!(config.escalation_delay(), Duration::from_secs(20));
        assert_eq!(config.refresh_period(), Duration::from_secs(2));
    }
}
