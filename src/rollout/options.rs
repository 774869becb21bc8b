// ABOUTME: Tunable options for a single rollout.
// ABOUTME: Durations deserialize from humantime strings with sensible defaults.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct RolloutOptions {
    /// Maximum wall-clock time to wait for healthy convergence.
    #[serde(default = "default_health_timeout", with = "humantime_serde")]
    pub health_timeout: Duration,

    /// Spacing between health polls.
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Retries for a transient failure before giving up on a platform call.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First retry delay; doubles on each subsequent retry.
    #[serde(default = "default_backoff_base", with = "humantime_serde")]
    pub backoff_base: Duration,

    /// Reissue the last stable artifact when the target never converges.
    #[serde(default = "default_auto_rollback")]
    pub auto_rollback: bool,

    /// Per-call platform timeout, separate from the health budget.
    #[serde(default = "default_call_timeout", with = "humantime_serde")]
    pub call_timeout: Duration,
}

impl Default for RolloutOptions {
    fn default() -> Self {
        Self {
            health_timeout: default_health_timeout(),
            poll_interval: default_poll_interval(),
            max_retries: default_max_retries(),
            backoff_base: default_backoff_base(),
            auto_rollback: default_auto_rollback(),
            call_timeout: default_call_timeout(),
        }
    }
}

fn default_health_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base() -> Duration {
    Duration::from_secs(1)
}

fn default_auto_rollback() -> bool {
    true
}

fn default_call_timeout() -> Duration {
    Duration::from_secs(10)
}
