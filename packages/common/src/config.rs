use serde::Deserialize;

/// Background job runner configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct JobsAppConfig {
    /// Whether the in-process job runner is started. Default: true.
    #[serde(default = "default_jobs_enabled")]
    pub enabled: bool,
    /// Upper bound on concurrently executing jobs. Default: 100.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// How often the runner looks for available jobs. Default: 500ms.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Attempts before a job is discarded. Default: 25.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
    /// A job still `running` after this long is considered abandoned. Default: 1h.
    #[serde(default = "default_rescue_after_secs")]
    pub rescue_after_secs: u64,
    /// Base delay for exponential retry backoff. Default: 1s.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Cap on retry backoff. Default: 1h.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Time in-flight jobs get to finish on shutdown. Default: 10s.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

fn default_jobs_enabled() -> bool {
    true
}
fn default_max_workers() -> usize {
    100
}
fn default_poll_interval_ms() -> u64 {
    500
}
fn default_max_attempts() -> i32 {
    25
}
fn default_rescue_after_secs() -> u64 {
    3600
}
fn default_base_delay_ms() -> u64 {
    1000
}
fn default_max_delay_ms() -> u64 {
    3_600_000
}
fn default_shutdown_grace_secs() -> u64 {
    10
}

impl Default for JobsAppConfig {
    fn default() -> Self {
        Self {
            enabled: default_jobs_enabled(),
            max_workers: default_max_workers(),
            poll_interval_ms: default_poll_interval_ms(),
            max_attempts: default_max_attempts(),
            rescue_after_secs: default_rescue_after_secs(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}
