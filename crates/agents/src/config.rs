use std::env;
use std::time::Duration;

const DEFAULT_STAGE_TIMEOUT_SECONDS: u64 = 60;
const DEFAULT_BRANCH_TIMEOUT_SECONDS: u64 = 45;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub stage_timeout: Duration,
    pub branch_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout: Duration::from_secs(DEFAULT_STAGE_TIMEOUT_SECONDS),
            branch_timeout: Duration::from_secs(DEFAULT_BRANCH_TIMEOUT_SECONDS),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self {
            stage_timeout: seconds_from_env(
                "WAYFARER_STAGE_TIMEOUT_SECONDS",
                DEFAULT_STAGE_TIMEOUT_SECONDS,
            ),
            branch_timeout: seconds_from_env(
                "WAYFARER_BRANCH_TIMEOUT_SECONDS",
                DEFAULT_BRANCH_TIMEOUT_SECONDS,
            ),
        }
    }
}

fn seconds_from_env(name: &str, default: u64) -> Duration {
    let seconds = env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(|value| value.clamp(1, 600))
        .unwrap_or(default);
    Duration::from_secs(seconds)
}
