use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_REINSTALL_BACKOFF_SECS,
    MAX_POLL_INTERVAL_SECS, MAX_REINSTALL_BACKOFF_SECS, MIN_POLL_INTERVAL_SECS,
    MIN_REINSTALL_BACKOFF_SECS,
};

use std::time::Duration;

use serde::Deserialize;

/// Timing of the polling loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Delay between ticks in steady state
    pub poll_interval_secs: u64,
    /// Delay between ticks while the server is marked for reinstall
    pub reinstall_backoff_secs: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            reinstall_backoff_secs: DEFAULT_REINSTALL_BACKOFF_SECS,
        }
    }
}

impl SupervisorConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.poll_interval_secs < MIN_POLL_INTERVAL_SECS
            || self.poll_interval_secs > MAX_POLL_INTERVAL_SECS
        {
            return Err(ConfigError::config(format!(
                "supervisor.poll_interval_secs must be {}-{}, got {}",
                MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS, self.poll_interval_secs
            )));
        }

        if self.reinstall_backoff_secs < MIN_REINSTALL_BACKOFF_SECS
            || self.reinstall_backoff_secs > MAX_REINSTALL_BACKOFF_SECS
        {
            return Err(ConfigError::config(format!(
                "supervisor.reinstall_backoff_secs must be {}-{}, got {}",
                MIN_REINSTALL_BACKOFF_SECS, MAX_REINSTALL_BACKOFF_SECS, self.reinstall_backoff_secs
            )));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn reinstall_backoff(&self) -> Duration {
        Duration::from_secs(self.reinstall_backoff_secs)
    }
}
