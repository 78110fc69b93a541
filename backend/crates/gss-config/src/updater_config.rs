use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_RELEASE_CHANNEL, DEFAULT_UPDATER_TIMEOUT_SECS,
    DEFAULT_UPDATER_TOOL_PATH,
};

use std::time::Duration;

use serde::Deserialize;

/// External updater tool invocation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    pub tool_path: String,
    pub product_id: String,
    pub release_channel: String,
    /// Kill the updater after N seconds (0 = wait forever)
    pub timeout_secs: u64,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            tool_path: String::from(DEFAULT_UPDATER_TOOL_PATH),
            product_id: String::new(),
            release_channel: String::from(DEFAULT_RELEASE_CHANNEL),
            timeout_secs: DEFAULT_UPDATER_TIMEOUT_SECS,
        }
    }
}

impl UpdaterConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.tool_path.trim().is_empty() {
            return Err(ConfigError::config("updater.tool_path must not be empty"));
        }

        if self.product_id.trim().is_empty() {
            return Err(ConfigError::config("updater.product_id is required"));
        }

        if self.release_channel.trim().is_empty() {
            return Err(ConfigError::config(
                "updater.release_channel must not be empty",
            ));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}
