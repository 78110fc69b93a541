use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_DISPLAY_FLAGS, DEFAULT_GAME_PORT,
    DEFAULT_LAUNCH_ARGS_FILE, DEFAULT_LOCAL_IP, MIN_GAME_PORT,
};

use std::net::IpAddr;

use serde::Deserialize;

/// Fixed launch flags for the managed server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Key/value file with extra `-Key=Value` arguments (relative to the config dir)
    pub args_file: String,
    /// Headless/display mode flags, passed through verbatim
    pub display_flags: Vec<String>,
    pub local_ip: String,
    pub port: u16,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            args_file: String::from(DEFAULT_LAUNCH_ARGS_FILE),
            display_flags: DEFAULT_DISPLAY_FLAGS
                .iter()
                .map(|flag| String::from(*flag))
                .collect(),
            local_ip: String::from(DEFAULT_LOCAL_IP),
            port: DEFAULT_GAME_PORT,
        }
    }
}

impl LaunchConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.port < MIN_GAME_PORT {
            return Err(ConfigError::config(format!(
                "launch.port must be >= {}, got {}",
                MIN_GAME_PORT, self.port
            )));
        }

        if self.local_ip.parse::<IpAddr>().is_err() {
            return Err(ConfigError::config(format!(
                "launch.local_ip must be an IP address, got {}",
                self.local_ip
            )));
        }

        if self.args_file.trim().is_empty() {
            return Err(ConfigError::config("launch.args_file must not be empty"));
        }

        Ok(())
    }
}
