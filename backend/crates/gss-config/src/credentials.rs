use crate::{ConfigError, ConfigErrorResult, CredentialsConfig};

use std::fmt;

/// Secrets read from the environment at startup.
#[derive(Clone)]
pub struct Credentials {
    pub updater_login: String,
    pub api_endpoint: String,
}

impl Credentials {
    /// Read every required credential from the environment.
    ///
    /// A missing or blank variable is an error; the caller treats it as fatal.
    pub fn resolve(config: &CredentialsConfig) -> ConfigErrorResult<Self> {
        Ok(Self {
            updater_login: Self::required_env(&config.updater_login_env)?,
            api_endpoint: Self::required_env(&config.api_endpoint_env)?,
        })
    }

    fn required_env(var_name: &str) -> ConfigErrorResult<String> {
        match std::env::var(var_name) {
            Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            _ => Err(ConfigError::credentials(format!(
                "{var_name} env var not set"
            ))),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("updater_login", &"<redacted>")
            .field("api_endpoint", &"<redacted>")
            .finish()
    }
}
