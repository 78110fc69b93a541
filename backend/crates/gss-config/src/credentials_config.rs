use crate::{DEFAULT_API_ENDPOINT_ENV, DEFAULT_UPDATER_LOGIN_ENV};

use serde::Deserialize;

/// Names of the environment variables that hold secrets.
///
/// The config file never contains the secrets themselves.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub updater_login_env: String,
    pub api_endpoint_env: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            updater_login_env: String::from(DEFAULT_UPDATER_LOGIN_ENV),
            api_endpoint_env: String::from(DEFAULT_API_ENDPOINT_ENV),
        }
    }
}
