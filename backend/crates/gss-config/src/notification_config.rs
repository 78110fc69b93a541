use crate::{ConfigError, ConfigErrorResult, DEFAULT_SOURCE_TAG};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub source_tag: String,
    /// Overrides the OS hostname in every notification
    pub host_identity: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            source_tag: String::from(DEFAULT_SOURCE_TAG),
            host_identity: None,
        }
    }
}

impl NotificationConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.source_tag.trim().is_empty() || self.source_tag.contains(char::is_whitespace) {
            return Err(ConfigError::config(format!(
                "notification.source_tag must be a single non-empty word, got {:?}",
                self.source_tag
            )));
        }

        Ok(())
    }
}
