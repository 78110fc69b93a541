use crate::{DEFAULT_LOG_COLORED, DEFAULT_LOG_DIRECTORY, LogLevel};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Log directory, relative to the config directory
    pub dir: String,
    /// Log filename inside `dir`. None = stdout
    pub file: Option<String>,
    /// Colored stdout output (ignored when logging to file)
    pub colored: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            dir: String::from(DEFAULT_LOG_DIRECTORY),
            file: None,
            colored: DEFAULT_LOG_COLORED,
        }
    }
}
