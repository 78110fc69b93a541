use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_BINARY_EXTENSIONS, DEFAULT_EXECUTABLE_NAME,
    DEFAULT_INSTALL_DIR, DEFAULT_STAGING_DIR,
};

use serde::Deserialize;

/// Where the managed server lives and how it is recognised.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Primary install directory (relative paths resolve against the config dir)
    pub install_dir: String,
    /// Scratch directory used to probe for updates
    pub staging_dir: String,
    /// Executable file name, also used to find running instances
    pub executable_name: String,
    /// File extensions counted as binary artifacts when fingerprinting
    pub binary_extensions: Vec<String>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            install_dir: String::from(DEFAULT_INSTALL_DIR),
            staging_dir: String::from(DEFAULT_STAGING_DIR),
            executable_name: String::from(DEFAULT_EXECUTABLE_NAME),
            binary_extensions: DEFAULT_BINARY_EXTENSIONS
                .iter()
                .map(|ext| String::from(*ext))
                .collect(),
        }
    }
}

impl InstallConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.install_dir.trim().is_empty() {
            return Err(ConfigError::config("install.install_dir must not be empty"));
        }

        if self.staging_dir.trim().is_empty() {
            return Err(ConfigError::config("install.staging_dir must not be empty"));
        }

        if self.executable_name.trim().is_empty() {
            return Err(ConfigError::config(
                "install.executable_name must not be empty",
            ));
        }

        if self.executable_name.contains(['/', '\\']) {
            return Err(ConfigError::config(format!(
                "install.executable_name must be a file name, got {}",
                self.executable_name
            )));
        }

        if self.binary_extensions.is_empty()
            || self.binary_extensions.iter().any(|ext| ext.trim().is_empty())
        {
            return Err(ConfigError::config(
                "install.binary_extensions must list at least one non-empty extension",
            ));
        }

        Ok(())
    }

    /// Extensions without a leading dot, lowercased.
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.binary_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .collect()
    }
}
