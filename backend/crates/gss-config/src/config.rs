use crate::{
    CONFIG_DIR_ENV, CONFIG_FILENAME, ConfigError, ConfigErrorResult, CredentialsConfig,
    DEFAULT_CONFIG_DIR, InstallConfig, LaunchConfig, LoggingConfig, NotificationConfig,
    SupervisorConfig, UpdaterConfig,
};

use std::path::{Component, Path, PathBuf};

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub supervisor: SupervisorConfig,
    pub install: InstallConfig,
    pub updater: UpdaterConfig,
    pub launch: LaunchConfig,
    pub credentials: CredentialsConfig,
    pub logging: LoggingConfig,
    pub notification: NotificationConfig,
}

impl Config {
    /// Load config.
    ///
    /// Loading order:
    /// 1. Check for GSS_CONFIG_DIR env var, else use ./.gss/
    /// 2. Auto-create config directory if it doesn't exist
    /// 3. Load config.toml if it exists, else use defaults
    /// 4. Apply GSS_* environment variable overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::Io {
                path: config_dir.clone(),
                source: e,
            })?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load and parse TOML file with detailed error context.
    fn load_toml(path: &PathBuf) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.clone(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: GSS_CONFIG_DIR env var > ./.gss/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir()
            .map_err(|_| ConfigError::config("Cannot determine current working directory"))?;
        Ok(cwd.join(DEFAULT_CONFIG_DIR))
    }

    /// Validate all configuration.
    /// Call after load() to catch all errors at startup.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.supervisor.validate()?;
        self.install.validate()?;
        self.updater.validate()?;
        self.launch.validate()?;
        self.notification.validate()?;

        // Staging wipes its directory on every probe, so it must never overlap the install
        let install_dir = self.install_dir()?;
        let staging_dir = self.staging_dir()?;
        if install_dir.starts_with(&staging_dir) || staging_dir.starts_with(&install_dir) {
            return Err(ConfigError::config(format!(
                "install.install_dir ({}) and install.staging_dir ({}) must not overlap",
                install_dir.display(),
                staging_dir.display()
            )));
        }

        Ok(())
    }

    /// Absolute path of the primary install directory.
    pub fn install_dir(&self) -> ConfigErrorResult<PathBuf> {
        Self::resolve(&self.install.install_dir)
    }

    /// Absolute path of the update staging directory.
    pub fn staging_dir(&self) -> ConfigErrorResult<PathBuf> {
        Self::resolve(&self.install.staging_dir)
    }

    /// Absolute path of the key/value launch args file.
    pub fn args_file_path(&self) -> ConfigErrorResult<PathBuf> {
        Self::resolve(&self.launch.args_file)
    }

    /// Absolute path of the log file, if logging to a file.
    pub fn log_file_path(&self) -> ConfigErrorResult<Option<PathBuf>> {
        match self.logging.file {
            Some(ref filename) => {
                let log_dir = Self::resolve(&self.logging.dir)?;
                Ok(Some(log_dir.join(filename)))
            }
            None => Ok(None),
        }
    }

    fn resolve(path: &str) -> ConfigErrorResult<PathBuf> {
        let path = Path::new(path);
        if path.is_absolute() {
            return Ok(normalize(path));
        }
        Ok(normalize(&Self::config_dir()?.join(path)))
    }

    /// Log configuration summary (NEVER logs secrets).
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!(
            "  supervisor: poll={}s, reinstall_backoff={}s",
            self.supervisor.poll_interval_secs, self.supervisor.reinstall_backoff_secs
        );
        info!(
            "  install: dir={}, staging={}, exe={}",
            self.install.install_dir, self.install.staging_dir, self.install.executable_name
        );
        info!(
            "  install: binary extensions {}",
            self.install.binary_extensions.join(",")
        );

        let timeout = if self.updater.timeout_secs > 0 {
            format!("{}s", self.updater.timeout_secs)
        } else {
            String::from("none")
        };
        info!(
            "  updater: {} (product {}, channel {}, timeout {})",
            self.updater.tool_path, self.updater.product_id, self.updater.release_channel, timeout
        );

        info!(
            "  launch: {}:{} {} (args file {})",
            self.launch.local_ip,
            self.launch.port,
            self.launch.display_flags.join(" "),
            self.launch.args_file
        );
        info!(
            "  credentials: from ${} and ${}",
            self.credentials.updater_login_env, self.credentials.api_endpoint_env
        );
        info!(
            "  logging: {} (colored: {})",
            *self.logging.level, self.logging.colored
        );
        info!(
            "  notification: tag={}, host={}",
            self.notification.source_tag,
            self.notification
                .host_identity
                .as_deref()
                .unwrap_or("<hostname>")
        );
    }

    fn apply_env_overrides(&mut self) {
        // Supervisor
        Self::apply_env_parse(
            "GSS_POLL_INTERVAL_SECS",
            &mut self.supervisor.poll_interval_secs,
        );
        Self::apply_env_parse(
            "GSS_REINSTALL_BACKOFF_SECS",
            &mut self.supervisor.reinstall_backoff_secs,
        );

        // Install
        Self::apply_env_string("GSS_INSTALL_DIR", &mut self.install.install_dir);
        Self::apply_env_string("GSS_STAGING_DIR", &mut self.install.staging_dir);
        Self::apply_env_string("GSS_EXECUTABLE_NAME", &mut self.install.executable_name);

        // Updater
        Self::apply_env_string("GSS_UPDATER_TOOL_PATH", &mut self.updater.tool_path);
        Self::apply_env_string("GSS_UPDATER_PRODUCT_ID", &mut self.updater.product_id);
        Self::apply_env_string(
            "GSS_UPDATER_RELEASE_CHANNEL",
            &mut self.updater.release_channel,
        );
        Self::apply_env_parse("GSS_UPDATER_TIMEOUT_SECS", &mut self.updater.timeout_secs);

        // Launch
        Self::apply_env_string("GSS_LAUNCH_ARGS_FILE", &mut self.launch.args_file);
        Self::apply_env_string("GSS_LAUNCH_LOCAL_IP", &mut self.launch.local_ip);
        Self::apply_env_parse("GSS_LAUNCH_PORT", &mut self.launch.port);

        // Logging
        Self::apply_env_parse("GSS_LOG_LEVEL", &mut self.logging.level);
        Self::apply_env_bool("GSS_LOG_COLORED", &mut self.logging.colored);
        Self::apply_env_option_string("GSS_LOG_FILE", &mut self.logging.file);

        // Notification
        Self::apply_env_option_string(
            "GSS_HOST_IDENTITY",
            &mut self.notification.host_identity,
        );
    }

    /// Helper: Apply environment variable override for String values
    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Helper: Apply environment variable override for bool values (accepts "true"/"1")
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Helper: Apply environment variable override for parseable values
    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    /// Helper: Apply environment variable override for Option<String> values
    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = Some(val);
        }
    }
}

/// Fold `.` and `..` out of a path without touching the filesystem.
///
/// The directories may not exist yet, so `canonicalize` is not an option.
/// Symlinks are taken at face value.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(component),
            },
            other => normalized.push(other),
        }
    }
    normalized
}
