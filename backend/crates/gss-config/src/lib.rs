mod config;
mod credentials;
mod credentials_config;
mod error;
mod install_config;
mod launch_args;
mod launch_config;
mod log_level;
mod logging_config;
mod notification_config;
mod supervisor_config;
mod updater_config;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use credentials::Credentials;
pub use credentials_config::CredentialsConfig;
pub use error::{ConfigError, ConfigErrorResult};
pub use install_config::InstallConfig;
pub use launch_args::LaunchArgs;
pub use launch_config::LaunchConfig;
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use notification_config::NotificationConfig;
pub use supervisor_config::SupervisorConfig;
pub use updater_config::UpdaterConfig;

const CONFIG_DIR_ENV: &str = "GSS_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = ".gss";
const CONFIG_FILENAME: &str = "config.toml";

// Supervisor
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const MIN_POLL_INTERVAL_SECS: u64 = 1;
const MAX_POLL_INTERVAL_SECS: u64 = 86_400;
const DEFAULT_REINSTALL_BACKOFF_SECS: u64 = 20;
const MIN_REINSTALL_BACKOFF_SECS: u64 = 1;
const MAX_REINSTALL_BACKOFF_SECS: u64 = 3_600;

// Install
const DEFAULT_INSTALL_DIR: &str = "server";
const DEFAULT_STAGING_DIR: &str = "staging";
const DEFAULT_EXECUTABLE_NAME: &str = "BattleBit.exe";
const DEFAULT_BINARY_EXTENSIONS: [&str; 4] = ["exe", "dll", "so", "dylib"];

// Updater
const DEFAULT_UPDATER_TOOL_PATH: &str = "steamcmd";
const DEFAULT_RELEASE_CHANNEL: &str = "public";
const DEFAULT_UPDATER_TIMEOUT_SECS: u64 = 0;

// Launch
const DEFAULT_LAUNCH_ARGS_FILE: &str = "launch.toml";
const DEFAULT_DISPLAY_FLAGS: [&str; 2] = ["-batchmode", "-nographics"];
const DEFAULT_LOCAL_IP: &str = "0.0.0.0";
const DEFAULT_GAME_PORT: u16 = 29595;
const MIN_GAME_PORT: u16 = 1024;

// Credentials
const DEFAULT_UPDATER_LOGIN_ENV: &str = "STEAM_USERNAME";
const DEFAULT_API_ENDPOINT_ENV: &str = "GSS_API_ENDPOINT";

// Logging
const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_DIRECTORY: &str = "log";
const DEFAULT_LOG_COLORED: bool = true;

// Notification
const DEFAULT_SOURCE_TAG: &str = "gs_srv";
