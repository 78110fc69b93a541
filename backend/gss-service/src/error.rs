use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Config error: {0}")]
    Config(#[from] gss_config::ConfigError),

    #[error("{0}")]
    Supervisor(#[from] gss_core::SupervisorError),

    #[error("Supervisor already running (PID {pid}, lock file {path}) {location}")]
    AlreadyRunning {
        path: PathBuf,
        pid: u32,
        location: ErrorLocation,
    },

    #[error("Failed to acquire lock file {path}: {source} {location}")]
    LockAcquisition {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Failed to serialize lock info: {source} {location}")]
    LockInfo {
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },

    #[error("Logger error: {message}")]
    Logger { message: String },

    #[error("IO error: {source} {location}")]
    Io {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },
}

impl ServiceError {
    /// Whether the supervisor already sent the Fatal notification for this error.
    pub fn is_reported(&self) -> bool {
        matches!(self, Self::Supervisor(_))
    }
}

impl From<std::io::Error> for ServiceError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
