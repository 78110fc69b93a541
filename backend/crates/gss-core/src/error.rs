use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Failed to recreate directory {path}: {source} {location}")]
    DirectoryReset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Failed to spawn updater {tool}: {source} {location}")]
    UpdaterSpawn {
        tool: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Updater exited with code {code:?} {location}")]
    UpdaterFailed {
        code: Option<i32>,
        location: ErrorLocation,
    },

    #[error("Updater did not finish within {timeout_secs}s {location}")]
    UpdaterTimeout {
        timeout_secs: u64,
        location: ErrorLocation,
    },

    #[error("Failed to fingerprint {path}: {message} {location}")]
    Fingerprint {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
    },

    #[error("Failed to spawn game server {path}: {source} {location}")]
    ProcessSpawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Fatal error during {phase}: {source}")]
    Fatal {
        phase: &'static str,
        #[source]
        source: Box<SupervisorError>,
    },

    #[error("IO error: {source} {location}")]
    Io {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },
}

impl SupervisorError {
    /// Wrap an error that must stop the supervisor.
    pub fn fatal(phase: &'static str, source: SupervisorError) -> Self {
        Self::Fatal {
            phase,
            source: Box::new(source),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }
}

impl From<std::io::Error> for SupervisorError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
