//! External updater invocation.

use crate::{SupervisorError, SupervisorResult};

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use error_location::ErrorLocation;
use gss_config::{Credentials, UpdaterConfig};
use log::{debug, info, warn};
use tokio::process::Command;

/// Populates a directory with the current build of the game server.
///
/// The contract is wipe-and-install: callers hand over an empty directory.
#[async_trait]
pub trait UpdateTool: Send + Sync {
    async fn run(&self, target: &Path) -> SupervisorResult<()>;
}

/// SteamCMD-style updater driven entirely by `+command` arguments.
#[derive(Clone)]
pub struct SteamCmdTool {
    tool_path: PathBuf,
    login: String,
    product_id: String,
    release_channel: String,
    timeout: Option<Duration>,
}

impl SteamCmdTool {
    pub fn new(config: &UpdaterConfig, credentials: &Credentials) -> Self {
        Self {
            tool_path: PathBuf::from(&config.tool_path),
            login: credentials.updater_login.clone(),
            product_id: config.product_id.clone(),
            release_channel: config.release_channel.clone(),
            timeout: config.timeout(),
        }
    }

    /// Full argument list for an install into `target`.
    pub fn arguments(&self, target: &Path) -> Vec<String> {
        vec![
            String::from("+force_install_dir"),
            target.display().to_string(),
            String::from("+login"),
            self.login.clone(),
            String::from("+app_update"),
            self.product_id.clone(),
            String::from("-beta"),
            self.release_channel.clone(),
            String::from("+exit"),
        ]
    }
}

#[async_trait]
impl UpdateTool for SteamCmdTool {
    async fn run(&self, target: &Path) -> SupervisorResult<()> {
        info!(
            "Running {} for product {} ({}) into {}",
            self.tool_path.display(),
            self.product_id,
            self.release_channel,
            target.display()
        );

        let mut cmd = Command::new(&self.tool_path);
        cmd.args(self.arguments(target))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        // A terminal Ctrl+C is a stop request for the supervisor, not for the updater
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .spawn()
            .map_err(|e| SupervisorError::UpdaterSpawn {
                tool: self.tool_path.clone(),
                source: e,
                location: ErrorLocation::from(Location::caller()),
            })?;

        let status = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    warn!("Updater exceeded {}s, killing it", timeout.as_secs());
                    child.kill().await.ok();
                    return Err(SupervisorError::UpdaterTimeout {
                        timeout_secs: timeout.as_secs(),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            },
            None => child.wait().await?,
        };

        debug!("Updater finished with {status}");

        if !status.success() {
            return Err(SupervisorError::UpdaterFailed {
                code: status.code(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(())
    }
}
