//! Wipe-and-reinstall of a target directory.

use crate::{Notifier, ProcessControl, SupervisorError, SupervisorResult, UpdateTool};

use std::panic::Location;
use std::path::Path;

use error_location::ErrorLocation;

/// Runs the updater against a freshly emptied directory.
///
/// Incremental updates are not trusted: the target is always deleted and
/// recreated before the updater runs.
pub struct Installer<'a, T: UpdateTool, P: ProcessControl> {
    tool: &'a T,
    process: &'a P,
    notifier: &'a Notifier,
}

impl<'a, T: UpdateTool, P: ProcessControl> Installer<'a, T, P> {
    pub fn new(tool: &'a T, process: &'a P, notifier: &'a Notifier) -> Self {
        Self {
            tool,
            process,
            notifier,
        }
    }

    /// Install into `target`.
    ///
    /// With `kill_running_first` any running game server is terminated
    /// before the directory is touched, so no binary is locked mid-overwrite.
    pub async fn install(&self, target: &Path, kill_running_first: bool) -> SupervisorResult<()> {
        if kill_running_first && self.process.is_running().await {
            let report = self.process.kill().await;
            self.notifier.info(format!(
                "Killed {} game server process(es) before install",
                report.killed
            ));
        }

        reset_directory(target)?;

        self.tool.run(target).await.inspect_err(|e| {
            self.notifier
                .error(format!("Install into {} failed: {e}", target.display()));
        })?;

        self.notifier
            .debug(format!("Installed game server into {}", target.display()));
        Ok(())
    }
}

/// Delete `dir` if present, then create it empty.
pub fn reset_directory(dir: &Path) -> SupervisorResult<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir).map_err(|e| SupervisorError::DirectoryReset {
            path: dir.to_path_buf(),
            source: e,
            location: ErrorLocation::from(Location::caller()),
        })?;
    }

    std::fs::create_dir_all(dir).map_err(|e| SupervisorError::DirectoryReset {
        path: dir.to_path_buf(),
        source: e,
        location: ErrorLocation::from(Location::caller()),
    })
}

/// Best-effort removal of a scratch directory.
pub fn discard_directory(dir: &Path) {
    if dir.exists()
        && let Err(e) = std::fs::remove_dir_all(dir)
    {
        log::warn!("Failed to remove {}: {e}", dir.display());
    }
}
