//! Lock file for single-instance enforcement.

use crate::error::{Result as ServiceResult, ServiceError};

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::panic::Location;
use std::path::{Path, PathBuf};

use error_location::ErrorLocation;
use log::info;
use serde::{Deserialize, Serialize};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

pub const LOCK_FILENAME: &str = "gss.lock";
#[cfg(unix)]
const LOCK_FILE_MODE: u32 = 0o600; // Owner read/write only

/// Prevents two supervisors from managing the same install.
///
/// The lock file holds JSON with the PID and start time, so a lock left by
/// a crashed supervisor is detected and replaced. A watchdog that tries to
/// start a second copy while one is alive gets `AlreadyRunning`.
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
    file: Option<File>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub started_at: String,
}

impl LockFile {
    /// Take the lock in `dir`, replacing a stale one.
    pub fn acquire(dir: &Path) -> ServiceResult<Self> {
        let path = dir.join(LOCK_FILENAME);

        if path.exists()
            && let Some(existing) = Self::read_lock_info(&path)
        {
            if existing.pid != std::process::id() && is_process_running(existing.pid) {
                return Err(ServiceError::AlreadyRunning {
                    path,
                    pid: existing.pid,
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            info!(
                "Removing stale lock file (PID {} not running)",
                existing.pid
            );
            std::fs::remove_file(&path).ok();
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(LOCK_FILE_MODE);

        let file = options
            .open(&path)
            .map_err(|e| ServiceError::LockAcquisition {
                path: path.clone(),
                source: e,
                location: ErrorLocation::from(Location::caller()),
            })?;

        let mut lock = Self {
            path,
            file: Some(file),
        };
        lock.write_info()?;

        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_info(&mut self) -> ServiceResult<()> {
        let info = LockInfo {
            pid: std::process::id(),
            started_at: chrono::Utc::now().to_rfc3339(),
        };

        let content =
            serde_json::to_string_pretty(&info).map_err(|e| ServiceError::LockInfo {
                source: e,
                location: ErrorLocation::from(Location::caller()),
            })?;

        if let Some(ref mut file) = self.file {
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        Ok(())
    }

    /// Unreadable or corrupt lock files count as stale.
    pub fn read_lock_info(path: &Path) -> Option<LockInfo> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Release the lock file.
    ///
    /// Called automatically on drop.
    pub fn release(&mut self) {
        if self.file.take().is_some() {
            std::fs::remove_file(&self.path).ok();
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        self.release();
    }
}

/// Signal 0 probes for existence without touching the process.
#[cfg(unix)]
fn is_process_running(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let raw = match i32::try_from(pid) {
        Ok(raw) if raw > 0 => raw,
        _ => return false,
    };
    // EPERM: alive, owned by someone else
    matches!(kill(Pid::from_raw(raw), None), Ok(()) | Err(Errno::EPERM))
}

#[cfg(windows)]
fn is_process_running(pid: u32) -> bool {
    let mut system = sysinfo::System::new();
    system.refresh_processes();
    system.process(sysinfo::Pid::from_u32(pid)).is_some()
}
