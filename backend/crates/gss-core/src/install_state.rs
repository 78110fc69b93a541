use crate::Fingerprint;

use std::path::{Path, PathBuf};

/// What the supervisor knows about the installation. Never persisted.
#[derive(Debug, Clone)]
pub struct InstallState {
    install_dir: PathBuf,
    staging_dir: PathBuf,
    installed_fingerprint: Fingerprint,
    consecutive_start_failures: u32,
}

impl InstallState {
    pub fn new(install_dir: PathBuf, staging_dir: PathBuf) -> Self {
        Self {
            install_dir,
            staging_dir,
            installed_fingerprint: Fingerprint::default(),
            consecutive_start_failures: 0,
        }
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    pub fn installed_fingerprint(&self) -> &Fingerprint {
        &self.installed_fingerprint
    }

    pub fn consecutive_start_failures(&self) -> u32 {
        self.consecutive_start_failures
    }

    /// Any start failure since the last install escalates to a reinstall.
    pub fn is_marked_for_reinstall(&self) -> bool {
        self.consecutive_start_failures > 0
    }

    pub fn record_start_failure(&mut self) {
        self.consecutive_start_failures += 1;
    }

    /// Only call after the install was verified and re-fingerprinted.
    pub fn record_install(&mut self, fingerprint: Fingerprint) {
        self.installed_fingerprint = fingerprint;
        self.consecutive_start_failures = 0;
    }
}
