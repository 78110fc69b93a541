//! Content-based update detection.
//!
//! There is no version cache to drift out of sync: a candidate build is
//! staged in scratch space and its fingerprint compared with the installed one.

use crate::installer::discard_directory;
use crate::{
    Fingerprint, Fingerprinter, Installer, Notifier, ProcessControl, SupervisorResult, UpdateTool,
};

use std::path::Path;

use log::debug;

pub struct UpdateDetector<'a, T: UpdateTool, P: ProcessControl> {
    installer: Installer<'a, T, P>,
    fingerprinter: &'a Fingerprinter,
    notifier: &'a Notifier,
}

impl<'a, T: UpdateTool, P: ProcessControl> UpdateDetector<'a, T, P> {
    pub fn new(
        installer: Installer<'a, T, P>,
        fingerprinter: &'a Fingerprinter,
        notifier: &'a Notifier,
    ) -> Self {
        Self {
            installer,
            fingerprinter,
            notifier,
        }
    }

    /// Whether the staged build differs from `installed`.
    ///
    /// Fails closed: any staging or hashing error reports "no update".
    pub async fn update_available(&self, staging_dir: &Path, installed: &Fingerprint) -> bool {
        let probe = self.probe(staging_dir).await;
        discard_directory(staging_dir);

        match probe {
            Ok(staged) => {
                debug!(
                    "Staged fingerprint {} ({} artifacts), installed {} ({} artifacts)",
                    staged.short(),
                    staged.artifact_count(),
                    installed.short(),
                    installed.artifact_count()
                );
                staged != *installed
            }
            Err(e) => {
                self.notifier
                    .error(format!("Update check failed, assuming no update: {e}"));
                false
            }
        }
    }

    /// Stage a build without touching the live server, then fingerprint it.
    async fn probe(&self, staging_dir: &Path) -> SupervisorResult<Fingerprint> {
        self.installer.install(staging_dir, false).await?;
        self.fingerprinter.fingerprint_async(staging_dir).await
    }
}
