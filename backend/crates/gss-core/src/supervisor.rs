//! The polling state machine that keeps the game server installed,
//! current and running.

use crate::{
    Fingerprinter, InstallState, Installer, LaunchSpec, Notifier, ProcessControl, ShutdownGuard,
    SupervisorError, SupervisorPhase, SupervisorResult, UpdateDetector, UpdateTool,
};

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::watch;

const START_BANNER: &str = "-------- Starting GSS --------";
const STOP_BANNER: &str = "-------- Stopping GSS --------";

/// Everything the loop needs that is fixed for its lifetime.
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub install_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub poll_interval: Duration,
    pub reinstall_backoff: Duration,
}

pub struct Supervisor<T: UpdateTool, P: ProcessControl> {
    tool: T,
    process: P,
    fingerprinter: Fingerprinter,
    notifier: Notifier,
    launch_spec: LaunchSpec,
    settings: SupervisorSettings,
    phase_tx: watch::Sender<SupervisorPhase>,
}

impl<T: UpdateTool, P: ProcessControl> Supervisor<T, P> {
    pub fn new(
        tool: T,
        process: P,
        fingerprinter: Fingerprinter,
        notifier: Notifier,
        launch_spec: LaunchSpec,
        settings: SupervisorSettings,
    ) -> Self {
        let (phase_tx, _) = watch::channel(SupervisorPhase::Bootstrapping);

        Self {
            tool,
            process,
            fingerprinter,
            notifier,
            launch_spec,
            settings,
            phase_tx,
        }
    }

    /// Subscribe to phase changes. Repeating the current phase is not a change.
    pub fn subscribe(&self) -> watch::Receiver<SupervisorPhase> {
        self.phase_tx.subscribe()
    }

    pub fn phase(&self) -> SupervisorPhase {
        self.phase_tx.borrow().clone()
    }

    /// Bootstrap, then poll until a stop is requested or something fatal happens.
    ///
    /// A stop request is honoured between steps and while sleeping, never in
    /// the middle of an install.
    pub async fn run(&self, mut shutdown: ShutdownGuard) -> SupervisorResult<()> {
        self.notifier.info(START_BANNER);

        let mut state = match self.bootstrap().await {
            Ok(state) => state,
            Err(e) => return Err(self.fail(e)),
        };

        loop {
            if shutdown.poll_shutdown() {
                break;
            }

            let delay = match self.tick(&mut state).await {
                Ok(delay) => delay,
                Err(e) => return Err(self.fail(e)),
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.wait() => break,
            }
        }

        self.stop().await;
        Ok(())
    }

    /// Full install into the primary directory and initial fingerprint.
    pub async fn bootstrap(&self) -> SupervisorResult<InstallState> {
        self.set_phase(SupervisorPhase::Bootstrapping);
        self.notifier.info(format!(
            "Bootstrapping: installing game server into {}",
            self.settings.install_dir.display()
        ));

        let mut state = InstallState::new(
            self.settings.install_dir.clone(),
            self.settings.staging_dir.clone(),
        );
        self.install_primary(&mut state, "bootstrap").await?;

        self.notifier.info(format!(
            "Bootstrap complete, launch command: {}",
            self.launch_spec.redacted()
        ));
        Ok(state)
    }

    /// One poll cycle. Returns how long to sleep before the next one.
    pub async fn tick(&self, state: &mut InstallState) -> SupervisorResult<Duration> {
        if state.is_marked_for_reinstall() {
            self.set_phase(SupervisorPhase::Reinstalling);
            self.notifier.alert(format!(
                "Reinstalling game server after {} failed start(s)",
                state.consecutive_start_failures()
            ));
            self.install_primary(state, "reinstall").await?;
        } else {
            self.set_phase(SupervisorPhase::Polling);
            let detector = UpdateDetector::new(self.installer(), &self.fingerprinter, &self.notifier);

            if detector
                .update_available(state.staging_dir(), state.installed_fingerprint())
                .await
            {
                self.set_phase(SupervisorPhase::Updating);
                self.notifier.info("Update available, updating game server");
                self.install_primary(state, "update").await?;
            }
        }

        if !self.process.is_running().await {
            self.set_phase(SupervisorPhase::Starting);

            if let Err(e) = self.process.start(&self.launch_spec).await {
                state.record_start_failure();
                self.notifier.error(format!(
                    "Failed to start game server, marking for reinstall: {e}"
                ));
            }
        }

        self.set_phase(SupervisorPhase::Polling);

        Ok(if state.is_marked_for_reinstall() {
            self.settings.reinstall_backoff
        } else {
            self.settings.poll_interval
        })
    }

    /// Kill the game server and mark the loop stopped.
    pub async fn stop(&self) {
        self.notifier.info(STOP_BANNER);

        let report = self.process.kill().await;
        self.notifier.info(format!(
            "Stopped: killed {} game server process(es)",
            report.killed
        ));
        self.set_phase(SupervisorPhase::Stopped);
    }

    /// Wipe, install and re-fingerprint the primary directory.
    ///
    /// Any failure is fatal: there is no fallback below a full reinstall.
    async fn install_primary(
        &self,
        state: &mut InstallState,
        phase: &'static str,
    ) -> SupervisorResult<()> {
        self.installer()
            .install(state.install_dir(), true)
            .await
            .map_err(|e| SupervisorError::fatal(phase, e))?;

        let fingerprint = self
            .fingerprinter
            .fingerprint_async(state.install_dir())
            .await
            .map_err(|e| SupervisorError::fatal(phase, e))?;

        self.notifier.info(format!(
            "Installed build {} ({} binaries) after {phase}",
            fingerprint.short(),
            fingerprint.artifact_count()
        ));
        state.record_install(fingerprint);
        Ok(())
    }

    fn installer(&self) -> Installer<'_, T, P> {
        Installer::new(&self.tool, &self.process, &self.notifier)
    }

    fn fail(&self, error: SupervisorError) -> SupervisorError {
        self.notifier.fatal(error.to_string());
        self.set_phase(SupervisorPhase::Failed {
            error: error.to_string(),
        });
        error
    }

    fn set_phase(&self, phase: SupervisorPhase) {
        self.phase_tx.send_if_modified(|current| {
            if *current == phase {
                return false;
            }
            *current = phase;
            true
        });
    }
}
