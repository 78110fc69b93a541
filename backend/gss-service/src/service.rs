//! Wires configuration, credentials and OS signals to the supervisor loop.

use crate::error::Result as ServiceResult;
use crate::lock::LockFile;

use gss_config::{Config, Credentials, LaunchArgs};
use gss_core::{
    Fingerprinter, LaunchSpec, LogSink, Notifier, OsProcessController, ShutdownCoordinator,
    SteamCmdTool, Supervisor, SupervisorPhase, SupervisorSettings, spawn_output_forwarder,
};

use std::sync::Arc;

use log::{error, info};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Notifier for the configured tag, tagged with the configured host or the OS hostname.
pub fn build_notifier(config: &Config) -> Notifier {
    let host_identity = config
        .notification
        .host_identity
        .as_deref()
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(str::to_lowercase)
        .unwrap_or_else(Notifier::os_host_identity);

    Notifier::new(
        config.notification.source_tag.as_str(),
        host_identity,
        Arc::new(LogSink),
    )
}

/// Run the supervisor until a stop signal or a fatal error.
///
/// Lock, credential, launch-argument and supervisor errors all end the
/// process; only `AlreadyRunning` is benign.
pub async fn run(config: &Config, notifier: Notifier) -> ServiceResult<()> {
    let lock = LockFile::acquire(&Config::config_dir()?)?;
    info!("Lock acquired: {}", lock.path().display());

    let credentials = Credentials::resolve(&config.credentials)?;

    let args_file = config.args_file_path()?;
    let launch_args = LaunchArgs::load(&args_file)?;
    info!(
        "Loaded {} launch argument(s) from {}",
        launch_args.pairs().len(),
        args_file.display()
    );
    let launch_spec = LaunchSpec::assemble(&config.launch, &launch_args, &credentials);

    let install_dir = config.install_dir()?;
    let settings = SupervisorSettings {
        install_dir: install_dir.clone(),
        staging_dir: config.staging_dir()?,
        poll_interval: config.supervisor.poll_interval(),
        reinstall_backoff: config.supervisor.reinstall_backoff(),
    };

    let output_tx = spawn_output_forwarder(notifier.clone());
    let process = OsProcessController::new(
        &install_dir,
        &config.install.executable_name,
        notifier.clone(),
        output_tx,
    );
    let tool = SteamCmdTool::new(&config.updater, &credentials);
    let fingerprinter = Fingerprinter::new(config.install.normalized_extensions());

    let supervisor = Supervisor::new(tool, process, fingerprinter, notifier, launch_spec, settings);
    spawn_phase_logger(supervisor.subscribe());

    let shutdown = ShutdownCoordinator::new();
    let guard = shutdown.subscribe_guard();
    spawn_signal_listener(shutdown.clone());

    supervisor.run(guard).await?;

    drop(lock);
    Ok(())
}

/// Log every supervisor phase transition until the supervisor is dropped.
pub fn spawn_phase_logger(mut phases: watch::Receiver<SupervisorPhase>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while phases.changed().await.is_ok() {
            let phase = phases.borrow_and_update().clone();
            match phase {
                SupervisorPhase::Failed { error } => error!("Supervisor phase: failed ({error})"),
                other => info!("Supervisor phase: {}", other.as_str()),
            }
        }
    })
}

/// Translate SIGINT/SIGTERM into a stop request.
#[cfg(unix)]
fn spawn_signal_listener(shutdown: ShutdownCoordinator) {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = match Signals::new([SIGINT, SIGTERM]) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to register signal handlers: {e}");
            return;
        }
    };

    std::thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            info!("Received signal {sig}, stopping supervisor");
            shutdown.shutdown();
        }
    });
}

#[cfg(not(unix))]
fn spawn_signal_listener(shutdown: ShutdownCoordinator) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, stopping supervisor");
                shutdown.shutdown();
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {e}"),
        }
    });
}
