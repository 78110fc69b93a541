use gss_service::{ServiceError, logger, service};

use std::process::ExitCode;

use log::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    // Load and validate configuration
    let config = match gss_config::Config::load().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            // Logger is not up yet
            eprintln!("gss: {e}");
            return ExitCode::FAILURE;
        }
    };

    let log_file_path = match config.log_file_path() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("gss: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize logger (before any other logging)
    if let Err(e) = logger::initialize(config.logging.level, log_file_path, config.logging.colored)
    {
        eprintln!("gss: {e}");
        return ExitCode::FAILURE;
    }

    info!("Starting gss v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    let notifier = service::build_notifier(&config);

    match service::run(&config, notifier.clone()).await {
        Ok(()) => {
            info!("Supervisor stopped");
            ExitCode::SUCCESS
        }
        Err(ServiceError::AlreadyRunning { pid, .. }) => {
            warn!("Another supervisor (PID {pid}) is already running, nothing to do");
            ExitCode::SUCCESS
        }
        Err(e) => {
            if !e.is_reported() {
                notifier.fatal(e.to_string());
            }
            error!("Supervisor terminated: {e}");
            ExitCode::FAILURE
        }
    }
}
