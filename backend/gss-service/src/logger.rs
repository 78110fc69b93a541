use crate::error::{Result as ServiceErrorResult, ServiceError};

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::{Color, ColoredLevelConfig};
use log::{Record, info};

/// Initialize logger with fern
///
/// # Arguments
/// * `log_level` - Log level filter
/// * `log_file` - Optional path to log file. None = stdout, Some = file output
/// * `colored` - Enable colored output (ignored when logging to file)
pub fn initialize(
    log_level: gss_config::LogLevel,
    log_file: Option<PathBuf>,
    colored: bool,
) -> ServiceErrorResult<()> {
    let level_filter = log_level.0;

    let dispatch = match log_file {
        Some(ref log_path) => file_dispatch(log_path)?,
        None => stdout_dispatch(colored),
    };

    Dispatch::new()
        .level(level_filter)
        .chain(dispatch)
        .apply()
        .map_err(|e| ServiceError::Logger {
            message: format!("Failed to initialize logger: {e}"),
        })?;

    if let Some(ref path) = log_file {
        info!(
            "Logger initialized: level={:?}, file={}",
            level_filter,
            path.display()
        );
    } else {
        info!("Logger initialized: level={:?}, stdout", level_filter);
    }

    Ok(())
}

/// File output (no colors, plain format). Creates the log directory if needed.
fn file_dispatch(log_path: &Path) -> ServiceErrorResult<Dispatch> {
    if let Some(log_dir) = log_path.parent() {
        std::fs::create_dir_all(log_dir).map_err(|e| ServiceError::Logger {
            message: format!("Failed to create log directory {}: {e}", log_dir.display()),
        })?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|e| ServiceError::Logger {
            message: format!("Failed to open log file {}: {e}", log_path.display()),
        })?;

    Ok(Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_line(&record.level(), message, record)
            ))
        })
        .chain(file))
}

fn stdout_dispatch(colored: bool) -> Dispatch {
    if colored {
        // Colored output for TTY
        let colors = ColoredLevelConfig::new()
            .trace(Color::Magenta)
            .debug(Color::Blue)
            .info(Color::Green)
            .warn(Color::Yellow)
            .error(Color::Red);

        Dispatch::new()
            .format(move |out, message, record| {
                out.finish(format_args!(
                    "{}",
                    format_line(&colors.color(record.level()), message, record)
                ))
            })
            .chain(std::io::stdout())
    } else {
        // Plain output for non-TTY (systemd, service managers)
        Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "{}",
                    format_line(&record.level(), message, record)
                ))
            })
            .chain(std::io::stdout())
    }
}

/// `[{rfc3339} - {level}] {message} [{file}:{line}]`
pub(crate) fn format_line(
    level: &dyn std::fmt::Display,
    message: &std::fmt::Arguments,
    record: &Record,
) -> String {
    format!(
        "[{date} - {level}] {message} [{file}:{line}]",
        date = humantime::format_rfc3339(SystemTime::now()),
        level = level,
        message = message,
        file = record.file().unwrap_or("unknown"),
        line = record.line().unwrap_or(0),
    )
}
