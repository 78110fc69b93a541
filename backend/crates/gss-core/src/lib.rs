pub mod error;
pub mod fingerprint;
pub mod install_state;
pub mod installer;
pub mod launch_spec;
pub mod notification_event;
pub mod notification_level;
pub mod notification_sink;
pub mod notifier;
pub mod output_line;
pub mod process_control;
pub mod shutdown_coordinator;
pub mod shutdown_guard;
pub mod supervisor;
pub mod supervisor_phase;
pub mod update_detector;
pub mod update_tool;

pub use error::{Result as SupervisorResult, SupervisorError};
pub use fingerprint::{Fingerprint, Fingerprinter};
pub use install_state::InstallState;
pub use installer::{Installer, reset_directory};
pub use launch_spec::LaunchSpec;
pub use notification_event::NotificationEvent;
pub use notification_level::NotificationLevel;
pub use notification_sink::{LogSink, NotificationSink};
pub use notifier::Notifier;
pub use output_line::{OutputLine, OutputStream, spawn_output_forwarder};
pub use process_control::{KillReport, OsProcessController, ProcessControl, process_name_matches};
pub use shutdown_coordinator::ShutdownCoordinator;
pub use shutdown_guard::ShutdownGuard;
pub use supervisor::{Supervisor, SupervisorSettings};
pub use supervisor_phase::SupervisorPhase;
pub use update_detector::UpdateDetector;
pub use update_tool::{SteamCmdTool, UpdateTool};

#[cfg(test)]
mod tests;
