//! Start, find and kill the managed game server.
//!
//! No handle is kept between calls: every query goes to the OS process
//! table by executable name, so manually started instances count too.

use crate::{LaunchSpec, Notifier, OutputLine, OutputStream, SupervisorError, SupervisorResult};

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use error_location::ErrorLocation;
use log::{debug, warn};
use sysinfo::System;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

// Linux truncates process names (comm) to 15 bytes
#[cfg(target_os = "linux")]
const MAX_PROCESS_NAME_LEN: usize = 15;

const EXIT_WAIT_TIMEOUT: Duration = Duration::from_secs(5);
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of a kill sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KillReport {
    /// Processes that were signalled successfully
    pub killed: usize,
    /// Processes that could not be signalled (already reported)
    pub failed: usize,
}

#[async_trait]
pub trait ProcessControl: Send + Sync {
    /// True iff at least one process matches the executable name.
    async fn is_running(&self) -> bool;

    /// Spawn the server without waiting for it to become ready. Returns the PID.
    async fn start(&self, spec: &LaunchSpec) -> SupervisorResult<u32>;

    /// Force-terminate every matching process. Never fails.
    async fn kill(&self) -> KillReport;
}

/// Process control backed by the real OS process table.
pub struct OsProcessController {
    executable_name: String,
    executable_path: PathBuf,
    working_dir: PathBuf,
    notifier: Notifier,
    output_tx: mpsc::Sender<OutputLine>,
}

impl OsProcessController {
    pub fn new(
        install_dir: &Path,
        executable_name: &str,
        notifier: Notifier,
        output_tx: mpsc::Sender<OutputLine>,
    ) -> Self {
        Self {
            executable_name: executable_name.to_string(),
            executable_path: install_dir.join(executable_name),
            working_dir: install_dir.to_path_buf(),
            notifier,
            output_tx,
        }
    }

    fn matching_pids(&self) -> Vec<u32> {
        let mut system = System::new();
        system.refresh_processes();

        let own_pid = std::process::id();
        let mut pids: Vec<u32> = system
            .processes()
            .iter()
            .filter(|(_, process)| process_name_matches(process.name(), &self.executable_name))
            .map(|(pid, _)| pid.as_u32())
            .filter(|pid| *pid != own_pid)
            .collect();
        pids.sort_unstable();
        pids
    }

    async fn wait_for_exit(&self) {
        let start = Instant::now();
        while start.elapsed() < EXIT_WAIT_TIMEOUT {
            if self.matching_pids().is_empty() {
                return;
            }
            tokio::time::sleep(EXIT_POLL_INTERVAL).await;
        }
        warn!(
            "{} still present {}s after kill",
            self.executable_name,
            EXIT_WAIT_TIMEOUT.as_secs()
        );
    }

    /// Relay one pipe line by line until the child closes it.
    ///
    /// Lines are decoded lossily. The pipe is drained to EOF even once the
    /// receiver is gone.
    fn forward_output<R>(&self, reader: R, stream: OutputStream)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let tx = self.output_tx.clone();
        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut buf = Vec::new();
            let mut forwarding = true;

            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) => break,
                    Ok(_) if forwarding => {
                        let line = String::from_utf8_lossy(&buf)
                            .trim_end_matches(['\r', '\n'])
                            .to_string();
                        if tx.send(OutputLine { stream, line }).await.is_err() {
                            forwarding = false;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Stopped reading game server {stream}: {e}");
                        break;
                    }
                }
            }
        });
    }
}

#[async_trait]
impl ProcessControl for OsProcessController {
    async fn is_running(&self) -> bool {
        !self.matching_pids().is_empty()
    }

    async fn start(&self, spec: &LaunchSpec) -> SupervisorResult<u32> {
        self.notifier.info(format!(
            "Starting {} {}",
            self.executable_path.display(),
            spec.redacted()
        ));

        let mut cmd = Command::new(&self.executable_path);
        cmd.args(spec.args())
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Keep terminal signals aimed at the supervisor away from the server
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|e| SupervisorError::ProcessSpawn {
            path: self.executable_path.clone(),
            source: e,
            location: ErrorLocation::from(Location::caller()),
        })?;

        let pid = child.id().unwrap_or_default();

        if let Some(stdout) = child.stdout.take() {
            self.forward_output(stdout, OutputStream::Stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            self.forward_output(stderr, OutputStream::Stderr);
        }

        // Reap the child so it never lingers as a zombie
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => notifier.alert(format!("Game server (PID {pid}) exited: {status}")),
                Err(e) => notifier.error(format!("Failed to wait on game server (PID {pid}): {e}")),
            }
        });

        self.notifier
            .info(format!("Game server started with PID {pid}"));

        Ok(pid)
    }

    async fn kill(&self) -> KillReport {
        let mut report = KillReport::default();

        for pid in self.matching_pids() {
            match terminate(pid) {
                Ok(true) => {
                    debug!("Killed {} (PID {pid})", self.executable_name);
                    report.killed += 1;
                }
                // Exited between enumeration and kill
                Ok(false) => {}
                Err(message) => {
                    self.notifier.error(format!(
                        "Process {pid} could not be terminated: {message}"
                    ));
                    report.failed += 1;
                }
            }
        }

        if report.killed > 0 {
            self.wait_for_exit().await;
        }

        report
    }
}

/// Name match used to find running instances.
///
/// Compares case-insensitively against the executable name and its stem
/// (`Server.exe` vs `Server`), and against the kernel-truncated name on Linux.
pub fn process_name_matches(process_name: &str, executable_name: &str) -> bool {
    if process_name.is_empty() || executable_name.is_empty() {
        return false;
    }

    if process_name.eq_ignore_ascii_case(executable_name) {
        return true;
    }

    let stem = Path::new(executable_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(executable_name);
    if process_name.eq_ignore_ascii_case(stem) {
        return true;
    }

    #[cfg(target_os = "linux")]
    if executable_name.len() > MAX_PROCESS_NAME_LEN
        && process_name.len() == MAX_PROCESS_NAME_LEN
        && executable_name.is_char_boundary(MAX_PROCESS_NAME_LEN)
    {
        return process_name.eq_ignore_ascii_case(&executable_name[..MAX_PROCESS_NAME_LEN]);
    }

    false
}

/// SIGKILL one process. `Ok(false)` when it no longer exists.
#[cfg(unix)]
fn terminate(pid: u32) -> Result<bool, String> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| format!("PID {pid} out of range"))?;
    match kill(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(windows)]
fn terminate(pid: u32) -> Result<bool, String> {
    let mut system = System::new();
    system.refresh_processes();

    match system.process(sysinfo::Pid::from_u32(pid)) {
        Some(process) if process.kill() => Ok(true),
        Some(_) => Err(String::from("TerminateProcess failed")),
        None => Ok(false),
    }
}
