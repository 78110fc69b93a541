mod supervisor;

use crate::{
    KillReport, LaunchSpec, NotificationEvent, NotificationLevel, NotificationSink, Notifier,
    ProcessControl, SupervisorError, SupervisorResult, UpdateTool,
};

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use error_location::ErrorLocation;

pub(crate) const TEST_TAG: &str = "gs_srv";
pub(crate) const TEST_HOST: &str = "test-host";

// =========================================================================
// Notifications
// =========================================================================

/// Sink that keeps every event for later inspection
#[derive(Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingSink {
    pub(crate) fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn messages_at(&self, level: NotificationLevel) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|event| event.level == level)
            .map(|event| event.message)
            .collect()
    }

    pub(crate) fn has_message(&self, level: NotificationLevel, needle: &str) -> bool {
        self.messages_at(level)
            .iter()
            .any(|message| message.contains(needle))
    }
}

impl NotificationSink for RecordingSink {
    fn emit(&self, event: NotificationEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub(crate) fn recording_notifier() -> (Notifier, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let notifier = Notifier::new(TEST_TAG, TEST_HOST, sink.clone());
    (notifier, sink)
}

// =========================================================================
// Update tool
// =========================================================================

/// What one updater run does to its target directory
#[derive(Debug, Clone)]
pub(crate) enum ToolStep {
    /// Write these files (relative path, contents)
    Build(Vec<(&'static str, &'static [u8])>),
    /// Exit non-zero without writing anything
    Fail,
}

pub(crate) fn build(contents: &'static [u8]) -> ToolStep {
    let assembly: &'static [u8] = b"assembly";
    let readme: &'static [u8] = b"not a binary";
    ToolStep::Build(vec![
        ("BattleBit.exe", contents),
        ("BattleBit_Data/Managed/Assembly.dll", assembly),
        ("readme.txt", readme),
    ])
}

/// Updater double that writes real files, so the real hasher runs.
///
/// Steps are consumed in order; once the script runs out the last step repeats.
#[derive(Clone)]
pub(crate) struct FakeUpdateTool {
    steps: Arc<Mutex<VecDeque<ToolStep>>>,
    last: Arc<Mutex<ToolStep>>,
    targets: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeUpdateTool {
    pub(crate) fn scripted(steps: Vec<ToolStep>) -> Self {
        let last = steps.last().cloned().unwrap_or(ToolStep::Fail);
        Self {
            steps: Arc::new(Mutex::new(steps.into())),
            last: Arc::new(Mutex::new(last)),
            targets: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn always(step: ToolStep) -> Self {
        Self::scripted(vec![step])
    }

    pub(crate) fn run_count(&self) -> usize {
        self.targets.lock().unwrap().len()
    }

    pub(crate) fn targets(&self) -> Vec<PathBuf> {
        self.targets.lock().unwrap().clone()
    }

    fn next_step(&self) -> ToolStep {
        let mut steps = self.steps.lock().unwrap();
        match steps.pop_front() {
            Some(step) => {
                *self.last.lock().unwrap() = step.clone();
                step
            }
            None => self.last.lock().unwrap().clone(),
        }
    }
}

#[async_trait]
impl UpdateTool for FakeUpdateTool {
    async fn run(&self, target: &Path) -> SupervisorResult<()> {
        self.targets.lock().unwrap().push(target.to_path_buf());

        match self.next_step() {
            ToolStep::Build(files) => {
                for (relative, contents) in files {
                    let path = target.join(relative);
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(path, contents)?;
                }
                Ok(())
            }
            ToolStep::Fail => Err(SupervisorError::UpdaterFailed {
                code: Some(8),
                location: ErrorLocation::from(std::panic::Location::caller()),
            }),
        }
    }
}

// =========================================================================
// Process control
// =========================================================================

/// Process table double: one logical server that is either up or down.
#[derive(Clone, Default)]
pub(crate) struct FakeProcess {
    running: Arc<AtomicBool>,
    start_results: Arc<Mutex<VecDeque<bool>>>,
    starts: Arc<AtomicUsize>,
    kills: Arc<AtomicUsize>,
}

impl FakeProcess {
    pub(crate) fn stopped() -> Self {
        Self::default()
    }

    pub(crate) fn running() -> Self {
        let process = Self::default();
        process.running.store(true, Ordering::SeqCst);
        process
    }

    /// Outcomes for the next start attempts; unscripted starts succeed
    pub(crate) fn with_start_results(self, results: Vec<bool>) -> Self {
        *self.start_results.lock().unwrap() = results.into();
        self
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub(crate) fn is_up(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub(crate) fn kill_count(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessControl for FakeProcess {
    async fn is_running(&self) -> bool {
        self.is_up()
    }

    async fn start(&self, _spec: &LaunchSpec) -> SupervisorResult<u32> {
        self.starts.fetch_add(1, Ordering::SeqCst);

        let succeeds = self.start_results.lock().unwrap().pop_front().unwrap_or(true);
        if succeeds {
            self.set_running(true);
            Ok(4242)
        } else {
            Err(SupervisorError::ProcessSpawn {
                path: PathBuf::from("BattleBit.exe"),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
                location: ErrorLocation::from(std::panic::Location::caller()),
            })
        }
    }

    async fn kill(&self) -> KillReport {
        self.kills.fetch_add(1, Ordering::SeqCst);

        let killed = usize::from(self.running.swap(false, Ordering::SeqCst));
        KillReport { killed, failed: 0 }
    }
}

// =========================================================================
// Real child processes
// =========================================================================

/// Write an executable `/bin/sh` script into `dir`.
#[cfg(unix)]
pub(crate) fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Retry a spawn that raced another test's fork and hit ETXTBSY.
#[cfg(unix)]
pub(crate) async fn retry_text_busy<T, F, Fut>(mut attempt: F) -> SupervisorResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = SupervisorResult<T>>,
{
    const ETXTBSY: i32 = 26;

    for _ in 0..20 {
        match attempt().await {
            Err(
                SupervisorError::ProcessSpawn { ref source, .. }
                | SupervisorError::UpdaterSpawn { ref source, .. },
            ) if source.raw_os_error() == Some(ETXTBSY) => {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            other => return other,
        }
    }
    attempt().await
}

/// Poll `condition` every 50ms for up to five seconds.
#[cfg(unix)]
pub(crate) async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    condition()
}
