use crate::tests::{
    FakeProcess, FakeUpdateTool, RecordingSink, ToolStep, build, recording_notifier,
};
use crate::{
    Fingerprinter, LaunchSpec, NotificationLevel, ShutdownCoordinator, Supervisor,
    SupervisorPhase, SupervisorSettings,
};

use std::sync::Arc;
use std::time::Duration;

use googletest::assert_that;
use googletest::prelude::{anything, eq, err, ok};
use tempfile::TempDir;

const POLL: Duration = Duration::from_secs(60);
const BACKOFF: Duration = Duration::from_secs(20);

struct Harness {
    temp: TempDir,
    tool: FakeUpdateTool,
    process: FakeProcess,
    sink: Arc<RecordingSink>,
    supervisor: Supervisor<FakeUpdateTool, FakeProcess>,
}

impl Harness {
    fn new(tool: FakeUpdateTool, process: FakeProcess) -> Self {
        Self::with_poll(tool, process, POLL)
    }

    fn with_poll(tool: FakeUpdateTool, process: FakeProcess, poll_interval: Duration) -> Self {
        let temp = TempDir::new().unwrap();
        let (notifier, sink) = recording_notifier();
        let settings = SupervisorSettings {
            install_dir: temp.path().join("server"),
            staging_dir: temp.path().join("staging"),
            poll_interval,
            reinstall_backoff: BACKOFF,
        };
        let supervisor = Supervisor::new(
            tool.clone(),
            process.clone(),
            Fingerprinter::new(["exe", "dll"]),
            notifier,
            LaunchSpec::from_args(vec![String::from("-batchmode")]),
            settings,
        );

        Self {
            temp,
            tool,
            process,
            sink,
            supervisor,
        }
    }

    fn install_dir(&self) -> std::path::PathBuf {
        self.temp.path().join("server")
    }

    fn staging_dir(&self) -> std::path::PathBuf {
        self.temp.path().join("staging")
    }
}

// =========================================================================
// Bootstrapping
// =========================================================================

#[tokio::test]
async fn given_working_updater_when_bootstrap_then_installed_and_fingerprinted() {
    // Given
    let h = Harness::new(FakeUpdateTool::always(build(b"v1")), FakeProcess::stopped());

    // When
    let state = h.supervisor.bootstrap().await.unwrap();

    // Then
    let expected = Fingerprinter::new(["exe", "dll"])
        .fingerprint(&h.install_dir())
        .unwrap();
    assert_that!(state.installed_fingerprint(), eq(&expected));
    assert_that!(state.installed_fingerprint().artifact_count(), eq(2));
    assert!(!state.is_marked_for_reinstall());
    assert_that!(h.tool.targets(), eq(&vec![h.install_dir()]));
}

#[tokio::test]
async fn given_running_server_when_bootstrap_then_killed_first() {
    // Given
    let h = Harness::new(FakeUpdateTool::always(build(b"v1")), FakeProcess::running());

    // When
    h.supervisor.bootstrap().await.unwrap();

    // Then
    assert_that!(h.process.kill_count(), eq(1));
}

#[tokio::test]
async fn given_failing_updater_when_bootstrap_then_fatal() {
    // Given
    let h = Harness::new(FakeUpdateTool::always(ToolStep::Fail), FakeProcess::stopped());

    // When
    let result = h.supervisor.bootstrap().await;

    // Then
    assert!(result.as_ref().is_err_and(|e| e.is_fatal()));
}

// =========================================================================
// Polling
// =========================================================================

#[tokio::test]
async fn given_same_build_and_server_running_when_tick_then_nothing_changes() {
    // Given
    let h = Harness::new(FakeUpdateTool::always(build(b"v1")), FakeProcess::stopped());
    let mut state = h.supervisor.bootstrap().await.unwrap();
    h.process.set_running(true);
    let before = state.installed_fingerprint().clone();

    // When
    let delay = h.supervisor.tick(&mut state).await;

    // Then
    assert_that!(delay, ok(eq(&POLL)));
    assert_that!(state.installed_fingerprint(), eq(&before));
    assert_that!(h.tool.targets(), eq(&vec![h.install_dir(), h.staging_dir()]));
    assert_that!(h.process.start_count(), eq(0));
    assert_that!(h.process.kill_count(), eq(0));
    assert!(!h.staging_dir().exists());
}

#[tokio::test]
async fn given_server_not_running_when_tick_then_started() {
    // Given
    let h = Harness::new(FakeUpdateTool::always(build(b"v1")), FakeProcess::stopped());
    let mut state = h.supervisor.bootstrap().await.unwrap();

    // When
    let delay = h.supervisor.tick(&mut state).await;

    // Then
    assert_that!(delay, ok(eq(&POLL)));
    assert_that!(h.process.start_count(), eq(1));
    assert!(h.process.is_up());
}

#[tokio::test]
async fn given_new_build_when_tick_then_primary_reinstalled_with_new_fingerprint() {
    // Given
    let tool = FakeUpdateTool::scripted(vec![build(b"v1"), build(b"v2")]);
    let h = Harness::new(tool, FakeProcess::stopped());
    let mut state = h.supervisor.bootstrap().await.unwrap();
    h.process.set_running(true);
    let old = state.installed_fingerprint().clone();

    // When
    let delay = h.supervisor.tick(&mut state).await;

    // Then
    assert_that!(delay, ok(eq(&POLL)));
    assert_ne!(state.installed_fingerprint(), &old);
    assert_that!(
        h.tool.targets(),
        eq(&vec![h.install_dir(), h.staging_dir(), h.install_dir()])
    );
    // Killed before the update, restarted in the same tick
    assert_that!(h.process.kill_count(), eq(1));
    assert_that!(h.process.start_count(), eq(1));
    assert!(h.sink.has_message(NotificationLevel::Info, "Update available"));
}

#[tokio::test]
async fn given_update_applied_when_next_tick_then_no_further_update() {
    // Given
    let tool = FakeUpdateTool::scripted(vec![build(b"v1"), build(b"v2")]);
    let h = Harness::new(tool, FakeProcess::running());
    let mut state = h.supervisor.bootstrap().await.unwrap();
    h.supervisor.tick(&mut state).await.unwrap();
    let runs_after_update = h.tool.run_count();

    // When
    h.supervisor.tick(&mut state).await.unwrap();

    // Then: only the staging probe ran
    assert_that!(h.tool.run_count(), eq(runs_after_update + 1));
}

#[tokio::test]
async fn given_staging_probe_fails_when_tick_then_no_update_and_loop_continues() {
    // Given
    let tool = FakeUpdateTool::scripted(vec![build(b"v1"), ToolStep::Fail]);
    let h = Harness::new(tool, FakeProcess::running());
    let mut state = h.supervisor.bootstrap().await.unwrap();
    let before = state.installed_fingerprint().clone();

    // When
    let delay = h.supervisor.tick(&mut state).await;

    // Then
    assert_that!(delay, ok(eq(&POLL)));
    assert_that!(state.installed_fingerprint(), eq(&before));
    assert!(h.sink.has_message(NotificationLevel::Error, "Update check failed"));
    assert!(h.install_dir().join("BattleBit.exe").is_file());
}

#[tokio::test]
async fn given_update_install_fails_when_tick_then_fatal() {
    // Given
    let tool = FakeUpdateTool::scripted(vec![build(b"v1"), build(b"v2"), ToolStep::Fail]);
    let h = Harness::new(tool, FakeProcess::running());
    let mut state = h.supervisor.bootstrap().await.unwrap();

    // When
    let result = h.supervisor.tick(&mut state).await;

    // Then
    assert!(result.as_ref().is_err_and(|e| e.is_fatal()));
}

// =========================================================================
// Escalation
// =========================================================================

#[tokio::test]
async fn given_start_fails_when_tick_then_marked_and_backoff_returned() {
    // Given
    let process = FakeProcess::stopped().with_start_results(vec![false]);
    let h = Harness::new(FakeUpdateTool::always(build(b"v1")), process);
    let mut state = h.supervisor.bootstrap().await.unwrap();

    // When
    let delay = h.supervisor.tick(&mut state).await;

    // Then
    assert_that!(delay, ok(eq(&BACKOFF)));
    assert!(state.is_marked_for_reinstall());
    assert_that!(state.consecutive_start_failures(), eq(1));
    assert!(h.sink.has_message(NotificationLevel::Error, "Failed to start"));
}

#[tokio::test]
async fn given_marked_for_reinstall_when_tick_then_reinstalls_without_probe_and_clears_mark() {
    // Given
    let process = FakeProcess::stopped().with_start_results(vec![false]);
    let h = Harness::new(FakeUpdateTool::always(build(b"v1")), process);
    let mut state = h.supervisor.bootstrap().await.unwrap();
    h.supervisor.tick(&mut state).await.unwrap();
    let runs_before = h.tool.targets().len();

    // When
    let delay = h.supervisor.tick(&mut state).await;

    // Then
    assert_that!(delay, ok(eq(&POLL)));
    assert!(!state.is_marked_for_reinstall());
    let targets = h.tool.targets();
    assert_that!(targets.len(), eq(runs_before + 1));
    assert_that!(targets.last(), eq(Some(&h.install_dir())));
    assert_that!(h.process.start_count(), eq(2));
    assert!(h.process.is_up());
    assert!(h.sink.has_message(NotificationLevel::Alert, "Reinstalling"));
}

#[tokio::test]
async fn given_repeated_start_failures_when_ticks_then_each_tick_reinstalls() {
    // Given
    let process = FakeProcess::stopped().with_start_results(vec![false, false, false]);
    let h = Harness::new(FakeUpdateTool::always(build(b"v1")), process);
    let mut state = h.supervisor.bootstrap().await.unwrap();

    // When
    let first = h.supervisor.tick(&mut state).await.unwrap();
    let second = h.supervisor.tick(&mut state).await.unwrap();
    let third = h.supervisor.tick(&mut state).await.unwrap();

    // Then: a failed start after a reinstall marks again
    assert_that!(first, eq(BACKOFF));
    assert_that!(second, eq(BACKOFF));
    assert_that!(third, eq(BACKOFF));
    assert_that!(state.consecutive_start_failures(), eq(1));
    assert_that!(h.process.start_count(), eq(3));
}

#[tokio::test]
async fn given_reinstall_fails_when_tick_then_fatal() {
    // Given
    let tool = FakeUpdateTool::scripted(vec![build(b"v1"), build(b"v1"), ToolStep::Fail]);
    let process = FakeProcess::stopped().with_start_results(vec![false]);
    let h = Harness::new(tool, process);
    let mut state = h.supervisor.bootstrap().await.unwrap();
    h.supervisor.tick(&mut state).await.unwrap();

    // When
    let result = h.supervisor.tick(&mut state).await;

    // Then
    assert!(result.as_ref().is_err_and(|e| e.is_fatal()));
}

#[tokio::test]
async fn given_steady_state_when_tick_again_then_no_phase_change_published() {
    // Given
    let h = Harness::new(FakeUpdateTool::always(build(b"v1")), FakeProcess::running());
    let mut state = h.supervisor.bootstrap().await.unwrap();
    h.supervisor.tick(&mut state).await.unwrap();
    let phases = h.supervisor.subscribe();

    // When
    h.supervisor.tick(&mut state).await.unwrap();

    // Then
    assert_that!(phases.has_changed(), ok(eq(&false)));
    assert_that!(h.supervisor.phase(), eq(&SupervisorPhase::Polling));
}

#[tokio::test]
async fn given_stopped_server_when_tick_then_starting_phase_published() {
    // Given
    let h = Harness::new(FakeUpdateTool::always(build(b"v1")), FakeProcess::running());
    let mut state = h.supervisor.bootstrap().await.unwrap();
    h.supervisor.tick(&mut state).await.unwrap();
    let phases = h.supervisor.subscribe();
    h.process.set_running(false);

    // When
    h.supervisor.tick(&mut state).await.unwrap();

    // Then
    assert_that!(phases.has_changed(), ok(eq(&true)));
    assert_that!(h.process.start_count(), eq(2));
}

// =========================================================================
// Run / stop
// =========================================================================

#[tokio::test]
async fn given_stop_requested_before_first_tick_when_run_then_kills_and_stops() {
    // Given
    let h = Harness::new(FakeUpdateTool::always(build(b"v1")), FakeProcess::running());
    let coordinator = ShutdownCoordinator::new();
    let guard = coordinator.subscribe_guard();
    let phases = h.supervisor.subscribe();
    coordinator.shutdown();

    // When
    let result = h.supervisor.run(guard).await;

    // Then
    assert_that!(result, ok(anything()));
    assert_that!(phases.borrow().clone(), eq(&SupervisorPhase::Stopped));
    assert_that!(h.process.start_count(), eq(0));
    assert!(!h.process.is_up());
    assert!(h.sink.has_message(NotificationLevel::Info, "-------- Starting GSS --------"));
    assert!(h.sink.has_message(NotificationLevel::Info, "-------- Stopping GSS --------"));
}

#[tokio::test]
async fn given_stop_requested_while_sleeping_when_run_then_returns_promptly() {
    // Given
    let h = Harness::with_poll(
        FakeUpdateTool::always(build(b"v1")),
        FakeProcess::stopped(),
        Duration::from_secs(3600),
    );
    let coordinator = ShutdownCoordinator::new();
    let guard = coordinator.subscribe_guard();
    let trigger = coordinator.clone();
    let process = h.process.clone();
    tokio::spawn(async move {
        // Stop once the first tick has started the server
        while process.start_count() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        trigger.shutdown();
    });

    // When
    let result = tokio::time::timeout(Duration::from_secs(5), h.supervisor.run(guard)).await;

    // Then
    assert_that!(result, ok(ok(anything())));
    assert_that!(h.process.start_count(), eq(1));
    assert_that!(h.process.kill_count(), eq(1));
    assert!(!h.process.is_up());
}

#[tokio::test]
async fn given_bootstrap_fails_when_run_then_fatal_reported_and_failed_phase() {
    // Given
    let h = Harness::new(FakeUpdateTool::always(ToolStep::Fail), FakeProcess::running());
    let coordinator = ShutdownCoordinator::new();

    // When
    let result = h.supervisor.run(coordinator.subscribe_guard()).await;

    // Then
    assert_that!(result, err(anything()));
    assert!(matches!(h.supervisor.phase(), SupervisorPhase::Failed { .. }));
    assert_that!(h.sink.messages_at(NotificationLevel::Fatal).len(), eq(1));
    // Fatal exits leave the server alone apart from the pre-install kill
    assert_that!(h.process.kill_count(), eq(1));
}
