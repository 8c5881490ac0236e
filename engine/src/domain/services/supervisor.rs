//! Core supervisor
//!
//! Owns the lifecycle state of the supervised core process and the
//! authoritative user directory. All mutation serializes on one write lock;
//! pure reads share a read lock. Liveness probes run under the read lock so
//! they can never observe a half-committed start or stop.

use crate::domain::entities::{BackendSpec, User};
use crate::domain::error::{DomainError, Result};
use crate::domain::ports::{CoreRunner, LivenessProbe};
use crate::domain::services::UserDirectory;
use crate::domain::value_objects::CoreStatus;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Lock-guarded supervisor state.
///
/// `running` is a hint, not ground truth: when it is false, liveness is
/// recomputed from the probe chain on every query. Each mutating operation
/// commits its new state in a single step, only after every fallible
/// sub-operation has succeeded.
#[derive(Default)]
struct SupervisorState {
    /// Pid of the tracked core process, if this agent instance spawned one.
    handle: Option<u32>,
    running: bool,
    started_at: Option<Instant>,
    last_config: String,
    users: UserDirectory,
}

/// Supervises the single external core process.
pub struct CoreSupervisor {
    runner: Arc<dyn CoreRunner>,
    probes: Vec<Arc<dyn LivenessProbe>>,
    config_path: PathBuf,
    state: RwLock<SupervisorState>,
}

impl CoreSupervisor {
    pub fn new(
        runner: Arc<dyn CoreRunner>,
        probes: Vec<Arc<dyn LivenessProbe>>,
        config_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            probes,
            config_path: config_path.into(),
            state: RwLock::new(SupervisorState::default()),
        }
    }

    /// Start the core with the given backend spec.
    ///
    /// Fails with `AlreadyRunning` when ground-truth liveness (flag, then
    /// probe chain, evaluated inside the critical section) reports the core
    /// up. The config file write and the spawn happen before any state is
    /// committed, so a failed start leaves the supervisor untouched.
    pub async fn start(&self, spec: BackendSpec) -> Result<CoreStatus> {
        let mut state = self.state.write().await;

        if state.running || self.probe_chain().await {
            return Err(DomainError::AlreadyRunning);
        }

        self.launch(&mut state, spec).await
    }

    /// Stop the tracked core process.
    ///
    /// Fails with `NotRunning` when no handle is tracked. A failed kill
    /// surfaces `StopFailed` and leaves the running flag untouched: the
    /// state must not claim "stopped" while the process may still be alive.
    pub async fn stop(&self) -> Result<()> {
        let mut state = self.state.write().await;
        self.halt(&mut state).await
    }

    /// Stop (ignoring `NotRunning`) and start again with a new spec, as one
    /// critical section: no other start/stop can interleave.
    pub async fn restart(&self, spec: BackendSpec) -> Result<CoreStatus> {
        let mut state = self.state.write().await;

        match self.halt(&mut state).await {
            Ok(()) => {}
            Err(DomainError::NotRunning) => debug!("restart requested while stopped"),
            Err(e) => return Err(e),
        }

        // No liveness gate here: probes may still see the process we just
        // signalled on its way down.
        self.launch(&mut state, spec).await
    }

    /// Ground-truth liveness.
    ///
    /// True immediately when the internal flag is set; otherwise the probe
    /// chain runs in fixed priority order, short-circuiting on the first
    /// probe that reports the core up. A successful probe does not set the
    /// flag: ground truth is recomputed on every call while the flag is
    /// false, so the flag can never lie in the "probed up but marked down"
    /// direction.
    pub async fn is_running(&self) -> bool {
        let state = self.state.read().await;
        if state.running {
            return true;
        }
        self.probe_chain().await
    }

    /// Whole seconds since the last successful start, 0 while stopped.
    /// Computed from locked state, not from a live probe.
    pub async fn uptime(&self) -> i64 {
        let state = self.state.read().await;
        if !state.running {
            return 0;
        }
        state
            .started_at
            .map(|t| t.elapsed().as_secs() as i64)
            .unwrap_or(0)
    }

    /// Self-reported version of the core executable.
    pub async fn version(&self) -> Result<String> {
        self.runner.version().await
    }

    /// Apply one user sync request to the authoritative directory.
    ///
    /// Mutates only the in-memory list; changes are not pushed into an
    /// already-running core and take effect there on the next restart.
    pub async fn sync_user(&self, user: User) -> Result<()> {
        let mut state = self.state.write().await;
        let removal = user.is_removal();
        let identity = user.identity.clone();
        state.users.apply(user);
        debug!(
            identity = %identity,
            removal,
            total_users = state.users.len(),
            "user sync applied"
        );
        Ok(())
    }

    /// Replace the authoritative user list wholesale. Same non-propagation
    /// caveat as [`sync_user`](Self::sync_user).
    pub async fn sync_users(&self, users: Vec<User>) -> Result<()> {
        let mut state = self.state.write().await;
        state.users.replace(users);
        debug!(total_users = state.users.len(), "user list replaced");
        Ok(())
    }

    /// Copy of the authoritative user list.
    pub async fn users(&self) -> Vec<User> {
        self.state.read().await.users.to_vec()
    }

    /// Config text committed by the last successful start/restart.
    pub async fn last_config(&self) -> String {
        self.state.read().await.last_config.clone()
    }

    /// Snapshot of the committed state.
    pub async fn status(&self) -> CoreStatus {
        let state = self.state.read().await;
        CoreStatus {
            running: state.running,
            pid: state.handle,
            uptime_secs: match (state.running, state.started_at) {
                (true, Some(t)) => t.elapsed().as_secs() as i64,
                _ => 0,
            },
        }
    }

    /// Persist the config, spawn the core, and commit the new state.
    /// Caller holds the write lock.
    async fn launch(&self, state: &mut SupervisorState, spec: BackendSpec) -> Result<CoreStatus> {
        tokio::fs::write(&self.config_path, spec.raw_config.as_bytes())
            .await
            .map_err(|e| DomainError::ConfigWriteFailed(e.to_string()))?;

        let pid = self.runner.spawn(&self.config_path).await?;

        state.handle = Some(pid);
        state.running = true;
        state.started_at = Some(Instant::now());
        state.last_config = spec.raw_config;
        state.users.replace(spec.users);

        info!(pid, kind = %spec.kind, users = state.users.len(), "core started");
        Ok(CoreStatus {
            running: true,
            pid: Some(pid),
            uptime_secs: 0,
        })
    }

    /// Signal the tracked core and commit the stopped state.
    /// Caller holds the write lock.
    async fn halt(&self, state: &mut SupervisorState) -> Result<()> {
        let pid = state.handle.ok_or(DomainError::NotRunning)?;

        self.runner.kill(pid).await?;

        state.running = false;
        state.handle = None;
        state.started_at = None;
        info!(pid, "core stopped");
        Ok(())
    }

    /// Walk the probe chain in priority order. Probe failures are swallowed:
    /// each failure only advances to the next probe, and only exhaustion of
    /// the whole chain yields "not running".
    async fn probe_chain(&self) -> bool {
        for probe in &self.probes {
            match probe.check().await {
                Ok(true) => {
                    debug!(probe = probe.name(), "liveness probe reports the core up");
                    return true;
                }
                Ok(false) => {
                    debug!(probe = probe.name(), "liveness probe reports the core down");
                }
                Err(e) => {
                    warn!(probe = probe.name(), error = %e, "liveness probe could not run");
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockCoreRunner, StaticProbe};
    use crate::domain::value_objects::Proxy;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        supervisor: Arc<CoreSupervisor>,
        runner: MockCoreRunner,
        _dir: TempDir,
    }

    fn fixture_with_probes(probes: Vec<Arc<dyn LivenessProbe>>) -> Fixture {
        let dir = TempDir::new().unwrap();
        let runner = MockCoreRunner::new();
        let supervisor = Arc::new(CoreSupervisor::new(
            Arc::new(runner.clone()),
            probes,
            dir.path().join("core_config.json"),
        ));
        Fixture {
            supervisor,
            runner,
            _dir: dir,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_probes(vec![Arc::new(StaticProbe::down("down"))])
    }

    fn spec(config: &str) -> BackendSpec {
        BackendSpec::config_only("proxy-core", config)
    }

    #[tokio::test]
    async fn test_start_commits_state_and_persists_config() {
        let f = fixture();

        let status = f.supervisor.start(spec(r#"{"inbounds":[]}"#)).await.unwrap();

        assert!(status.running);
        assert!(status.pid.is_some());
        assert!(f.supervisor.is_running().await);
        assert_eq!(f.runner.spawn_count(), 1);

        let config_path = f.runner.spawned_configs().pop().unwrap();
        let written = std::fs::read_to_string(config_path).unwrap();
        assert_eq!(written, r#"{"inbounds":[]}"#);
    }

    #[tokio::test]
    async fn test_start_replaces_user_list() {
        let f = fixture();
        f.supervisor
            .sync_user(User::new("old@x").with_inbound_tags(vec!["in1".to_string()]))
            .await
            .unwrap();

        let mut backend = spec("{}");
        backend.users = vec![
            User::new("a@x").with_inbound_tags(vec!["in1".to_string()]),
            User::new("a@x").with_inbound_tags(vec!["in2".to_string()]),
        ];
        f.supervisor.start(backend).await.unwrap();

        let users = f.supervisor.users().await;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].identity, "a@x");
        assert_eq!(users[0].inbound_tags, vec!["in2"]);
    }

    #[tokio::test]
    async fn test_start_while_running_fails() {
        let f = fixture();
        f.supervisor.start(spec("{}")).await.unwrap();

        let err = f.supervisor.start(spec("{}")).await.unwrap_err();
        assert!(matches!(err, DomainError::AlreadyRunning));
        assert_eq!(f.runner.spawn_count(), 1);
    }

    #[tokio::test]
    async fn test_start_gated_by_probe_even_when_flag_is_false() {
        let f = fixture_with_probes(vec![Arc::new(StaticProbe::up("service"))]);

        let err = f.supervisor.start(spec("{}")).await.unwrap_err();
        assert!(matches!(err, DomainError::AlreadyRunning));
        assert_eq!(f.runner.spawn_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_starts_spawn_exactly_once() {
        let f = fixture();
        f.runner.set_spawn_delay(Duration::from_millis(50));

        let (first, second) = tokio::join!(
            f.supervisor.start(spec("{}")),
            f.supervisor.start(spec("{}"))
        );

        assert_eq!(
            first.is_ok() as u8 + second.is_ok() as u8,
            1,
            "exactly one start must win"
        );
        assert!(matches!(
            first.err().or(second.err()),
            Some(DomainError::AlreadyRunning)
        ));
        assert_eq!(f.runner.spawn_count(), 1);
    }

    #[tokio::test]
    async fn test_launch_failure_leaves_state_unchanged() {
        let f = fixture();
        f.runner.fail_spawn(true);

        let err = f.supervisor.start(spec("{}")).await.unwrap_err();
        assert!(matches!(err, DomainError::LaunchFailed(_)));

        assert!(!f.supervisor.is_running().await);
        assert_eq!(f.supervisor.uptime().await, 0);
        assert!(matches!(
            f.supervisor.stop().await.unwrap_err(),
            DomainError::NotRunning
        ));
    }

    #[tokio::test]
    async fn test_config_write_failure_prevents_spawn() {
        let runner = MockCoreRunner::new();
        let supervisor = CoreSupervisor::new(
            Arc::new(runner.clone()),
            vec![Arc::new(StaticProbe::down("down"))],
            "/nonexistent-dir/core_config.json",
        );

        let err = supervisor.start(spec("{}")).await.unwrap_err();
        assert!(matches!(err, DomainError::ConfigWriteFailed(_)));
        assert_eq!(runner.spawn_count(), 0);
    }

    #[tokio::test]
    async fn test_stop_without_handle_fails() {
        let f = fixture();

        let err = f.supervisor.stop().await.unwrap_err();
        assert!(matches!(err, DomainError::NotRunning));
    }

    #[tokio::test]
    async fn test_stop_kills_tracked_pid_and_clears_state() {
        let f = fixture();
        let status = f.supervisor.start(spec("{}")).await.unwrap();

        f.supervisor.stop().await.unwrap();

        assert_eq!(f.runner.killed_pids(), vec![status.pid.unwrap()]);
        assert!(!f.supervisor.is_running().await);
        assert_eq!(f.supervisor.uptime().await, 0);

        // Handle is gone, so a second stop reports NotRunning.
        assert!(matches!(
            f.supervisor.stop().await.unwrap_err(),
            DomainError::NotRunning
        ));
    }

    #[tokio::test]
    async fn test_failed_kill_keeps_running_flag() {
        let f = fixture();
        f.supervisor.start(spec("{}")).await.unwrap();
        f.runner.fail_kill(true);

        let err = f.supervisor.stop().await.unwrap_err();
        assert!(matches!(err, DomainError::StopFailed(_)));

        // Must not claim "stopped" while the process may still be alive.
        assert!(f.supervisor.is_running().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_uptime_tracks_start_and_stop() {
        let f = fixture();
        assert_eq!(f.supervisor.uptime().await, 0);

        f.supervisor.start(spec("{}")).await.unwrap();
        let first = f.supervisor.uptime().await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        let second = f.supervisor.uptime().await;
        assert!(second > first);
        assert_eq!(second, 2);

        f.supervisor.stop().await.unwrap();
        assert_eq!(f.supervisor.uptime().await, 0);
    }

    #[tokio::test]
    async fn test_restart_from_running_replaces_process() {
        let f = fixture();
        let old = f.supervisor.start(spec("old")).await.unwrap();

        let new = f.supervisor.restart(spec("new")).await.unwrap();

        assert_eq!(f.runner.killed_pids(), vec![old.pid.unwrap()]);
        assert_eq!(f.runner.spawn_count(), 2);
        assert_ne!(old.pid, new.pid);
        assert!(f.supervisor.is_running().await);
        assert_eq!(f.supervisor.last_config().await, "new");
    }

    #[tokio::test]
    async fn test_restart_from_stopped_just_starts() {
        let f = fixture();

        let status = f.supervisor.restart(spec("{}")).await.unwrap();

        assert!(status.running);
        assert!(f.runner.killed_pids().is_empty());
        assert_eq!(f.runner.spawn_count(), 1);
    }

    #[tokio::test]
    async fn test_restart_aborts_when_kill_fails() {
        let f = fixture();
        f.supervisor.start(spec("old")).await.unwrap();
        f.runner.fail_kill(true);

        let err = f.supervisor.restart(spec("new")).await.unwrap_err();
        assert!(matches!(err, DomainError::StopFailed(_)));
        assert_eq!(f.runner.spawn_count(), 1);
        assert!(f.supervisor.is_running().await);
    }

    #[tokio::test]
    async fn test_probe_chain_short_circuits_in_order() {
        let first = Arc::new(StaticProbe::down("first"));
        let second = Arc::new(StaticProbe::up("second"));
        let third = Arc::new(StaticProbe::up("third"));
        let f = fixture_with_probes(vec![first.clone(), second.clone(), third.clone()]);

        assert!(f.supervisor.is_running().await);
        assert_eq!(first.check_count(), 1);
        assert_eq!(second.check_count(), 1);
        assert_eq!(third.check_count(), 0);
    }

    #[tokio::test]
    async fn test_probe_failure_advances_chain() {
        let failing = Arc::new(StaticProbe::failing("broken"));
        let up = Arc::new(StaticProbe::up("up"));
        let f = fixture_with_probes(vec![failing.clone(), up.clone()]);

        assert!(f.supervisor.is_running().await);
        assert_eq!(failing.check_count(), 1);
        assert_eq!(up.check_count(), 1);
    }

    #[tokio::test]
    async fn test_all_probes_down_or_failing_means_not_running() {
        let f = fixture_with_probes(vec![
            Arc::new(StaticProbe::failing("broken")),
            Arc::new(StaticProbe::down("down")),
            Arc::new(StaticProbe::down("also-down")),
        ]);

        assert!(!f.supervisor.is_running().await);
    }

    #[tokio::test]
    async fn test_successful_probe_does_not_set_flag() {
        let probe = Arc::new(StaticProbe::up("service"));
        let f = fixture_with_probes(vec![probe.clone()]);

        assert!(f.supervisor.is_running().await);
        assert!(f.supervisor.is_running().await);

        // The flag stayed false, so ground truth was recomputed both times.
        assert_eq!(probe.check_count(), 2);
        // And uptime still reports stopped: probes never fabricate a start time.
        assert_eq!(f.supervisor.uptime().await, 0);
    }

    #[tokio::test]
    async fn test_running_flag_short_circuits_probes() {
        let probe = Arc::new(StaticProbe::up("service"));
        let f = fixture_with_probes(vec![probe.clone()]);
        // Bypass the probe gate for this one: force-start via restart.
        f.supervisor.restart(spec("{}")).await.unwrap();

        assert!(f.supervisor.is_running().await);
        assert_eq!(probe.check_count(), 0);
    }

    #[tokio::test]
    async fn test_sync_user_roundtrip_ends_empty() {
        let f = fixture();

        f.supervisor
            .sync_user(
                User::new("a@x")
                    .with_proxies(vec![Proxy::Vmess {
                        id: "id1".to_string(),
                    }])
                    .with_inbound_tags(vec!["in1".to_string()]),
            )
            .await
            .unwrap();
        assert_eq!(f.supervisor.users().await.len(), 1);

        f.supervisor.sync_user(User::new("a@x")).await.unwrap();
        assert!(f.supervisor.users().await.is_empty());
    }

    #[tokio::test]
    async fn test_version_delegates_to_runner() {
        let f = fixture();
        f.runner.set_version(Some("core 1.8.4"));
        assert_eq!(f.supervisor.version().await.unwrap(), "core 1.8.4");

        f.runner.set_version(None);
        assert!(matches!(
            f.supervisor.version().await.unwrap_err(),
            DomainError::VersionQueryFailed(_)
        ));
    }
}
