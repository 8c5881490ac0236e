//! Mock port implementations for testing
//! Scriptable runner and probe doubles used by unit and integration tests

use crate::domain::{DomainError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{CoreRunner, LivenessProbe};

/// Recording mock runner.
///
/// Hands out sequential pids, records every spawn/kill, and can be scripted
/// to fail any operation. A spawn delay widens the start critical section so
/// concurrency tests can force overlap.
#[derive(Clone)]
pub struct MockCoreRunner {
    next_pid: Arc<AtomicU32>,
    spawn_calls: Arc<AtomicUsize>,
    killed: Arc<Mutex<Vec<u32>>>,
    spawned_configs: Arc<Mutex<Vec<PathBuf>>>,
    fail_spawn: Arc<AtomicBool>,
    fail_kill: Arc<AtomicBool>,
    version: Arc<Mutex<Option<String>>>,
    spawn_delay: Arc<Mutex<Duration>>,
}

impl MockCoreRunner {
    pub fn new() -> Self {
        Self {
            next_pid: Arc::new(AtomicU32::new(1000)),
            spawn_calls: Arc::new(AtomicUsize::new(0)),
            killed: Arc::new(Mutex::new(Vec::new())),
            spawned_configs: Arc::new(Mutex::new(Vec::new())),
            fail_spawn: Arc::new(AtomicBool::new(false)),
            fail_kill: Arc::new(AtomicBool::new(false)),
            version: Arc::new(Mutex::new(Some("core 0.0.0-mock".to_string()))),
            spawn_delay: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn fail_spawn(&self, fail: bool) {
        self.fail_spawn.store(fail, Ordering::SeqCst);
    }

    pub fn fail_kill(&self, fail: bool) {
        self.fail_kill.store(fail, Ordering::SeqCst);
    }

    /// `None` makes `version` fail with `VersionQueryFailed`.
    pub fn set_version(&self, version: Option<&str>) {
        *self.version.lock().unwrap() = version.map(|v| v.to_string());
    }

    pub fn set_spawn_delay(&self, delay: Duration) {
        *self.spawn_delay.lock().unwrap() = delay;
    }

    pub fn spawn_count(&self) -> usize {
        self.spawn_calls.load(Ordering::SeqCst)
    }

    pub fn killed_pids(&self) -> Vec<u32> {
        self.killed.lock().unwrap().clone()
    }

    pub fn spawned_configs(&self) -> Vec<PathBuf> {
        self.spawned_configs.lock().unwrap().clone()
    }
}

impl Default for MockCoreRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CoreRunner for MockCoreRunner {
    async fn spawn(&self, config_path: &Path) -> Result<u32> {
        let delay = *self.spawn_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.fail_spawn.load(Ordering::SeqCst) {
            return Err(DomainError::LaunchFailed(
                "injected spawn failure".to_string(),
            ));
        }

        self.spawn_calls.fetch_add(1, Ordering::SeqCst);
        self.spawned_configs
            .lock()
            .unwrap()
            .push(config_path.to_path_buf());
        Ok(self.next_pid.fetch_add(1, Ordering::SeqCst))
    }

    async fn kill(&self, pid: u32) -> Result<()> {
        if self.fail_kill.load(Ordering::SeqCst) {
            return Err(DomainError::StopFailed("injected kill failure".to_string()));
        }

        self.killed.lock().unwrap().push(pid);
        Ok(())
    }

    async fn version(&self) -> Result<String> {
        self.version
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| DomainError::VersionQueryFailed("injected version failure".to_string()))
    }
}

/// Probe outcome scripted at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeOutcome {
    Up,
    Down,
    Error,
}

/// Probe double with a fixed outcome. Counts how often it was asked so
/// chain-ordering tests can assert short-circuiting.
pub struct StaticProbe {
    name: String,
    outcome: ProbeOutcome,
    checks: AtomicUsize,
}

impl StaticProbe {
    pub fn up(name: impl Into<String>) -> Self {
        Self::with_outcome(name, ProbeOutcome::Up)
    }

    pub fn down(name: impl Into<String>) -> Self {
        Self::with_outcome(name, ProbeOutcome::Down)
    }

    pub fn failing(name: impl Into<String>) -> Self {
        Self::with_outcome(name, ProbeOutcome::Error)
    }

    fn with_outcome(name: impl Into<String>, outcome: ProbeOutcome) -> Self {
        Self {
            name: name.into(),
            outcome,
            checks: AtomicUsize::new(0),
        }
    }

    pub fn check_count(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LivenessProbe for StaticProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<bool> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            ProbeOutcome::Up => Ok(true),
            ProbeOutcome::Down => Ok(false),
            ProbeOutcome::Error => Err(DomainError::ProbeFailed {
                probe: self.name.clone(),
                cause: "injected probe failure".to_string(),
            }),
        }
    }
}
