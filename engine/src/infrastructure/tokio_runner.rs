//! Tokio core runner
//! Real implementation of the CoreRunner port using tokio::process

use crate::domain::ports::CoreRunner;
use crate::domain::{DomainError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Environment variable pointing the core at its asset directory.
pub const CORE_ASSET_ENV: &str = "CORE_LOCATION_ASSET";

/// Spawns and signals the real core process.
///
/// Children are tracked by pid so a later kill goes through the tokio
/// handle and reaps the process. A pid without a tracked child (the core
/// was started by a previous agent instance) is signalled directly.
pub struct TokioCoreRunner {
    executable: PathBuf,
    assets_dir: PathBuf,
    children: Mutex<HashMap<u32, Child>>,
}

impl TokioCoreRunner {
    pub fn new(executable: impl Into<PathBuf>, assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            assets_dir: assets_dir.into(),
            children: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CoreRunner for TokioCoreRunner {
    async fn spawn(&self, config_path: &Path) -> Result<u32> {
        let mut command = Command::new(&self.executable);
        command
            .arg("run")
            .arg("-config")
            .arg(config_path)
            .env(CORE_ASSET_ENV, &self.assets_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = command
            .spawn()
            .map_err(|e| DomainError::LaunchFailed(e.to_string()))?;
        let pid = child.id().ok_or_else(|| {
            DomainError::LaunchFailed("core exited before a pid could be observed".to_string())
        })?;

        self.children.lock().await.insert(pid, child);
        debug!(pid, executable = %self.executable.display(), "core process spawned");
        Ok(pid)
    }

    async fn kill(&self, pid: u32) -> Result<()> {
        let mut children = self.children.lock().await;
        if let Some(child) = children.get_mut(&pid) {
            child
                .kill()
                .await
                .map_err(|e| DomainError::StopFailed(e.to_string()))?;
            children.remove(&pid);
            debug!(pid, "core process killed and reaped");
            return Ok(());
        }
        drop(children);

        // Untracked pid: the core predates this agent instance.
        warn!(pid, "killing untracked core process");
        signal_kill(pid)
    }

    async fn version(&self) -> Result<String> {
        let output = Command::new(&self.executable)
            .arg("version")
            .output()
            .await
            .map_err(|e| DomainError::VersionQueryFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(DomainError::VersionQueryFailed(format!(
                "core exited with {}",
                output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(unix)]
fn signal_kill(pid: u32) -> Result<()> {
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGKILL) };
    if rc == 0 {
        Ok(())
    } else {
        Err(DomainError::StopFailed(
            std::io::Error::last_os_error().to_string(),
        ))
    }
}

#[cfg(not(unix))]
fn signal_kill(pid: u32) -> Result<()> {
    Err(DomainError::StopFailed(format!(
        "cannot signal untracked pid {pid} on this platform"
    )))
}
