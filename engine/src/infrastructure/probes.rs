//! Host liveness probes
//! Implementations of the LivenessProbe port that query the service manager
//! and the process table

use crate::domain::ports::LivenessProbe;
use crate::domain::{DomainError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

/// Service-manager unit names checked before falling back to the process
/// table. The legacy unit covers nodes provisioned by earlier deployments.
pub const PRIMARY_SERVICE_UNIT: &str = "proxy-node";
pub const LEGACY_SERVICE_UNIT: &str = "proxy-panel";

async fn run_check(name: &str, command: &Path, args: &[&str]) -> Result<bool> {
    let status = Command::new(command)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|e| DomainError::ProbeFailed {
            probe: name.to_string(),
            cause: e.to_string(),
        })?;
    Ok(status.success())
}

/// Asks the service manager whether a unit is active
/// (`systemctl is-active --quiet <unit>`).
pub struct ServiceActiveProbe {
    name: String,
    command: PathBuf,
    unit: String,
}

impl ServiceActiveProbe {
    pub fn new(unit: impl Into<String>) -> Self {
        let unit = unit.into();
        Self {
            name: format!("service:{unit}"),
            command: PathBuf::from("systemctl"),
            unit,
        }
    }

    /// Substitute the service-manager binary, for tests.
    pub fn with_command(mut self, command: impl Into<PathBuf>) -> Self {
        self.command = command.into();
        self
    }
}

#[async_trait]
impl LivenessProbe for ServiceActiveProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<bool> {
        run_check(
            &self.name,
            &self.command,
            &["is-active", "--quiet", &self.unit],
        )
        .await
    }
}

/// Process-table lookup by executable name (`pidof <process>`).
pub struct PidofProbe {
    name: String,
    command: PathBuf,
    process: String,
}

impl PidofProbe {
    pub fn new(process: impl Into<String>) -> Self {
        let process = process.into();
        Self {
            name: format!("pidof:{process}"),
            command: PathBuf::from("pidof"),
            process,
        }
    }

    pub fn with_command(mut self, command: impl Into<PathBuf>) -> Self {
        self.command = command.into();
        self
    }
}

#[async_trait]
impl LivenessProbe for PidofProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<bool> {
        run_check(&self.name, &self.command, &[&self.process]).await
    }
}

/// Process-table lookup with exact name matching (`pgrep -x <process>`).
pub struct PgrepProbe {
    name: String,
    command: PathBuf,
    process: String,
}

impl PgrepProbe {
    pub fn new(process: impl Into<String>) -> Self {
        let process = process.into();
        Self {
            name: format!("pgrep:{process}"),
            command: PathBuf::from("pgrep"),
            process,
        }
    }

    pub fn with_command(mut self, command: impl Into<PathBuf>) -> Self {
        self.command = command.into();
        self
    }
}

#[async_trait]
impl LivenessProbe for PgrepProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<bool> {
        run_check(&self.name, &self.command, &["-x", &self.process]).await
    }
}

/// The fixed-priority probe chain: service manager first (cheapest and most
/// authoritative on managed hosts), then the raw process-table scans named
/// after the core executable.
pub fn default_probe_chain(core_executable: &Path) -> Vec<Arc<dyn LivenessProbe>> {
    let process = core_executable
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "proxy-core".to_string());

    vec![
        Arc::new(ServiceActiveProbe::new(PRIMARY_SERVICE_UNIT)),
        Arc::new(ServiceActiveProbe::new(LEGACY_SERVICE_UNIT)),
        Arc::new(PidofProbe::new(process.clone())),
        Arc::new(PgrepProbe::new(process)),
    ]
}
