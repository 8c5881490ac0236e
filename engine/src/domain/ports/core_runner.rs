//! CoreRunner port
//! Interface for launching and signalling the supervised core process

use crate::domain::Result;
use async_trait::async_trait;
use std::path::Path;

/// Port for executing the supervised core.
///
/// One implementation drives a real OS process; test doubles script the
/// outcomes. The supervisor only ever tracks the returned pid, so an
/// implementation must accept a later `kill` for any pid it handed out.
#[async_trait]
pub trait CoreRunner: Send + Sync {
    /// Launch the core against the persisted config file and return its pid.
    async fn spawn(&self, config_path: &Path) -> Result<u32>;

    /// Deliver a termination signal to a previously spawned core.
    async fn kill(&self, pid: u32) -> Result<()>;

    /// Ask the core executable for its self-reported version string.
    async fn version(&self) -> Result<String>;
}
