//! Domain-level errors
//! These represent lifecycle rule violations and fallible external operations

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum DomainError {
    // Lifecycle errors
    #[error("core is already running")]
    AlreadyRunning,

    #[error("core is not running")]
    NotRunning,

    #[error("failed to launch core: {0}")]
    LaunchFailed(String),

    #[error("failed to stop core: {0}")]
    StopFailed(String),

    // Fallible sub-operations of start/restart
    #[error("failed to write core config: {0}")]
    ConfigWriteFailed(String),

    #[error("failed to query core version: {0}")]
    VersionQueryFailed(String),

    // Probe errors are swallowed by the chain; the variant exists so a probe
    // can distinguish "could not ask" from "asked and the core is down"
    #[error("liveness probe '{probe}' failed: {cause}")]
    ProbeFailed { probe: String, cause: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;
