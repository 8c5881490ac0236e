//! LivenessProbe port
//! Independent fallible checks for "is the core actually up"

use crate::domain::Result;
use async_trait::async_trait;

/// One external liveness check.
///
/// `Ok(true)` means the probe observed the core up; `Ok(false)` means the
/// probe ran and observed it down; `Err` means the probe itself could not
/// run. The supervisor iterates a fixed-priority chain of probes and treats
/// `Ok(false)` and `Err` identically: advance to the next probe. Probes are
/// read-only from the supervisor's perspective.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// Stable probe name for logging.
    fn name(&self) -> &str;

    async fn check(&self) -> Result<bool>;
}
