//! Committed supervisor state snapshot

/// Snapshot of the supervisor's committed state, returned by mutating
/// lifecycle operations so adapters can marshal the outcome without a
/// second call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreStatus {
    pub running: bool,
    pub pid: Option<u32>,
    pub uptime_secs: i64,
}

impl CoreStatus {
    pub fn stopped() -> Self {
        Self {
            running: false,
            pid: None,
            uptime_secs: 0,
        }
    }
}
