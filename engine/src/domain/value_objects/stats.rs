//! Traffic counters and system snapshot values

use serde::{Deserialize, Serialize};

/// Per-identity traffic totals. Returned by value: callers never see the
/// live counter entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficStats {
    pub identity: String,
    pub bytes_up: u64,
    pub bytes_down: u64,
}

impl TrafficStats {
    pub fn zero(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            bytes_up: 0,
            bytes_down: 0,
        }
    }
}

/// Point-in-time host resource snapshot. Computed fresh on every query;
/// never stored. CPU usage and network totals are best-effort and may be
/// zero where the host does not support measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub cpu_cores: u32,
    pub cpu_usage_pct: f64,
    pub mem_total_bytes: u64,
    pub mem_used_bytes: u64,
    pub mem_usage_pct: f64,
    pub net_rx_bytes: u64,
    pub net_tx_bytes: u64,
}
