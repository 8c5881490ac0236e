//! Traffic counter ledger and system snapshot access
//!
//! Independent of the supervisor: its counter map is guarded by its own
//! lock, so traffic reports never contend with lifecycle operations.

use crate::domain::ports::SystemStatsReader;
use crate::domain::value_objects::{SystemSnapshot, TrafficStats};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    bytes_up: u64,
    bytes_down: u64,
}

/// Per-identity traffic counters plus host snapshot delegation.
pub struct StatsCollector {
    counters: RwLock<HashMap<String, Counters>>,
    system: Arc<dyn SystemStatsReader>,
}

impl StatsCollector {
    pub fn new(system: Arc<dyn SystemStatsReader>) -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            system,
        }
    }

    /// Add a traffic report to the running totals for `identity`, creating
    /// a zeroed entry on first sight.
    pub fn record_traffic(&self, identity: &str, bytes_up: u64, bytes_down: u64) {
        let mut counters = self.counters.write().unwrap();
        let entry = counters.entry(identity.to_string()).or_default();
        entry.bytes_up = entry.bytes_up.saturating_add(bytes_up);
        entry.bytes_down = entry.bytes_down.saturating_add(bytes_down);
    }

    /// Copy out the current totals for `identity`.
    ///
    /// An unknown identity yields zeros and creates nothing. With `reset`
    /// the live entry is zeroed after the copy, so the returned value always
    /// reflects pre-reset totals.
    pub fn user_stats(&self, identity: &str, reset: bool) -> TrafficStats {
        if !reset {
            let counters = self.counters.read().unwrap();
            return match counters.get(identity) {
                Some(entry) => TrafficStats {
                    identity: identity.to_string(),
                    bytes_up: entry.bytes_up,
                    bytes_down: entry.bytes_down,
                },
                None => TrafficStats::zero(identity),
            };
        }

        let mut counters = self.counters.write().unwrap();
        match counters.get_mut(identity) {
            Some(entry) => {
                let copy = TrafficStats {
                    identity: identity.to_string(),
                    bytes_up: entry.bytes_up,
                    bytes_down: entry.bytes_down,
                };
                entry.bytes_up = 0;
                entry.bytes_down = 0;
                debug!(identity, "traffic counters reset");
                copy
            }
            None => TrafficStats::zero(identity),
        }
    }

    /// Fresh host snapshot; nothing is cached between calls.
    pub fn system_stats(&self) -> SystemSnapshot {
        self.system.snapshot()
    }
}
