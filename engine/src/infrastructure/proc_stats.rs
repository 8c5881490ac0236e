//! Host resource introspection via /proc
//!
//! Memory and network totals come from `/proc/meminfo` and `/proc/net/dev`.
//! CPU usage stays at 0.0: a usage rate needs two samples over time and
//! snapshots are computed fresh with no state kept between calls. Hosts
//! without `/proc` fall back to zeros for those fields.

use crate::domain::ports::SystemStatsReader;
use crate::domain::value_objects::SystemSnapshot;

pub struct ProcSystemReader;

impl ProcSystemReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProcSystemReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemStatsReader for ProcSystemReader {
    fn snapshot(&self) -> SystemSnapshot {
        let cpu_cores = std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(0);
        let (mem_total_bytes, mem_used_bytes) = read_meminfo().unwrap_or((0, 0));
        let mem_usage_pct = if mem_total_bytes > 0 {
            mem_used_bytes as f64 / mem_total_bytes as f64 * 100.0
        } else {
            0.0
        };
        let (net_rx_bytes, net_tx_bytes) = read_net_dev().unwrap_or((0, 0));

        SystemSnapshot {
            cpu_cores,
            cpu_usage_pct: 0.0,
            mem_total_bytes,
            mem_used_bytes,
            mem_usage_pct,
            net_rx_bytes,
            net_tx_bytes,
        }
    }
}

#[cfg(target_os = "linux")]
fn read_meminfo() -> Option<(u64, u64)> {
    parse_meminfo(&std::fs::read_to_string("/proc/meminfo").ok()?)
}

#[cfg(not(target_os = "linux"))]
fn read_meminfo() -> Option<(u64, u64)> {
    None
}

#[cfg(target_os = "linux")]
fn read_net_dev() -> Option<(u64, u64)> {
    parse_net_dev(&std::fs::read_to_string("/proc/net/dev").ok()?)
}

#[cfg(not(target_os = "linux"))]
fn read_net_dev() -> Option<(u64, u64)> {
    None
}

/// Returns (total, used) in bytes. Used is total minus `MemAvailable`,
/// the kernel's estimate of memory available without swapping.
fn parse_meminfo(content: &str) -> Option<(u64, u64)> {
    let mut total_kb = None;
    let mut available_kb = None;

    for line in content.lines() {
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("MemTotal:") => total_kb = fields.next().and_then(|v| v.parse::<u64>().ok()),
            Some("MemAvailable:") => {
                available_kb = fields.next().and_then(|v| v.parse::<u64>().ok())
            }
            _ => {}
        }
    }

    let total = total_kb? * 1024;
    let available = available_kb? * 1024;
    Some((total, total.saturating_sub(available)))
}

/// Returns (rx, tx) byte totals summed over non-loopback interfaces.
fn parse_net_dev(content: &str) -> Option<(u64, u64)> {
    let mut rx_total: u64 = 0;
    let mut tx_total: u64 = 0;
    let mut saw_interface = false;

    // Header is two lines; each interface line is "iface: rx_bytes ... [8
    // rx fields] tx_bytes ...".
    for line in content.lines().skip(2) {
        let (iface, counters) = match line.split_once(':') {
            Some(parts) => parts,
            None => continue,
        };
        if iface.trim() == "lo" {
            continue;
        }

        let fields: Vec<&str> = counters.split_whitespace().collect();
        if fields.len() < 9 {
            continue;
        }
        let rx = fields[0].parse::<u64>().ok()?;
        let tx = fields[8].parse::<u64>().ok()?;
        rx_total = rx_total.saturating_add(rx);
        tx_total = tx_total.saturating_add(tx);
        saw_interface = true;
    }

    saw_interface.then_some((rx_total, tx_total))
}
