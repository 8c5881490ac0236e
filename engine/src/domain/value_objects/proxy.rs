//! Proxy credential shapes

use serde::{Deserialize, Serialize};

/// Protocol credential for one provisioned proxy.
///
/// A closed set of variants: exactly one credential shape per proxy value is
/// enforced by construction, not by convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "protocol", rename_all = "snake_case")]
pub enum Proxy {
    Vmess { id: String },
    Vless { id: String, flow: String },
    Trojan { password: String },
    Shadowsocks { method: String, password: String },
}

impl Proxy {
    /// Protocol label, used for logging and sync messages.
    pub fn protocol(&self) -> &'static str {
        match self {
            Proxy::Vmess { .. } => "vmess",
            Proxy::Vless { .. } => "vless",
            Proxy::Trojan { .. } => "trojan",
            Proxy::Shadowsocks { .. } => "shadowsocks",
        }
    }
}
