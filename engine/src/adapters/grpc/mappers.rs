//! Proto <-> domain conversions for the gRPC adapter

use crate::domain::{BackendSpec, DomainError, Proxy, SystemSnapshot, TrafficStats, User};
use crate::proto;
use tonic::Status;

pub fn backend_from_proto(backend: proto::Backend) -> Result<BackendSpec, Status> {
    let users = backend
        .users
        .into_iter()
        .map(user_from_proto)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BackendSpec {
        kind: backend.kind,
        raw_config: backend.config,
        users,
        keep_alive: backend.keep_alive,
    })
}

pub fn user_from_proto(user: proto::User) -> Result<User, Status> {
    if user.identity.is_empty() {
        return Err(Status::invalid_argument("user identity must not be empty"));
    }

    let proxies = user
        .proxies
        .into_iter()
        .map(proxy_from_proto)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(User {
        identity: user.identity,
        proxies,
        inbound_tags: user.inbounds,
    })
}

pub fn proxy_from_proto(proxy: proto::Proxy) -> Result<Proxy, Status> {
    let credential = proxy
        .credential
        .ok_or_else(|| Status::invalid_argument("proxy carries no credential"))?;

    Ok(match credential {
        proto::proxy::Credential::Vmess(c) => Proxy::Vmess { id: c.id },
        proto::proxy::Credential::Vless(c) => Proxy::Vless {
            id: c.id,
            flow: c.flow,
        },
        proto::proxy::Credential::Trojan(c) => Proxy::Trojan {
            password: c.password,
        },
        proto::proxy::Credential::Shadowsocks(c) => Proxy::Shadowsocks {
            method: c.method,
            password: c.password,
        },
    })
}

pub fn traffic_to_proto(stats: TrafficStats) -> proto::StatsResponse {
    proto::StatsResponse {
        identity: stats.identity,
        bytes_up: stats.bytes_up,
        bytes_down: stats.bytes_down,
    }
}

pub fn snapshot_to_proto(snapshot: SystemSnapshot) -> proto::SystemStatsResponse {
    proto::SystemStatsResponse {
        cpu_cores: snapshot.cpu_cores,
        cpu_usage: snapshot.cpu_usage_pct,
        mem_total: snapshot.mem_total_bytes,
        mem_used: snapshot.mem_used_bytes,
        mem_usage: snapshot.mem_usage_pct,
        net_rx: snapshot.net_rx_bytes,
        net_tx: snapshot.net_tx_bytes,
    }
}

/// Lifecycle preconditions surface as FailedPrecondition; everything else
/// the supervisor can report is an internal failure of this node.
pub fn status_from_domain(err: DomainError) -> Status {
    match err {
        DomainError::AlreadyRunning | DomainError::NotRunning => {
            Status::failed_precondition(err.to_string())
        }
        _ => Status::internal(err.to_string()),
    }
}
