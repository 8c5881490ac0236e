//! Shared fixtures for the integration tests
//!
//! Tests run in-process against the engine library: the supervisor is wired
//! with a recording mock runner and scripted probes, and the gRPC tests
//! serve the real tonic service on an ephemeral port.

use std::net::SocketAddr;
use std::sync::Arc;

use node_engine::adapters::grpc::NodeAgentService;
use node_engine::application::Application;
use node_engine::domain::ports::{LivenessProbe, MockCoreRunner, StaticProbe, SystemStatsReader};
use node_engine::domain::services::{CoreSupervisor, StatsCollector};
use node_engine::domain::value_objects::SystemSnapshot;
use node_engine::domain::BackendSpec;
use node_engine::infrastructure::AgentConfig;
use node_engine::proto::node_service_server::NodeServiceServer;
use node_engine::transport;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Stats reader double with fixed, nonzero memory numbers.
pub struct FixedReader;

impl SystemStatsReader for FixedReader {
    fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot {
            cpu_cores: 8,
            cpu_usage_pct: 0.0,
            mem_total_bytes: 2048,
            mem_used_bytes: 1024,
            mem_usage_pct: 50.0,
            net_rx_bytes: 0,
            net_tx_bytes: 0,
        }
    }
}

/// An application wired with mock infrastructure, plus handles to the
/// doubles so tests can script and inspect them.
pub struct TestApp {
    pub app: Arc<Application>,
    pub runner: MockCoreRunner,
    pub supervisor: Arc<CoreSupervisor>,
    pub stats: Arc<StatsCollector>,
    _dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_probes(vec![Arc::new(StaticProbe::down("down"))])
    }

    pub fn with_probes(probes: Vec<Arc<dyn LivenessProbe>>) -> Self {
        Self::build(AgentConfig::default(), probes)
    }

    pub fn with_api_key(key: &str) -> Self {
        let config = AgentConfig {
            api_key: Some(key.to_string()),
            ..AgentConfig::default()
        };
        Self::build(config, vec![Arc::new(StaticProbe::down("down"))])
    }

    fn build(config: AgentConfig, probes: Vec<Arc<dyn LivenessProbe>>) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let runner = MockCoreRunner::new();
        let supervisor = Arc::new(CoreSupervisor::new(
            Arc::new(runner.clone()),
            probes,
            dir.path().join("core_config.json"),
        ));
        let stats = Arc::new(StatsCollector::new(Arc::new(FixedReader)));
        let app = Arc::new(Application::with_components(
            config,
            supervisor.clone(),
            stats.clone(),
        ));
        Self {
            app,
            runner,
            supervisor,
            stats,
            _dir: dir,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

pub fn backend(config: &str) -> BackendSpec {
    BackendSpec::config_only("proxy-core", config)
}

/// Serve the gRPC surface on an ephemeral port. Returns the bound address
/// and a token that stops the server when cancelled.
pub async fn spawn_grpc(app: Arc<Application>) -> (SocketAddr, CancellationToken) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    let shutdown = CancellationToken::new();
    let server_shutdown = shutdown.clone();
    let service = NodeServiceServer::new(NodeAgentService::new(app));
    tokio::spawn(async move {
        transport::serve_grpc_on_listener(listener, service, async move {
            server_shutdown.cancelled().await;
        })
        .await
        .expect("gRPC server");
    });

    (addr, shutdown)
}
