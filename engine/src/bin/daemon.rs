//! proxy-noded: the node agent daemon
//!
//! Wires the application against real infrastructure and serves the gRPC
//! surface next to the REST mirror until a shutdown signal arrives.

use std::net::SocketAddr;
use std::sync::Arc;

use node_engine::adapters::grpc::NodeAgentService;
use node_engine::adapters::rest::{build_router, RestState};
use node_engine::application::Application;
use node_engine::infrastructure::AgentConfig;
use node_engine::proto::node_service_server::NodeServiceServer;
use node_engine::transport;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AgentConfig::from_env();
    info!(
        grpc = %config.grpc_addr(),
        rest = %config.rest_addr(),
        core = %config.core_executable_path.display(),
        version = node_engine::AGENT_VERSION,
        "starting node agent"
    );

    let app = Arc::new(Application::new(config.clone()));
    let shutdown = CancellationToken::new();

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            shutdown.cancel();
        });
    }

    // REST mirror runs next to the main gRPC surface.
    let rest_addr: SocketAddr = config.rest_addr().parse()?;
    let rest_state = Arc::new(RestState::new(app.clone()));
    let rest_shutdown = shutdown.clone();
    let rest_server = tokio::spawn(async move {
        let server = axum::Server::bind(&rest_addr)
            .serve(build_router(rest_state).into_make_service())
            .with_graceful_shutdown(async move { rest_shutdown.cancelled().await });
        if let Err(e) = server.await {
            error!(error = %e, "REST server failed");
        }
    });

    let service = NodeServiceServer::new(NodeAgentService::new(app));
    let grpc_shutdown = shutdown.clone();
    transport::serve_grpc(&config, service, async move {
        grpc_shutdown.cancelled().await
    })
    .await?;

    // The gRPC server exits on the same token the REST server watches.
    let _ = rest_server.await;
    info!("node agent stopped");
    Ok(())
}
