//! gRPC transport helpers
//!
//! Serves a tonic service over TCP with optional TLS, alongside the gRPC
//! health and reflection services.

use std::convert::Infallible;
use std::error::Error;
use std::future::Future;
use std::net::SocketAddr;

use http::{Request as HttpRequest, Response as HttpResponse};
use hyper::Body;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::body::BoxBody;
use tonic::codegen::Service;
use tonic::server::NamedService;
use tonic::transport::{Identity, Server, ServerTlsConfig};
use tracing::info;

use crate::infrastructure::AgentConfig;

/// Serve the node service on the configured address, with TLS when the
/// certificate pair is configured, plus health and reflection services.
pub async fn serve_grpc<S, F>(
    config: &AgentConfig,
    service: S,
    shutdown: F,
) -> Result<(), Box<dyn Error>>
where
    S: Service<HttpRequest<Body>, Response = HttpResponse<BoxBody>, Error = Infallible>
        + NamedService
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = config.grpc_addr().parse()?;

    let mut server = Server::builder();
    if let (Some(cert_file), Some(key_file)) = (&config.ssl_cert_file, &config.ssl_key_file) {
        let cert = tokio::fs::read(cert_file).await?;
        let key = tokio::fs::read(key_file).await?;
        server = server.tls_config(ServerTlsConfig::new().identity(Identity::from_pem(cert, key)))?;
        info!(%addr, "gRPC server listening (TLS)");
    } else {
        info!(%addr, "gRPC server listening (plaintext)");
    }

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter.set_serving::<S>().await;

    let reflection_service = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(crate::proto::FILE_DESCRIPTOR_SET)
        .build()?;

    server
        .add_service(health_service)
        .add_service(reflection_service)
        .add_service(service)
        .serve_with_shutdown(addr, shutdown)
        .await?;

    Ok(())
}

/// Serve on an already-bound listener. Used by tests that bind port 0 and
/// need the assigned address before the server is up.
pub async fn serve_grpc_on_listener<S, F>(
    listener: TcpListener,
    service: S,
    shutdown: F,
) -> Result<(), Box<dyn Error>>
where
    S: Service<HttpRequest<Body>, Response = HttpResponse<BoxBody>, Error = Infallible>
        + NamedService
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    Server::builder()
        .add_service(service)
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await?;

    Ok(())
}
