//! End-to-end gRPC tests: a real tonic server on an ephemeral port, driven
//! by the generated client.

use node_integration_tests::{spawn_grpc, TestApp};
use node_engine::proto::node_service_client::NodeServiceClient;
use node_engine::proto::{self, Empty};
use tonic::metadata::MetadataValue;
use tonic::Request;

async fn connect(addr: std::net::SocketAddr) -> NodeServiceClient<tonic::transport::Channel> {
    // The server needs a beat to pick up the listener.
    for _ in 0..50 {
        match NodeServiceClient::connect(format!("http://{addr}")).await {
            Ok(client) => return client,
            Err(_) => tokio::time::sleep(std::time::Duration::from_millis(20)).await,
        }
    }
    panic!("gRPC server never became reachable at {addr}");
}

fn backend(config: &str) -> proto::Backend {
    proto::Backend {
        kind: "proxy-core".to_string(),
        config: config.to_string(),
        users: vec![],
        keep_alive: false,
    }
}

#[tokio::test]
async fn base_info_start_stop_over_the_wire() {
    let t = TestApp::new();
    t.runner.set_version(Some("core 1.8.4"));
    let (addr, shutdown) = spawn_grpc(t.app.clone()).await;
    let mut client = connect(addr).await;

    let info = client
        .get_base_info(Empty {})
        .await
        .unwrap()
        .into_inner();
    assert!(!info.running);
    assert_eq!(info.core_version, "core 1.8.4");
    assert!(!info.session_id.is_empty());

    let info = client.start(backend("{}")).await.unwrap().into_inner();
    assert!(info.running);
    assert_eq!(t.runner.spawn_count(), 1);

    let err = client.start(backend("{}")).await.unwrap_err();
    assert_eq!(err.code(), tonic::Code::FailedPrecondition);

    let info = client.stop(Empty {}).await.unwrap().into_inner();
    assert!(!info.running);
    assert_eq!(info.uptime, 0);

    shutdown.cancel();
}

#[tokio::test]
async fn user_sync_and_stats_over_the_wire() {
    let t = TestApp::new();
    let (addr, shutdown) = spawn_grpc(t.app.clone()).await;
    let mut client = connect(addr).await;

    let response = client
        .sync_user(proto::User {
            identity: "a@x".to_string(),
            proxies: vec![proto::Proxy {
                credential: Some(proto::proxy::Credential::Vmess(proto::VmessCredential {
                    id: "id1".to_string(),
                })),
            }],
            inbounds: vec!["in1".to_string()],
        })
        .await
        .unwrap()
        .into_inner();
    assert!(response.success);
    assert_eq!(t.supervisor.users().await.len(), 1);

    // Credential-less proxies are rejected before reaching the supervisor.
    let err = client
        .sync_user(proto::User {
            identity: "b@x".to_string(),
            proxies: vec![proto::Proxy { credential: None }],
            inbounds: vec!["in1".to_string()],
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), tonic::Code::InvalidArgument);

    t.stats.record_traffic("a@x", 100, 200);
    let stats = client
        .get_stats(proto::StatsRequest {
            identity: "a@x".to_string(),
            reset: true,
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(stats.bytes_up, 100);
    assert_eq!(stats.bytes_down, 200);

    let stats = client
        .get_stats(proto::StatsRequest {
            identity: "a@x".to_string(),
            reset: false,
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(stats.bytes_up, 0);

    let system = client
        .get_system_stats(Empty {})
        .await
        .unwrap()
        .into_inner();
    assert_eq!(system.cpu_cores, 8);
    assert_eq!(system.mem_usage, 50.0);

    shutdown.cancel();
}

#[tokio::test]
async fn access_key_gates_every_call_when_configured() {
    let t = TestApp::with_api_key("secret");
    let (addr, shutdown) = spawn_grpc(t.app.clone()).await;
    let mut client = connect(addr).await;

    let err = client.get_base_info(Empty {}).await.unwrap_err();
    assert_eq!(err.code(), tonic::Code::PermissionDenied);

    let mut request = Request::new(Empty {});
    request.metadata_mut().insert(
        "x-api-key",
        MetadataValue::try_from("secret").unwrap(),
    );
    client.get_base_info(request).await.unwrap();

    shutdown.cancel();
}
