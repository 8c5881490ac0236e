//! gRPC NodeService implementation
//! Driving adapter that exposes the supervisor and stats collector to the
//! remote controller

use crate::application::Application;
use crate::proto::node_service_server::NodeService;
use crate::proto::{
    Backend, BaseInfoResponse, CommandRequest, CommandResponse, Empty, StatsRequest,
    StatsResponse, SyncResponse, SystemStatsResponse, User, Users,
};
use std::process::Stdio;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::{error, info, warn};

use super::mappers::{
    backend_from_proto, snapshot_to_proto, status_from_domain, traffic_to_proto, user_from_proto,
};

/// Metadata key carrying the access key when one is configured.
const API_KEY_METADATA: &str = "x-api-key";

pub struct NodeAgentService {
    app: Arc<Application>,
}

impl NodeAgentService {
    pub fn new(app: Arc<Application>) -> Self {
        Self { app }
    }

    /// Reject the call unless it carries the configured access key. With no
    /// key configured the surface is open; `execute_command` additionally
    /// refuses to run at all in that case.
    fn authorize<T>(&self, request: &Request<T>) -> Result<(), Status> {
        let Some(expected) = self.app.config().api_key.as_deref() else {
            return Ok(());
        };

        let provided = request
            .metadata()
            .get(API_KEY_METADATA)
            .and_then(|v| v.to_str().ok());

        if provided == Some(expected) {
            Ok(())
        } else {
            warn!("request rejected: missing or invalid access key");
            Err(Status::permission_denied("missing or invalid access key"))
        }
    }

    async fn base_info(&self) -> BaseInfoResponse {
        let supervisor = self.app.supervisor();

        // Version query failure is not worth failing a status report over.
        let core_version = supervisor.version().await.unwrap_or_default();

        BaseInfoResponse {
            version: crate::AGENT_VERSION.to_string(),
            core_type: crate::CORE_TYPE.to_string(),
            running: supervisor.is_running().await,
            core_version,
            uptime: supervisor.uptime().await,
            session_id: self.app.session_id().to_string(),
        }
    }
}

#[tonic::async_trait]
impl NodeService for NodeAgentService {
    async fn start(
        &self,
        request: Request<Backend>,
    ) -> Result<Response<BaseInfoResponse>, Status> {
        self.authorize(&request)?;
        let spec = backend_from_proto(request.into_inner())?;

        info!(kind = %spec.kind, users = spec.users.len(), "gRPC Start request");

        self.app
            .supervisor()
            .start(spec)
            .await
            .map_err(|e| {
                error!(error = %e, "start failed");
                status_from_domain(e)
            })?;

        Ok(Response::new(self.base_info().await))
    }

    async fn stop(&self, request: Request<Empty>) -> Result<Response<BaseInfoResponse>, Status> {
        self.authorize(&request)?;

        info!("gRPC Stop request");

        self.app.supervisor().stop().await.map_err(|e| {
            error!(error = %e, "stop failed");
            status_from_domain(e)
        })?;

        Ok(Response::new(self.base_info().await))
    }

    async fn restart(
        &self,
        request: Request<Backend>,
    ) -> Result<Response<BaseInfoResponse>, Status> {
        self.authorize(&request)?;
        let spec = backend_from_proto(request.into_inner())?;

        info!(kind = %spec.kind, users = spec.users.len(), "gRPC Restart request");

        self.app
            .supervisor()
            .restart(spec)
            .await
            .map_err(|e| {
                error!(error = %e, "restart failed");
                status_from_domain(e)
            })?;

        Ok(Response::new(self.base_info().await))
    }

    async fn get_base_info(
        &self,
        request: Request<Empty>,
    ) -> Result<Response<BaseInfoResponse>, Status> {
        self.authorize(&request)?;
        Ok(Response::new(self.base_info().await))
    }

    async fn sync_user(&self, request: Request<User>) -> Result<Response<SyncResponse>, Status> {
        self.authorize(&request)?;
        let user = user_from_proto(request.into_inner())?;

        info!(identity = %user.identity, removal = user.is_removal(), "gRPC SyncUser request");

        // Sync failures are reported in-band, not as an RPC error.
        let response = match self.app.supervisor().sync_user(user).await {
            Ok(()) => SyncResponse {
                success: true,
                message: "user synced".to_string(),
                synced_count: 1,
            },
            Err(e) => SyncResponse {
                success: false,
                message: e.to_string(),
                synced_count: 0,
            },
        };

        Ok(Response::new(response))
    }

    async fn sync_users(&self, request: Request<Users>) -> Result<Response<SyncResponse>, Status> {
        self.authorize(&request)?;
        let users = request
            .into_inner()
            .users
            .into_iter()
            .map(user_from_proto)
            .collect::<Result<Vec<_>, _>>()?;
        let count = users.len();

        info!(count, "gRPC SyncUsers request");

        let response = match self.app.supervisor().sync_users(users).await {
            Ok(()) => SyncResponse {
                success: true,
                message: "users synced".to_string(),
                synced_count: count as i32,
            },
            Err(e) => SyncResponse {
                success: false,
                message: e.to_string(),
                synced_count: 0,
            },
        };

        Ok(Response::new(response))
    }

    async fn get_stats(
        &self,
        request: Request<StatsRequest>,
    ) -> Result<Response<StatsResponse>, Status> {
        self.authorize(&request)?;
        let req = request.into_inner();

        let stats = self.app.stats().user_stats(&req.identity, req.reset);
        Ok(Response::new(traffic_to_proto(stats)))
    }

    async fn get_system_stats(
        &self,
        request: Request<Empty>,
    ) -> Result<Response<SystemStatsResponse>, Status> {
        self.authorize(&request)?;

        let snapshot = self.app.stats().system_stats();
        Ok(Response::new(snapshot_to_proto(snapshot)))
    }

    async fn execute_command(
        &self,
        request: Request<CommandRequest>,
    ) -> Result<Response<CommandResponse>, Status> {
        self.authorize(&request)?;

        // The escape hatch runs an unrestricted shell command; it stays
        // disabled unless the deployment has explicitly configured a key.
        if self.app.config().api_key.is_none() {
            return Err(Status::permission_denied(
                "command execution requires a configured access key",
            ));
        }

        let command = request.into_inner().command;
        info!(%command, "gRPC ExecuteCommand request");

        let output = tokio::process::Command::new("/bin/sh")
            .arg("-c")
            .arg(&command)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Status::internal(format!("failed to run command: {e}")))?;

        // Non-zero exit is a successful call: the caller gets the exit code
        // and captured stderr instead of an error.
        let exit_code = output.status.code().unwrap_or(-1);
        info!(exit_code, "command finished");

        Ok(Response::new(CommandResponse {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
        }))
    }
}
