//! REST API handlers using axum

use crate::application::Application;
use crate::domain::{BackendSpec, DomainError};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Shared REST state: the application plus the controller session handed
/// out by `/connect`.
pub struct RestState {
    app: Arc<Application>,
    session: RwLock<Option<String>>,
}

impl RestState {
    pub fn new(app: Arc<Application>) -> Self {
        Self {
            app,
            session: RwLock::new(None),
        }
    }
}

pub type SharedRestState = Arc<RestState>;

/// Start/restart request body.
#[derive(Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub config: String,
}

/// Response body shared by the lifecycle endpoints; unset fields are
/// omitted from the JSON.
#[derive(Serialize, Default)]
pub struct NodeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub core_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: DomainError) -> HandlerError {
    let code = match err {
        DomainError::AlreadyRunning | DomainError::NotRunning => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        code,
        Json(ErrorResponse {
            detail: err.to_string(),
        }),
    )
}

/// GET / - core status summary
pub async fn root(State(state): State<SharedRestState>) -> Json<NodeResponse> {
    let supervisor = state.app.supervisor();
    let core_version = supervisor.version().await.unwrap_or_default();

    Json(NodeResponse {
        started: Some(supervisor.is_running().await),
        core_version: Some(core_version),
        ..Default::default()
    })
}

/// POST /connect - open a controller session
pub async fn connect(State(state): State<SharedRestState>) -> Json<NodeResponse> {
    let session_id = Uuid::new_v4().to_string();
    *state.session.write().await = Some(session_id.clone());

    info!(session_id = %session_id, "REST client connected");

    Json(NodeResponse {
        session_id: Some(session_id),
        ..Default::default()
    })
}

/// POST /disconnect - drop the controller session
pub async fn disconnect(State(state): State<SharedRestState>) -> Json<NodeResponse> {
    *state.session.write().await = None;

    info!("REST client disconnected");

    Json(NodeResponse {
        message: Some("disconnected".to_string()),
        ..Default::default()
    })
}

/// GET /ping
pub async fn ping() -> Json<NodeResponse> {
    Json(NodeResponse {
        message: Some("pong".to_string()),
        ..Default::default()
    })
}

/// POST /start - start the core with the submitted config
pub async fn start(
    State(state): State<SharedRestState>,
    Json(req): Json<StartRequest>,
) -> Result<Json<NodeResponse>, HandlerError> {
    info!(config_len = req.config.len(), "REST Start request");

    let supervisor = state.app.supervisor();
    supervisor
        .start(BackendSpec::config_only(crate::CORE_TYPE, req.config))
        .await
        .map_err(error_response)?;

    let core_version = supervisor.version().await.unwrap_or_default();
    Ok(Json(NodeResponse {
        started: Some(true),
        core_version: Some(core_version),
        message: Some("core started".to_string()),
        ..Default::default()
    }))
}

/// POST /stop
pub async fn stop(
    State(state): State<SharedRestState>,
) -> Result<Json<NodeResponse>, HandlerError> {
    info!("REST Stop request");

    state.app.supervisor().stop().await.map_err(error_response)?;

    Ok(Json(NodeResponse {
        started: Some(false),
        message: Some("core stopped".to_string()),
        ..Default::default()
    }))
}

/// POST /restart - restart the core with a new config
pub async fn restart(
    State(state): State<SharedRestState>,
    Json(req): Json<StartRequest>,
) -> Result<Json<NodeResponse>, HandlerError> {
    info!(config_len = req.config.len(), "REST Restart request");

    let supervisor = state.app.supervisor();
    supervisor
        .restart(BackendSpec::config_only(crate::CORE_TYPE, req.config))
        .await
        .map_err(error_response)?;

    let core_version = supervisor.version().await.unwrap_or_default();
    Ok(Json(NodeResponse {
        started: Some(true),
        core_version: Some(core_version),
        message: Some("core restarted".to_string()),
        ..Default::default()
    }))
}
