//! REST router construction

use super::handlers::{self, SharedRestState};
use axum::routing::{get, post};
use axum::Router;

pub fn build_router(state: SharedRestState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/connect", post(handlers::connect))
        .route("/disconnect", post(handlers::disconnect))
        .route("/ping", get(handlers::ping))
        .route("/start", post(handlers::start))
        .route("/stop", post(handlers::stop))
        .route("/restart", post(handlers::restart))
        .with_state(state)
}
