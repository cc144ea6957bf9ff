use axum::{routing::get, Router};
use std::sync::Arc;
use tracing::info;

use crate::dispatcher::PushDispatcher;
use crate::handlers::{health_handler, push_handler, PushState};

/// Routes for the inbound push endpoint, meant to be nested under `/api`.
///
/// - `GET|POST /push`
/// - `GET /health`
pub fn routes(dispatcher: Arc<PushDispatcher>) -> Router {
    let state = Arc::new(PushState { dispatcher });

    info!("Push routes initialized");

    Router::new()
        .route("/push", get(push_handler).post(push_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}
