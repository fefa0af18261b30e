//! Liveness and readiness probes for container platforms

use axum::{Json, Router, extract::State, routing::get};
use jangaloga::pipeline::ExclusiveSlot;
use serde::Serialize;
use tower_http::trace::TraceLayer;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub busy: bool,
}

/// `GET /` and `GET /healthz` answer `ok`; `GET /status` reports the slot
pub fn router(slot: ExclusiveSlot) -> Router {
    Router::new()
        .route("/", get(ok))
        .route("/healthz", get(ok))
        .route("/status", get(status))
        .layer(TraceLayer::new_for_http())
        .with_state(slot)
}

async fn ok() -> &'static str {
    "ok"
}

async fn status(State(slot): State<ExclusiveSlot>) -> Json<StatusResponse> {
    Json(StatusResponse {
        busy: slot.is_held(),
    })
}
