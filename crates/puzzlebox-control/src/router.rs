//! Axum router construction for the control surface.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::operator;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the control surface.
///
/// The router includes:
/// - `GET /` -- operator dashboard
/// - `GET /status`, `GET /api/status` -- puzzle status
/// - `GET /reset`, `GET /solve` -- plain-text commands
/// - `POST /api/reset`, `POST /api/solve`, `POST /api/answer`
/// - `POST /api/inputs/trigger`, `POST /api/inputs/clear`
/// - `GET /api/events`, `GET /api/outputs`
/// - `GET /api/driver`, `POST /api/driver/interval`
/// - `GET /ws/status` -- `WebSocket` update stream
///
/// CORS allows any origin so the dashboard can be served elsewhere.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Dashboard
        .route("/", get(handlers::index))
        // Status
        .route("/status", get(handlers::status))
        .route("/api/status", get(handlers::status))
        .route("/api/events", get(handlers::list_events))
        .route("/api/outputs", get(handlers::get_outputs))
        // Commands
        .route("/reset", get(operator::reset_plain))
        .route("/solve", get(operator::solve_plain))
        .route("/api/reset", post(operator::reset))
        .route("/api/solve", post(operator::solve))
        .route("/api/answer", post(operator::submit_answer))
        .route("/api/inputs/trigger", post(operator::trigger_input))
        .route("/api/inputs/clear", post(operator::clear_inputs))
        // Driver
        .route("/api/driver", get(handlers::driver_status))
        .route("/api/driver/interval", post(operator::set_interval))
        // WebSocket
        .route("/ws/status", get(ws::ws_status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
