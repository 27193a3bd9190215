//! Operator command handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/reset` | Reset the puzzle to `LOCKED` |
//! | `POST` | `/api/solve` | Force the puzzle into `SOLVED` |
//! | `GET` | `/reset`, `/solve` | Plain-text variants for simple clients |
//! | `POST` | `/api/answer` | Submit an answer for the current math step |
//! | `POST` | `/api/inputs/trigger` | Press a software input |
//! | `POST` | `/api/inputs/clear` | Release all software inputs |
//! | `POST` | `/api/driver/interval` | Change the poll interval |
//!
//! Every command is acknowledged immediately. An accepted answer or press
//! takes effect on the next driver tick; the acknowledgement says nothing
//! about correctness.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use puzzlebox_core::config::MIN_POLL_INTERVAL_MS;
use puzzlebox_core::input::TriggerError;
use puzzlebox_types::Answer;
use serde_json::Value;
use tracing::info;

use crate::error::ControlError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/answer`.
#[derive(Debug, serde::Deserialize)]
pub struct AnswerRequest {
    /// The submitted answer: a JSON number or a numeric string.
    pub answer: Value,
}

/// Request body for `POST /api/inputs/trigger`.
#[derive(Debug, serde::Deserialize)]
pub struct TriggerRequest {
    /// Name of the input to press.
    pub input: String,
    /// Action reported by the input (default: `"press"`).
    #[serde(default = "default_action")]
    pub action: String,
}

fn default_action() -> String {
    String::from("press")
}

/// Request body for `POST /api/driver/interval`.
#[derive(Debug, serde::Deserialize)]
pub struct SetIntervalRequest {
    /// New poll interval in milliseconds (minimum 10).
    pub poll_interval_ms: u64,
}

/// Generic success response.
#[derive(Debug, serde::Serialize)]
struct OperatorResponse {
    /// Whether the operation succeeded.
    ok: bool,
    /// Human-readable message.
    message: String,
}

fn acknowledge(message: impl Into<String>) -> Json<OperatorResponse> {
    Json(OperatorResponse {
        ok: true,
        message: message.into(),
    })
}

// ---------------------------------------------------------------------------
// Reset / solve
// ---------------------------------------------------------------------------

/// Reset the puzzle from any state.
pub async fn reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    record_reset(&state).await;
    acknowledge("Puzzle reset")
}

/// Force the puzzle into the solved state.
pub async fn solve(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    record_solve(&state).await;
    acknowledge("Puzzle solved")
}

/// `GET /reset`: reset and answer with a bare `OK`.
pub async fn reset_plain(State(state): State<Arc<AppState>>) -> &'static str {
    record_reset(&state).await;
    "OK"
}

/// `GET /solve`: force-solve and answer with a bare `OK`.
pub async fn solve_plain(State(state): State<Arc<AppState>>) -> &'static str {
    record_solve(&state).await;
    "OK"
}

async fn record_reset(state: &AppState) {
    let event = state.controller.reset().await;
    info!(event_id = %event.id, transition = ?event.transition, "Operator reset");
}

async fn record_solve(state: &AppState) {
    let event = state.controller.force_solve().await;
    info!(event_id = %event.id, transition = ?event.transition, "Operator force-solve");
}

// ---------------------------------------------------------------------------
// POST /api/answer
// ---------------------------------------------------------------------------

/// Store an answer in the pending slot for the machine's next tick.
///
/// Rejected with 409 unless the puzzle is in progress on a math step. The
/// check and the store run under the machine lock, and every reset drops
/// an unread answer, so an answer is never read by a later run.
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnswerRequest>,
) -> Result<impl IntoResponse, ControlError> {
    let answer = parse_answer(&body.answer)?;

    let step = state
        .controller
        .submit_answer(&state.panel, answer)
        .await
        .ok_or_else(|| ControlError::Conflict("puzzle is not waiting for an answer".to_owned()))?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "message": "Answer received",
        "step": step,
    })))
}

fn parse_answer(value: &Value) -> Result<Answer, ControlError> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => {
            return Err(ControlError::InvalidRequest(format!(
                "answer must be a number or numeric string, got {other}"
            )));
        }
    };
    text.parse::<Answer>()
        .map_err(|e| ControlError::InvalidRequest(e.to_string()))
}

// ---------------------------------------------------------------------------
// Software inputs
// ---------------------------------------------------------------------------

/// Press a software input for the next poll window.
pub async fn trigger_input(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TriggerRequest>,
) -> Result<impl IntoResponse, ControlError> {
    state
        .panel
        .trigger(&body.input, &body.action)
        .map_err(|e| match e {
            TriggerError::SimulationDisabled => ControlError::Conflict(e.to_string()),
            TriggerError::EmptyInput => ControlError::InvalidRequest(e.to_string()),
        })?;

    Ok(acknowledge(format!(
        "Input '{}' {} queued for next tick",
        body.input, body.action
    )))
}

/// Release every latched software input.
pub async fn clear_inputs(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.panel.clear();
    acknowledge("Inputs cleared")
}

// ---------------------------------------------------------------------------
// POST /api/driver/interval
// ---------------------------------------------------------------------------

/// Change the driver poll interval at runtime.
///
/// The new interval takes effect from the next sleep.
pub async fn set_interval(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetIntervalRequest>,
) -> Result<impl IntoResponse, ControlError> {
    state
        .driver
        .set_poll_interval_ms(body.poll_interval_ms)
        .map_or_else(
            || {
                Err(ControlError::InvalidRequest(format!(
                    "poll_interval_ms must be at least {MIN_POLL_INTERVAL_MS}"
                )))
            },
            |prev| {
                info!(prev, new = body.poll_interval_ms, "Poll interval changed");
                Ok(Json(serde_json::json!({
                    "ok": true,
                    "message": format!("Poll interval changed from {}ms to {}ms", prev, body.poll_interval_ms),
                    "previous_interval_ms": prev,
                    "new_interval_ms": body.poll_interval_ms,
                })))
            },
        )
}
