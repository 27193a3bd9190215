//! Read-only endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Operator dashboard |
//! | `GET` | `/status`, `/api/status` | Current puzzle status |
//! | `GET` | `/api/events` | Recent transitions (`?limit=N`) |
//! | `GET` | `/api/outputs` | Last applied indicator |
//! | `GET` | `/api/driver` | Driver loop status |

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse};
use axum::Json;
use puzzlebox_core::controller::MAX_EVENTS;
use puzzlebox_types::PuzzleStatus;

use crate::error::ControlError;
use crate::state::AppState;

/// Events returned by `/api/events` when no limit is given.
pub const DEFAULT_EVENT_LIMIT: usize = 50;

/// Query parameters for the `GET /api/events` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct EventsQuery {
    /// Maximum number of events to return (default 50).
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// GET / -- operator dashboard
// ---------------------------------------------------------------------------

/// Serve the operator dashboard.
///
/// The page polls `/api/status` every second and posts commands to the
/// operator endpoints.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let total_steps = state.controller.status().await.total_steps;
    let simulation = if state.panel.simulation() { "on" } else { "off" };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Puzzlebox Control</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        .LOCKED {{ color: #f85149; }}
        .IN_PROGRESS {{ color: #d29922; }}
        .SOLVED {{ color: #3fb950; }}
        button, input {{
            background: #161b22;
            color: #c9d1d9;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 0.5rem 1rem;
            font-family: inherit;
            margin-right: 0.5rem;
        }}
        button:hover {{ border-color: #58a6ff; }}
        #message {{ color: #8b949e; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Puzzlebox Control</h1>
    <p class="subtitle">{total_steps} steps -- simulated inputs {simulation}</p>

    <div>
        <div class="metric">
            <div class="label">State</div>
            <div class="value" id="state">-</div>
        </div>
        <div class="metric">
            <div class="label">Step</div>
            <div class="value" id="step">-</div>
        </div>
        <div class="metric">
            <div class="label">Time left</div>
            <div class="value" id="remaining">-</div>
        </div>
    </div>

    <p id="question"></p>

    <hr>

    <form id="answer-form">
        <input id="answer" placeholder="answer" autocomplete="off">
        <button type="submit">Submit answer</button>
    </form>
    <p>
        <input id="input-name" placeholder="input" value="start">
        <button id="trigger">Trigger input</button>
    </p>
    <p>
        <button id="reset">Reset</button>
        <button id="solve">Force solve</button>
    </p>
    <p id="message"></p>

    <script>
        const $ = (id) => document.getElementById(id);

        async function post(path, body) {{
            const res = await fetch(path, {{
                method: 'POST',
                headers: {{ 'Content-Type': 'application/json' }},
                body: JSON.stringify(body ?? {{}}),
            }});
            const json = await res.json();
            $('message').textContent = json.message ?? json.error ?? '';
            refresh();
        }}

        async function refresh() {{
            const res = await fetch('/api/status');
            const s = await res.json();
            $('state').textContent = s.state;
            $('state').className = 'value ' + s.state;
            $('step').textContent = `${{s.step}} / ${{s.total_steps}}`;
            $('question').textContent = s.question;
            $('remaining').textContent = s.puzzle_remaining_ms == null
                ? '-'
                : `${{Math.ceil(s.puzzle_remaining_ms / 1000)}}s`;
        }}

        $('answer-form').addEventListener('submit', (e) => {{
            e.preventDefault();
            post('/api/answer', {{ answer: $('answer').value }});
            $('answer').value = '';
        }});
        $('trigger').addEventListener('click', () =>
            post('/api/inputs/trigger', {{ input: $('input-name').value }}));
        $('reset').addEventListener('click', () => post('/api/reset'));
        $('solve').addEventListener('click', () => post('/api/solve'));

        refresh();
        setInterval(refresh, 1000);
    </script>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /status, /api/status
// ---------------------------------------------------------------------------

/// Return the current puzzle status.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<PuzzleStatus> {
    Json(state.controller.status().await)
}

// ---------------------------------------------------------------------------
// GET /api/events
// ---------------------------------------------------------------------------

/// List recent transitions, oldest first.
///
/// # Query Parameters
///
/// - `limit`: number of events, 1 to 100 (default 50)
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventsQuery>,
) -> Result<impl IntoResponse, ControlError> {
    let limit = params.limit.unwrap_or(DEFAULT_EVENT_LIMIT);
    if limit == 0 || limit > MAX_EVENTS {
        return Err(ControlError::InvalidRequest(format!(
            "limit must be between 1 and {MAX_EVENTS}"
        )));
    }

    let events = state.controller.recent_events(limit).await;
    Ok(Json(serde_json::json!({
        "count": events.len(),
        "events": events,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/outputs
// ---------------------------------------------------------------------------

/// Return the indicator currently applied to the outputs.
pub async fn get_outputs(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ControlError> {
    state
        .outputs
        .current()
        .map(Json)
        .ok_or_else(|| ControlError::NotFound("no indicator applied yet".to_owned()))
}

// ---------------------------------------------------------------------------
// GET /api/driver
// ---------------------------------------------------------------------------

/// Return the driver loop status.
pub async fn driver_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.driver.status(state.panel.simulation()))
}
