//! Control server startup helper for the engine binary.
//!
//! [`spawn_control`] binds the listener on the caller's task, so an
//! unusable address is reported before anything else starts, then runs
//! the server on a background Tokio task. The server shuts down
//! gracefully once the driver is asked to stop.

use std::sync::Arc;

use puzzlebox_core::config::ControlConfig;
use tokio::task::JoinHandle;

use crate::server::{self, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the control server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Spawn the control HTTP server on a background Tokio task.
///
/// The returned handle completes after the driver's stop request has
/// drained in-flight requests.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the listener cannot bind.
pub async fn spawn_control(
    config: &ControlConfig,
    state: Arc<AppState>,
) -> Result<JoinHandle<()>, StartupError> {
    let listener = server::bind(config).await?;
    let driver = Arc::clone(&state.driver);

    let handle = tokio::spawn(async move {
        let shutdown = async move { driver.stopped().await };
        if let Err(e) = server::serve(listener, state, shutdown).await {
            tracing::error!(error = %e, "Control server exited with error");
        }
    });

    tracing::info!(port = config.port, "Control server spawned on background task");

    Ok(handle)
}
