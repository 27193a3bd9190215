//! Puzzlebox controller binary.
//!
//! Wires the configuration, the puzzle machine and its collaborators, the
//! control surface, and the driver loop together, then runs until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load the configuration file (`PUZZLE_CONFIG`, default
//!    `puzzle-config.yaml`) with environment overrides
//! 2. Initialize structured logging (tracing)
//! 3. Validate the puzzle sequence
//! 4. Build the input panel, indicator outputs and clock
//! 5. Build the machine, controller and driver control state
//! 6. Start the control server
//! 7. Install the Ctrl-C handler
//! 8. Run the driver loop until stopped
//! 9. Wait for the control server to drain and log the result

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use puzzlebox_control::state::AppState;
use puzzlebox_core::clock::{Clock, SystemClock};
use puzzlebox_core::config::{LogFormat, LoggingConfig, PuzzleFile};
use puzzlebox_core::controller::PuzzleController;
use puzzlebox_core::driver::DriverControl;
use puzzlebox_core::input::{InputSource, PanelInputs};
use puzzlebox_core::machine::PuzzleMachine;
use puzzlebox_core::output::{IndicatorOutputs, OutputSink};
use puzzlebox_core::runner;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Environment variable naming the configuration file.
const CONFIG_PATH_ENV: &str = "PUZZLE_CONFIG";

/// Configuration file used when `PUZZLE_CONFIG` is not set.
const DEFAULT_CONFIG_PATH: &str = "puzzle-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration is missing or invalid, logging
/// cannot be installed, or the control server cannot bind.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config_path = resolve_config_path(std::env::var(CONFIG_PATH_ENV).ok());
    let file = PuzzleFile::from_file(&config_path).map_err(|source| EngineError::Config {
        path: config_path.clone(),
        source,
    })?;

    // 2. Initialize structured logging.
    init_tracing(&file.logging)?;
    info!(path = %config_path.display(), "puzzlebox-engine starting");

    // 3. Validate.
    let puzzle = file.validate().map_err(|source| EngineError::Config {
        path: config_path.clone(),
        source,
    })?;
    info!(
        steps = puzzle.step_count(),
        timeout_secs = puzzle.overall_timeout().as_secs_f64(),
        poll_interval_ms = file.driver.poll_interval_ms,
        simulation = file.driver.simulation,
        "Configuration loaded"
    );

    // 4. Collaborators.
    let panel = Arc::new(PanelInputs::new(file.driver.simulation));
    let outputs = Arc::new(IndicatorOutputs::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());

    // 5. Machine, controller, driver control.
    let machine = PuzzleMachine::new(
        puzzle,
        Arc::clone(&panel) as Arc<dyn InputSource>,
        Arc::clone(&outputs) as Arc<dyn OutputSink>,
        clock,
    );
    let controller = Arc::new(PuzzleController::new(machine));
    let driver = Arc::new(DriverControl::new(file.driver.poll_interval_ms));

    // 6. Control server.
    let app_state = Arc::new(AppState::new(
        Arc::clone(&controller),
        panel,
        outputs,
        Arc::clone(&driver),
    ));
    let server_handle = puzzlebox_control::spawn_control(&file.control, app_state).await?;

    // 7. Ctrl-C requests a clean stop.
    {
        let driver = Arc::clone(&driver);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping");
                    driver.request_stop();
                }
                Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
            }
        });
    }

    // 8. Run the driver loop.
    let result = runner::run_driver(&controller, &driver).await;

    // 9. Drain the control server and log results.
    if let Err(e) = server_handle.await {
        warn!(error = %e, "Control server task failed");
    }
    runner::log_driver_end(&result, &driver);

    let status = controller.status().await;
    info!(
        final_state = %status.state,
        final_step = status.step,
        total_ticks = result.total_ticks,
        "puzzlebox-engine shutdown complete"
    );

    Ok(())
}

/// Pick the configuration file: the `PUZZLE_CONFIG` value when set and
/// non-blank, otherwise [`DEFAULT_CONFIG_PATH`].
fn resolve_config_path(from_env: Option<String>) -> PathBuf {
    from_env
        .filter(|path| !path.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match logging.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}
