//! The driver loop.
//!
//! [`run_driver`] ticks the [`PuzzleController`] at the configured cadence
//! until a stop is requested. The interval is re-read every iteration so
//! the control surface can change it at runtime.

use tracing::{debug, info};

use crate::controller::PuzzleController;
use crate::driver::DriverControl;

/// Result of a driver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverResult {
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

/// Run the driver loop until [`DriverControl::request_stop`] is called.
///
/// Each iteration checks for a stop, runs one controller tick, then
/// sleeps for the current poll interval. A stop request interrupts the
/// sleep.
pub async fn run_driver(controller: &PuzzleController, control: &DriverControl) -> DriverResult {
    info!(
        poll_interval_ms = control.poll_interval_ms(),
        "Driver loop starting"
    );

    loop {
        if control.is_stop_requested() {
            info!("Driver stop requested");
            return DriverResult {
                total_ticks: control.ticks(),
            };
        }

        if let Some(event) = controller.tick().await {
            debug!(transition = ?event.transition, state = %event.state, "Tick produced transition");
        }
        let _ = control.record_tick();

        tokio::select! {
            () = tokio::time::sleep(control.poll_interval()) => {}
            () = control.stopped() => {}
        }
    }
}

/// Log the end of a driver run.
pub fn log_driver_end(result: &DriverResult, control: &DriverControl) {
    info!(
        total_ticks = result.total_ticks,
        elapsed_seconds = control.elapsed_seconds(),
        "Driver loop ended"
    );
}
