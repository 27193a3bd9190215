//! Shared application state for the control surface.

use std::sync::Arc;

use puzzlebox_core::controller::PuzzleController;
use puzzlebox_core::driver::DriverControl;
use puzzlebox_core::input::PanelInputs;
use puzzlebox_core::output::IndicatorOutputs;
use puzzlebox_types::PuzzleUpdate;
use tokio::sync::broadcast;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. Every
/// field is a handle onto an object the engine owns for the lifetime of
/// the process.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Serialized access to the puzzle machine.
    pub controller: Arc<PuzzleController>,
    /// Software input panel: answer slot and simulated presses.
    pub panel: Arc<PanelInputs>,
    /// Indicator driver, read for `/api/outputs`.
    pub outputs: Arc<IndicatorOutputs>,
    /// Driver loop control state.
    pub driver: Arc<DriverControl>,
}

impl AppState {
    /// Bundle the engine's shared handles.
    pub const fn new(
        controller: Arc<PuzzleController>,
        panel: Arc<PanelInputs>,
        outputs: Arc<IndicatorOutputs>,
        driver: Arc<DriverControl>,
    ) -> Self {
        Self {
            controller,
            panel,
            outputs,
            driver,
        }
    }

    /// Subscribe to live puzzle updates.
    pub fn subscribe(&self) -> broadcast::Receiver<PuzzleUpdate> {
        self.controller.subscribe()
    }
}
