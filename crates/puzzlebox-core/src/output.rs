//! Output sinks driven by the puzzle state machine.
//!
//! The machine tells an [`OutputSink`] which [`PuzzleState`] it is in;
//! the sink turns that into physical indication (LEDs, door relay).
//! Sinks are best-effort: actuation problems are logged by the sink and
//! never reach the machine.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use puzzlebox_types::{Indicator, LedColor, PuzzleState};
use tracing::info;

/// A destination for state notifications.
///
/// Implementations must be idempotent (the same state may be notified
/// more than once) and must not panic.
pub trait OutputSink: Send + Sync + fmt::Debug {
    /// Drive the outputs for `state`.
    fn notify(&self, state: PuzzleState);
}

/// Indicator driver: maps each state to its LED colour and relay setting,
/// logs the actuation, and remembers what is currently shown.
#[derive(Debug, Default)]
pub struct IndicatorOutputs {
    current: Mutex<Option<Indicator>>,
}

impl IndicatorOutputs {
    /// Create a driver with nothing applied yet.
    pub const fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    /// The indicator most recently applied, if any.
    pub fn current(&self) -> Option<Indicator> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OutputSink for IndicatorOutputs {
    fn notify(&self, state: PuzzleState) {
        let indicator = Indicator::for_state(state);
        let led = match indicator.led {
            LedColor::Red => "red",
            LedColor::Yellow => "yellow",
            LedColor::Green => "green",
        };
        info!(
            state = state.as_str(),
            led,
            relay_engaged = indicator.relay_engaged,
            "Outputs updated"
        );
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(indicator);
    }
}

/// Sink that records every notification in order. For tests and benches
/// only.
///
/// Nothing is ever dropped, so memory grows with every transition. A
/// long-running service should use [`IndicatorOutputs`] instead.
#[derive(Debug, Default)]
pub struct RecordingOutputs {
    states: Mutex<Vec<PuzzleState>>,
}

impl RecordingOutputs {
    /// Create an empty recorder.
    pub const fn new() -> Self {
        Self {
            states: Mutex::new(Vec::new()),
        }
    }

    /// Every state notified so far, oldest first.
    pub fn states(&self) -> Vec<PuzzleState> {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent notification.
    pub fn last(&self) -> Option<PuzzleState> {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
    }
}

impl OutputSink for RecordingOutputs {
    fn notify(&self, state: PuzzleState) {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_outputs_track_current_state() {
        let outputs = IndicatorOutputs::new();
        assert_eq!(outputs.current(), None);

        outputs.notify(PuzzleState::Locked);
        assert_eq!(
            outputs.current(),
            Some(Indicator::for_state(PuzzleState::Locked))
        );

        outputs.notify(PuzzleState::Solved);
        let current = outputs.current();
        assert_eq!(current.map(|i| i.led), Some(LedColor::Green));
        assert_eq!(current.map(|i| i.relay_engaged), Some(true));
    }

    #[test]
    fn notifications_are_idempotent() {
        let outputs = IndicatorOutputs::new();
        outputs.notify(PuzzleState::InProgress);
        outputs.notify(PuzzleState::InProgress);
        assert_eq!(
            outputs.current(),
            Some(Indicator::for_state(PuzzleState::InProgress))
        );
    }

    #[test]
    fn recording_outputs_keep_order() {
        let outputs = RecordingOutputs::new();
        outputs.notify(PuzzleState::Locked);
        outputs.notify(PuzzleState::InProgress);
        assert_eq!(
            outputs.states(),
            vec![PuzzleState::Locked, PuzzleState::InProgress]
        );
        assert_eq!(outputs.last(), Some(PuzzleState::InProgress));
    }
}
