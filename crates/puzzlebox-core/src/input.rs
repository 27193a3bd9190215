//! Input sources consumed by the puzzle state machine.
//!
//! The machine polls an [`InputSource`] once per tick. It never receives
//! callbacks: all input reaches it through these reads, which keeps the
//! machine logically single-threaded.
//!
//! [`PanelInputs`] is the software input panel used in simulation mode
//! and as the delivery point for answers submitted from the control
//! surface. Presses on the panel are momentary: a press latched between
//! two polls is visible to exactly one poll window.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use puzzlebox_types::{Answer, InputSignal};
use tracing::{debug, info};

/// A source of player input.
///
/// All reads are non-blocking. `pending_answer` has take semantics: once
/// an answer has been returned it is gone, so one submission can never
/// advance two steps.
pub trait InputSource: Send + Sync + fmt::Debug {
    /// Whether any input is currently active.
    fn any_active(&self) -> bool;

    /// Whether `input` currently reports `action`.
    fn check(&self, input: &str, action: &str) -> bool;

    /// Take the pending submitted answer, if any.
    fn pending_answer(&self) -> Option<Answer>;

    /// Drop any pending answer without reading it. Called on every reset so
    /// an answer meant for one run is never read by the next.
    fn discard_pending(&self) {}

    /// Called by the driver right before the machine reads this source.
    fn begin_poll(&self) {}

    /// Called by the driver right after the machine has read this source.
    fn end_poll(&self) {}
}

// ---------------------------------------------------------------------------
// Answer slot
// ---------------------------------------------------------------------------

/// Single-writer / single-consumer handoff for submitted answers.
///
/// Holds at most one answer. A new submission replaces an unread one;
/// reading clears the slot.
#[derive(Debug, Default)]
pub struct AnswerSlot {
    slot: Mutex<Option<Answer>>,
}

impl AnswerSlot {
    /// Create an empty slot.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Store `answer`, returning the unread answer it replaced.
    pub fn submit(&self, answer: Answer) -> Option<Answer> {
        self.lock().replace(answer)
    }

    /// Remove and return the stored answer.
    pub fn take(&self) -> Option<Answer> {
        self.lock().take()
    }

    /// Whether an unread answer is waiting.
    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Answer>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Software panel
// ---------------------------------------------------------------------------

/// Error returned when a software trigger is not allowed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TriggerError {
    /// The panel was created with simulation disabled.
    #[error("simulation mode is disabled; inputs come from hardware only")]
    SimulationDisabled,

    /// The input name was empty.
    #[error("input name must not be empty")]
    EmptyInput,
}

#[derive(Debug, Default)]
struct Latch {
    /// Presses latched since the last poll window opened.
    waiting: BTreeSet<InputSignal>,
    /// Presses visible to the poll window in progress.
    visible: BTreeSet<InputSignal>,
}

/// Software input panel.
///
/// In simulation mode, operators (or tests) press inputs with
/// [`trigger`](Self::trigger). A press waits until the next
/// [`begin_poll`](InputSource::begin_poll), is visible to that poll, and
/// is released by the matching [`end_poll`](InputSource::end_poll).
/// Answers are accepted regardless of simulation mode.
#[derive(Debug)]
pub struct PanelInputs {
    simulation: bool,
    latch: Mutex<Latch>,
    answers: AnswerSlot,
}

impl PanelInputs {
    /// Create a panel. `simulation` controls whether triggers are accepted.
    pub fn new(simulation: bool) -> Self {
        Self {
            simulation,
            latch: Mutex::new(Latch::default()),
            answers: AnswerSlot::new(),
        }
    }

    /// Whether software triggers are accepted.
    pub const fn simulation(&self) -> bool {
        self.simulation
    }

    /// Press `input` with `action` for the next poll window.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::SimulationDisabled`] when simulation is off
    /// and [`TriggerError::EmptyInput`] for a blank input name.
    pub fn trigger(&self, input: &str, action: &str) -> Result<(), TriggerError> {
        if !self.simulation {
            return Err(TriggerError::SimulationDisabled);
        }
        if input.trim().is_empty() {
            return Err(TriggerError::EmptyInput);
        }
        info!(input, action, "Simulated input triggered");
        self.lock().waiting.insert(InputSignal::new(input, action));
        Ok(())
    }

    /// Release every latched press.
    pub fn clear(&self) {
        let mut latch = self.lock();
        latch.waiting.clear();
        latch.visible.clear();
        debug!("Simulated inputs cleared");
    }

    /// Presses waiting for the next poll window.
    pub fn waiting(&self) -> Vec<InputSignal> {
        self.lock().waiting.iter().cloned().collect()
    }

    /// Deliver a submitted answer. Correctness is decided by the machine
    /// on its next update.
    pub fn submit_answer(&self, answer: Answer) {
        if let Some(replaced) = self.answers.submit(answer) {
            debug!(%replaced, %answer, "Unread answer replaced");
        }
        info!(%answer, "Answer submitted");
    }

    /// Whether a submitted answer has not been read yet.
    pub fn answer_pending(&self) -> bool {
        self.answers.is_pending()
    }

    fn lock(&self) -> MutexGuard<'_, Latch> {
        self.latch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InputSource for PanelInputs {
    fn any_active(&self) -> bool {
        !self.lock().visible.is_empty()
    }

    fn check(&self, input: &str, action: &str) -> bool {
        self.lock()
            .visible
            .iter()
            .any(|signal| signal.matches(input, action))
    }

    fn pending_answer(&self) -> Option<Answer> {
        self.answers.take()
    }

    fn discard_pending(&self) {
        if let Some(dropped) = self.answers.take() {
            debug!(%dropped, "Unread answer discarded");
        }
    }

    fn begin_poll(&self) {
        let mut latch = self.lock();
        let waiting = std::mem::take(&mut latch.waiting);
        latch.visible.extend(waiting);
    }

    fn end_poll(&self) {
        self.lock().visible.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn answer_slot_is_consumed_once() {
        let slot = AnswerSlot::new();
        assert_eq!(slot.take(), None);
        assert_eq!(slot.submit(Answer::from(4)), None);
        assert!(slot.is_pending());
        assert_eq!(slot.take(), Some(Answer::from(4)));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn answer_slot_keeps_latest_submission() {
        let slot = AnswerSlot::new();
        let _ = slot.submit(Answer::from(1));
        assert_eq!(slot.submit(Answer::from(2)), Some(Answer::from(1)));
        assert_eq!(slot.take(), Some(Answer::from(2)));
    }

    #[test]
    fn press_is_visible_for_exactly_one_poll() {
        let panel = PanelInputs::new(true);
        panel.trigger("btn", "press").unwrap();

        // Not visible until a poll window opens.
        assert!(!panel.any_active());

        panel.begin_poll();
        assert!(panel.any_active());
        assert!(panel.check("btn", "press"));
        panel.end_poll();

        panel.begin_poll();
        assert!(!panel.any_active());
        assert!(!panel.check("btn", "press"));
        panel.end_poll();
    }

    #[test]
    fn press_during_poll_waits_for_next_window() {
        let panel = PanelInputs::new(true);
        panel.begin_poll();
        panel.trigger("btn", "press").unwrap();
        assert!(!panel.check("btn", "press"));
        panel.end_poll();

        panel.begin_poll();
        assert!(panel.check("btn", "press"));
        panel.end_poll();
    }

    #[test]
    fn check_requires_matching_action() {
        let panel = PanelInputs::new(true);
        panel.trigger("btn", "hold").unwrap();
        panel.begin_poll();
        assert!(panel.any_active());
        assert!(!panel.check("btn", "press"));
        assert!(panel.check("btn", "hold"));
    }

    #[test]
    fn trigger_rejected_without_simulation() {
        let panel = PanelInputs::new(false);
        assert_eq!(
            panel.trigger("btn", "press"),
            Err(TriggerError::SimulationDisabled)
        );
        panel.submit_answer(Answer::from(7));
        assert_eq!(panel.pending_answer(), Some(Answer::from(7)));
    }

    #[test]
    fn blank_input_is_rejected() {
        let panel = PanelInputs::new(true);
        assert_eq!(panel.trigger("  ", "press"), Err(TriggerError::EmptyInput));
    }

    #[test]
    fn clear_drops_waiting_presses() {
        let panel = PanelInputs::new(true);
        panel.trigger("btn", "press").unwrap();
        assert_eq!(panel.waiting().len(), 1);
        panel.clear();
        assert!(panel.waiting().is_empty());
        panel.begin_poll();
        assert!(!panel.any_active());
    }

    #[test]
    fn discard_pending_drops_unread_answer() {
        let panel = PanelInputs::new(true);
        panel.submit_answer(Answer::from(4));
        panel.discard_pending();
        assert!(!panel.answer_pending());
        assert_eq!(panel.pending_answer(), None);

        // Discarding an empty slot is harmless.
        panel.discard_pending();
        assert_eq!(panel.pending_answer(), None);
    }
}
