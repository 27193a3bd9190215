//! The puzzle state machine.
//!
//! [`PuzzleMachine`] owns the puzzle state, the current step index and the
//! two deadline timestamps. It is advanced one tick at a time by
//! [`update`](PuzzleMachine::update), reads player input from an
//! [`InputSource`], reports state to an [`OutputSink`], and reads time
//! from a [`Clock`].
//!
//! # Tick semantics
//!
//! - `Solved`: nothing happens.
//! - `Locked`: any activation starts the puzzle; both deadlines start now.
//! - `InProgress`: the overall deadline is checked first and wins over
//!   anything else this tick. Then the current step is evaluated:
//!   - input step: satisfied when `(input, action)` is reported; otherwise
//!     it keeps waiting until its own deadline passes.
//!   - math step: a correct answer advances, a wrong answer resets
//!     immediately, no answer waits until the deadline passes.
//!
//! Every failure (either deadline, wrong answer) resets the puzzle.
//! The machine never returns errors.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use puzzlebox_types::{Answer, PuzzleState, PuzzleStatus, PuzzleTransition, StepSpec};
use tracing::{info, trace, warn};

use crate::clock::{duration_to_millis, Clock};
use crate::config::PuzzleConfig;
use crate::input::InputSource;
use crate::output::OutputSink;

/// Deadline anchors, present only while the puzzle is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Timing {
    puzzle_started_at: Duration,
    step_started_at: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Locked,
    Running(Timing),
    Solved,
}

/// Result of evaluating the current step for one tick.
enum StepOutcome {
    Pending,
    Satisfied,
    TimedOut,
    WrongAnswer(Answer),
}

/// The puzzle state machine.
///
/// Invariants:
/// - `Locked` implies step 0 and no timestamps.
/// - `InProgress` implies both timestamps, with the step anchor no earlier
///   than the puzzle anchor, and a step index inside the sequence.
/// - Reaching the end of the sequence implies `Solved`.
/// - `Solved` is left only through [`reset`](Self::reset).
pub struct PuzzleMachine {
    config: PuzzleConfig,
    inputs: Arc<dyn InputSource>,
    outputs: Arc<dyn OutputSink>,
    clock: Arc<dyn Clock>,
    phase: Phase,
    current_step: usize,
}

impl PuzzleMachine {
    /// Build a machine in the `Locked` state and notify the outputs of it.
    pub fn new(
        config: PuzzleConfig,
        inputs: Arc<dyn InputSource>,
        outputs: Arc<dyn OutputSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut machine = Self {
            config,
            inputs,
            outputs,
            clock,
            phase: Phase::Locked,
            current_step: 0,
        };
        machine.reset();
        machine
    }

    /// Advance the machine by one tick.
    ///
    /// Returns the transition taken this tick, if any. The return value is
    /// informational; ignoring it is fine.
    pub fn update(&mut self) -> Option<PuzzleTransition> {
        match self.phase {
            Phase::Solved => None,
            Phase::Locked => self.update_locked(),
            Phase::Running(timing) => self.update_running(timing),
        }
    }

    /// Return to `Locked` at step 0 with no timestamps, drop any unread
    /// answer, and notify the outputs. Always succeeds, from any state.
    pub fn reset(&mut self) {
        self.phase = Phase::Locked;
        self.current_step = 0;
        self.inputs.discard_pending();
        self.outputs.notify(PuzzleState::Locked);
        info!("Puzzle reset");
    }

    /// Jump straight to `Solved`, leaving the step index untouched, and
    /// notify the outputs. Idempotent.
    pub fn force_solve(&mut self) {
        self.phase = Phase::Solved;
        self.outputs.notify(PuzzleState::Solved);
        info!(step = self.current_step, "Puzzle force-solved");
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Current high-level state.
    pub const fn state(&self) -> PuzzleState {
        match self.phase {
            Phase::Locked => PuzzleState::Locked,
            Phase::Running(_) => PuzzleState::InProgress,
            Phase::Solved => PuzzleState::Solved,
        }
    }

    /// Zero-based index of the current step.
    pub const fn current_step(&self) -> usize {
        self.current_step
    }

    /// Number of configured steps.
    pub fn total_steps(&self) -> usize {
        self.config.step_count()
    }

    /// The configuration this machine runs.
    pub const fn config(&self) -> &PuzzleConfig {
        &self.config
    }

    /// The input source this machine polls.
    pub fn inputs(&self) -> &Arc<dyn InputSource> {
        &self.inputs
    }

    /// When the running puzzle started, on this machine's clock.
    pub const fn puzzle_started_at(&self) -> Option<Duration> {
        match self.phase {
            Phase::Running(timing) => Some(timing.puzzle_started_at),
            Phase::Locked | Phase::Solved => None,
        }
    }

    /// When the current step became current, on this machine's clock.
    pub const fn step_started_at(&self) -> Option<Duration> {
        match self.phase {
            Phase::Running(timing) => Some(timing.step_started_at),
            Phase::Locked | Phase::Solved => None,
        }
    }

    /// The question of the current step, while in progress on a math step.
    pub fn current_question(&self) -> Option<&str> {
        match self.phase {
            Phase::Running(_) => self
                .config
                .step(self.current_step)
                .and_then(StepSpec::question),
            Phase::Locked | Phase::Solved => None,
        }
    }

    /// Snapshot for polling clients.
    pub fn status(&self) -> PuzzleStatus {
        let (puzzle_remaining_ms, step_remaining_ms) = match self.phase {
            Phase::Running(timing) => {
                let now = self.clock.now();
                let puzzle_left = self
                    .config
                    .overall_timeout()
                    .saturating_sub(now.saturating_sub(timing.puzzle_started_at));
                let step_left = self.config.step(self.current_step).map(|step| {
                    step.max_delay()
                        .saturating_sub(now.saturating_sub(timing.step_started_at))
                });
                (
                    Some(duration_to_millis(puzzle_left)),
                    step_left.map(duration_to_millis),
                )
            }
            Phase::Locked | Phase::Solved => (None, None),
        };

        PuzzleStatus {
            state: self.state(),
            step: self.current_step,
            total_steps: self.total_steps(),
            question: self.current_question().unwrap_or_default().to_owned(),
            puzzle_remaining_ms,
            step_remaining_ms,
        }
    }

    // -----------------------------------------------------------------------
    // Tick handling
    // -----------------------------------------------------------------------

    fn update_locked(&mut self) -> Option<PuzzleTransition> {
        if !self.inputs.any_active() {
            return None;
        }

        let now = self.clock.now();
        self.phase = Phase::Running(Timing {
            puzzle_started_at: now,
            step_started_at: now,
        });
        self.outputs.notify(PuzzleState::InProgress);
        info!(total_steps = self.total_steps(), "Puzzle started");
        Some(PuzzleTransition::Started)
    }

    fn update_running(&mut self, timing: Timing) -> Option<PuzzleTransition> {
        let now = self.clock.now();
        let step = self.current_step;

        if now.saturating_sub(timing.puzzle_started_at) > self.config.overall_timeout() {
            warn!(
                step,
                timeout_ms = duration_to_millis(self.config.overall_timeout()),
                "Puzzle timeout"
            );
            self.reset();
            return Some(PuzzleTransition::OverallTimeout { step });
        }

        let waited = now.saturating_sub(timing.step_started_at);
        let outcome = match self.config.step(step) {
            Some(spec) => evaluate_step(spec, self.inputs.as_ref(), waited),
            None => {
                // Unreachable while the invariants hold; recover rather than stall.
                warn!(step, "Step index out of range while in progress");
                self.reset();
                return None;
            }
        };

        match outcome {
            StepOutcome::Pending => {
                trace!(step, waited_ms = duration_to_millis(waited), "Waiting on step");
                None
            }
            StepOutcome::Satisfied => Some(self.advance(timing, now)),
            StepOutcome::TimedOut => {
                warn!(step, waited_ms = duration_to_millis(waited), "Step timeout");
                self.reset();
                Some(PuzzleTransition::StepTimeout { step })
            }
            StepOutcome::WrongAnswer(submitted) => {
                warn!(step, %submitted, "Wrong answer");
                self.reset();
                Some(PuzzleTransition::WrongAnswer { step, submitted })
            }
        }
    }

    /// Complete the current step and either start the next one or solve.
    fn advance(&mut self, timing: Timing, now: Duration) -> PuzzleTransition {
        let completed = self.current_step;
        self.current_step = completed.saturating_add(1);
        info!(step = completed, "Step completed");

        if self.current_step >= self.total_steps() {
            self.phase = Phase::Solved;
            self.outputs.notify(PuzzleState::Solved);
            info!("Puzzle solved");
            return PuzzleTransition::Solved;
        }

        self.phase = Phase::Running(Timing {
            step_started_at: now,
            ..timing
        });
        PuzzleTransition::StepCompleted { step: completed }
    }
}

/// Decide what the current step does this tick.
fn evaluate_step(spec: &StepSpec, inputs: &dyn InputSource, waited: Duration) -> StepOutcome {
    match spec {
        StepSpec::Input {
            input,
            action,
            max_delay,
        } => {
            if inputs.check(input, action) {
                StepOutcome::Satisfied
            } else if waited > *max_delay {
                StepOutcome::TimedOut
            } else {
                StepOutcome::Pending
            }
        }
        StepSpec::Math {
            expected,
            max_delay,
            ..
        } => match inputs.pending_answer() {
            Some(answer) if answer == *expected => StepOutcome::Satisfied,
            Some(answer) => StepOutcome::WrongAnswer(answer),
            None if waited > *max_delay => StepOutcome::TimedOut,
            None => StepOutcome::Pending,
        },
    }
}

impl fmt::Debug for PuzzleMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PuzzleMachine")
            .field("state", &self.state())
            .field("current_step", &self.current_step)
            .field("total_steps", &self.total_steps())
            .field("puzzle_started_at", &self.puzzle_started_at())
            .field("step_started_at", &self.step_started_at())
            .finish_non_exhaustive()
    }
}
