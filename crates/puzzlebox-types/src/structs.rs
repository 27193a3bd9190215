//! Core structs shared across the Puzzlebox workspace.
//!
//! [`StepSpec`] and [`Answer`] describe the configured puzzle. The
//! remaining types are payloads produced by the state machine and served
//! by the control surface: [`PuzzleStatus`] for polling clients,
//! [`PuzzleTransition`] / [`PuzzleEvent`] for the event log and live
//! stream, and [`Indicator`] for the physical outputs.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::enums::{LedColor, PuzzleState, StepKind};

// ---------------------------------------------------------------------------
// Answers
// ---------------------------------------------------------------------------

/// A numeric answer to a math step.
///
/// Backed by [`Decimal`] so comparison is exact: `4`, `4.0` and `"4"` are
/// all the same answer. Deserializes from a number or a numeric string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Answer(#[ts(as = "String")] Decimal);

impl Answer {
    /// Wrap a decimal value.
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// The underlying decimal value.
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl From<i64> for Answer {
    fn from(value: i64) -> Self {
        Self(Decimal::from(value))
    }
}

impl From<Decimal> for Answer {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Error returned when a string is not a valid numeric answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a numeric answer: {input:?}")]
pub struct AnswerParseError {
    /// The rejected input, trimmed.
    pub input: String,
}

impl FromStr for Answer {
    type Err = AnswerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Decimal::from_str(trimmed)
            .map(Self)
            .map_err(|_err| AnswerParseError {
                input: trimmed.to_owned(),
            })
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// One required player action in the ordered puzzle sequence.
///
/// Immutable once loaded. Every variant carries a positive `max_delay`
/// (enforced when the configuration is validated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepSpec {
    /// Satisfied when the named input reports the named action.
    Input {
        /// Identifier of the input device (button, sensor, switch).
        input: String,
        /// Expected action on that input (press, toggle, hold).
        action: String,
        /// Time allowed to satisfy this step once it becomes current.
        max_delay: Duration,
    },
    /// Satisfied when the submitted answer equals `expected`.
    Math {
        /// Question shown on the dashboard while this step is current.
        question: String,
        /// The correct answer.
        expected: Answer,
        /// Time allowed to submit an answer once this step becomes current.
        max_delay: Duration,
    },
}

impl StepSpec {
    /// The per-step deadline.
    pub const fn max_delay(&self) -> Duration {
        match self {
            Self::Input { max_delay, .. } | Self::Math { max_delay, .. } => *max_delay,
        }
    }

    /// The kind discriminant of this step.
    pub const fn kind(&self) -> StepKind {
        match self {
            Self::Input { .. } => StepKind::Input,
            Self::Math { .. } => StepKind::Math,
        }
    }

    /// The display question, for math steps only.
    pub fn question(&self) -> Option<&str> {
        match self {
            Self::Input { .. } => None,
            Self::Math { question, .. } => Some(question),
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// A named input together with the action performed on it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InputSignal {
    /// Identifier of the input device.
    pub input: String,
    /// Action performed on the device.
    pub action: String,
}

impl InputSignal {
    /// Build a signal from borrowed names.
    pub fn new(input: &str, action: &str) -> Self {
        Self {
            input: input.to_owned(),
            action: action.to_owned(),
        }
    }

    /// Whether this signal satisfies the given input/action pair.
    pub fn matches(&self, input: &str, action: &str) -> bool {
        self.input == input && self.action == action
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// The physical indication for a puzzle state: LED colour and lock relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Indicator {
    /// Status LED colour.
    pub led: LedColor,
    /// Whether the door relay is engaged (lock released).
    pub relay_engaged: bool,
}

impl Indicator {
    /// The indication that corresponds to `state`.
    pub const fn for_state(state: PuzzleState) -> Self {
        match state {
            PuzzleState::Locked => Self {
                led: LedColor::Red,
                relay_engaged: false,
            },
            PuzzleState::InProgress => Self {
                led: LedColor::Yellow,
                relay_engaged: false,
            },
            PuzzleState::Solved => Self {
                led: LedColor::Green,
                relay_engaged: true,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Snapshot of the machine served to polling clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PuzzleStatus {
    /// Current puzzle state.
    pub state: PuzzleState,
    /// Zero-based index of the current step.
    pub step: usize,
    /// Number of configured steps.
    pub total_steps: usize,
    /// Question of the current math step while in progress; empty otherwise.
    pub question: String,
    /// Milliseconds left before the overall deadline (in progress only).
    pub puzzle_remaining_ms: Option<u64>,
    /// Milliseconds left before the current step's deadline (in progress only).
    pub step_remaining_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Transitions and events
// ---------------------------------------------------------------------------

/// An edge taken by the state machine.
///
/// Steps are zero-based indices into the configured sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PuzzleTransition {
    /// First activation while locked; the puzzle clock started.
    Started,
    /// A step was satisfied and the next one became current.
    StepCompleted {
        /// The step that was completed.
        step: usize,
    },
    /// The last step was satisfied.
    Solved,
    /// The overall deadline passed; the puzzle was reset.
    OverallTimeout {
        /// The step that was current when time ran out.
        step: usize,
    },
    /// The current step's deadline passed; the puzzle was reset.
    StepTimeout {
        /// The step that timed out.
        step: usize,
    },
    /// A wrong answer was submitted; the puzzle was reset.
    WrongAnswer {
        /// The math step that was answered.
        step: usize,
        /// The rejected answer.
        submitted: Answer,
    },
    /// An operator reset the puzzle.
    OperatorReset,
    /// An operator forced the puzzle into the solved state.
    ForceSolved {
        /// The step that was current when the override happened.
        step: usize,
    },
}

impl PuzzleTransition {
    /// The state the machine is in after this transition.
    pub const fn resulting_state(&self) -> PuzzleState {
        match self {
            Self::Started | Self::StepCompleted { .. } => PuzzleState::InProgress,
            Self::Solved | Self::ForceSolved { .. } => PuzzleState::Solved,
            Self::OverallTimeout { .. }
            | Self::StepTimeout { .. }
            | Self::WrongAnswer { .. }
            | Self::OperatorReset => PuzzleState::Locked,
        }
    }

    /// Whether this transition was caused by a player failure.
    pub const fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::OverallTimeout { .. } | Self::StepTimeout { .. } | Self::WrongAnswer { .. }
        )
    }
}

/// A recorded transition with identity and wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PuzzleEvent {
    /// Unique, time-ordered identifier.
    pub id: Uuid,
    /// What happened.
    pub transition: PuzzleTransition,
    /// Machine state after the transition.
    pub state: PuzzleState,
    /// When the transition was recorded.
    pub created_at: DateTime<Utc>,
}

impl PuzzleEvent {
    /// Stamp a transition with a fresh id and the current time.
    pub fn record(transition: PuzzleTransition) -> Self {
        let state = transition.resulting_state();
        Self {
            id: Uuid::now_v7(),
            transition,
            state,
            created_at: Utc::now(),
        }
    }
}

/// A recorded event together with the status it produced.
///
/// Pushed to live subscribers after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PuzzleUpdate {
    /// The transition that just happened.
    pub event: PuzzleEvent,
    /// Machine status right after the transition.
    pub status: PuzzleStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn answers_compare_by_value() {
        let four: Answer = "4".parse().unwrap();
        let four_point_oh: Answer = " 4.0 ".parse().unwrap();
        assert_eq!(four, four_point_oh);
        assert_eq!(four, Answer::from(4));
        assert_ne!(four, Answer::from(3));
    }

    #[test]
    fn answer_rejects_non_numeric_input() {
        let err = "four".parse::<Answer>().unwrap_err();
        assert_eq!(err.input, "four");
    }

    #[test]
    fn answer_deserializes_from_number_or_string() {
        let from_number: Answer = serde_json::from_str("12").unwrap();
        let from_string: Answer = serde_json::from_str("\"12\"").unwrap();
        let negative: Answer = serde_json::from_str("-2.5").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(negative, "-2.5".parse().unwrap());
        assert_eq!(Answer::from(12).to_string(), "12");
    }

    #[test]
    fn step_accessors() {
        let input = StepSpec::Input {
            input: "btn".to_owned(),
            action: "press".to_owned(),
            max_delay: Duration::from_secs(5),
        };
        let math = StepSpec::Math {
            question: "2+2?".to_owned(),
            expected: Answer::from(4),
            max_delay: Duration::from_secs(10),
        };
        assert_eq!(input.kind(), StepKind::Input);
        assert_eq!(input.question(), None);
        assert_eq!(input.max_delay(), Duration::from_secs(5));
        assert_eq!(math.kind(), StepKind::Math);
        assert_eq!(math.question(), Some("2+2?"));
        assert_eq!(math.max_delay(), Duration::from_secs(10));
    }

    #[test]
    fn signal_matching_requires_input_and_action() {
        let signal = InputSignal::new("btn", "press");
        assert!(signal.matches("btn", "press"));
        assert!(!signal.matches("btn", "hold"));
        assert!(!signal.matches("lever", "press"));
    }

    #[test]
    fn indicators_follow_state() {
        assert_eq!(Indicator::for_state(PuzzleState::Locked).led, LedColor::Red);
        assert_eq!(
            Indicator::for_state(PuzzleState::InProgress).led,
            LedColor::Yellow
        );
        let solved = Indicator::for_state(PuzzleState::Solved);
        assert_eq!(solved.led, LedColor::Green);
        assert!(solved.relay_engaged);
    }

    #[test]
    fn transitions_know_their_resulting_state() {
        assert_eq!(
            PuzzleTransition::Started.resulting_state(),
            PuzzleState::InProgress
        );
        assert_eq!(
            PuzzleTransition::ForceSolved { step: 0 }.resulting_state(),
            PuzzleState::Solved
        );
        let wrong = PuzzleTransition::WrongAnswer {
            step: 1,
            submitted: Answer::from(3),
        };
        assert_eq!(wrong.resulting_state(), PuzzleState::Locked);
        assert!(wrong.is_failure());
        assert!(!PuzzleTransition::OperatorReset.is_failure());
    }

    #[test]
    fn transition_serializes_with_type_tag() {
        let json = serde_json::to_value(PuzzleTransition::StepTimeout { step: 2 }).unwrap();
        assert_eq!(json["type"], "step_timeout");
        assert_eq!(json["step"], 2);
    }

    #[test]
    fn event_records_resulting_state() {
        let event = PuzzleEvent::record(PuzzleTransition::Solved);
        assert_eq!(event.state, PuzzleState::Solved);
    }
}
