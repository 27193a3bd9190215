//! Enumeration types for the Puzzlebox controller.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Puzzle state
// ---------------------------------------------------------------------------

/// High-level state of the puzzle.
///
/// Exactly one state is active at any time. [`PuzzleState::Solved`] is
/// terminal until an explicit reset.
///
/// Serialized as `"LOCKED"`, `"IN_PROGRESS"` and `"SOLVED"`, the strings
/// the dashboard and existing clients poll for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum PuzzleState {
    /// Waiting for the first player interaction.
    #[default]
    Locked,
    /// Started; steps are being evaluated against their deadlines.
    InProgress,
    /// Completed (or force-solved). Sticky until reset.
    Solved,
}

impl PuzzleState {
    /// The wire name of this state.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "LOCKED",
            Self::InProgress => "IN_PROGRESS",
            Self::Solved => "SOLVED",
        }
    }

    /// Whether no further transitions happen without a reset.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Solved)
    }
}

impl std::fmt::Display for PuzzleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Step kind
// ---------------------------------------------------------------------------

/// Discriminant of a [`StepSpec`](crate::StepSpec).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Satisfied by a discrete input/action signal.
    Input,
    /// Satisfied by submitting the expected answer.
    Math,
}

// ---------------------------------------------------------------------------
// Indicators
// ---------------------------------------------------------------------------

/// Colour of the status LED on the puzzle panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum LedColor {
    /// Idle / locked.
    Red,
    /// Accepting inputs.
    Yellow,
    /// Solved.
    Green,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_serializes_to_wire_names() {
        let json = serde_json::to_string(&PuzzleState::InProgress).unwrap_or_default();
        assert_eq!(json, "\"IN_PROGRESS\"");
        assert_eq!(PuzzleState::Locked.to_string(), "LOCKED");
        assert_eq!(PuzzleState::Solved.as_str(), "SOLVED");
    }

    #[test]
    fn only_solved_is_terminal() {
        assert!(!PuzzleState::Locked.is_terminal());
        assert!(!PuzzleState::InProgress.is_terminal());
        assert!(PuzzleState::Solved.is_terminal());
    }

    #[test]
    fn default_state_is_locked() {
        assert_eq!(PuzzleState::default(), PuzzleState::Locked);
    }
}
