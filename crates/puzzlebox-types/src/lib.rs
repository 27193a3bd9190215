//! Shared type definitions for the Puzzlebox controller.
//!
//! This crate is the single source of truth for the types that cross crate
//! boundaries: the puzzle state, the configured step list, the status and
//! event payloads served by the control surface. Wire types flow to
//! `TypeScript` via `ts-rs` for the operator dashboard.
//!
//! # Modules
//!
//! - [`enums`] -- Puzzle state, step kind, and indicator colours
//! - [`structs`] -- Steps, answers, input signals, status and event payloads

pub mod enums;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{LedColor, PuzzleState, StepKind};
pub use structs::{
    Answer, AnswerParseError, Indicator, InputSignal, PuzzleEvent, PuzzleStatus,
    PuzzleTransition, PuzzleUpdate, StepSpec,
};

#[cfg(test)]
mod tests {
    //! Binding generation for the dashboard.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::enums::PuzzleState::export_all();
        let _ = crate::enums::LedColor::export_all();
        let _ = crate::structs::Indicator::export_all();
        let _ = crate::structs::PuzzleStatus::export_all();
        let _ = crate::structs::PuzzleTransition::export_all();
        let _ = crate::structs::PuzzleEvent::export_all();
        let _ = crate::structs::PuzzleUpdate::export_all();
        let _ = crate::structs::Answer::export_all();
    }
}
