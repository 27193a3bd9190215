//! Puzzle state machine and driver loop for the Puzzlebox controller.
//!
//! This crate owns the puzzle logic: the ordered step sequence, step and
//! overall deadlines, and the `Locked -> InProgress -> Solved` lifecycle.
//! Everything it talks to is behind a trait so the machine can be driven
//! deterministically in tests.
//!
//! # Modules
//!
//! - [`clock`] -- Monotonic time source ([`Clock`](clock::Clock)) with a
//!   wall-clock and a manually advanced implementation.
//! - [`config`] -- Loading `puzzle-config.yaml` and validating it into an
//!   immutable [`PuzzleConfig`](config::PuzzleConfig).
//! - [`input`] -- [`InputSource`](input::InputSource) trait, the pending
//!   answer slot, and the software input panel.
//! - [`output`] -- [`OutputSink`](output::OutputSink) trait and the
//!   indicator driver.
//! - [`machine`] -- The [`PuzzleMachine`](machine::PuzzleMachine) itself.
//! - [`controller`] -- Shared, serialized access to the machine plus the
//!   event log and live update channel.
//! - [`driver`] -- Runtime control state for the driver loop.
//! - [`runner`] -- The fixed-cadence driver loop.

pub mod clock;
pub mod config;
pub mod controller;
pub mod driver;
pub mod input;
pub mod machine;
pub mod output;
pub mod runner;
