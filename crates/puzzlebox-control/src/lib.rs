//! Control surface for the Puzzlebox controller.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Status endpoints** (`/status`, `/api/status`) returning the puzzle
//!   state, step index and the current question
//! - **Operator endpoints** for reset, force-solve, answer submission and
//!   software input triggers
//! - **Driver endpoints** for reading and tuning the poll interval
//! - **`WebSocket` endpoint** (`/ws/status`) streaming every transition
//!   together with the status it produced
//! - **Minimal HTML dashboard** (`GET /`) for operators
//!
//! # Architecture
//!
//! Handlers never mutate the puzzle directly. Commands go through the
//! shared [`PuzzleController`](puzzlebox_core::controller::PuzzleController),
//! which serializes them with driver ticks. Answers and software presses
//! are dropped into the [`PanelInputs`](puzzlebox_core::input::PanelInputs)
//! and picked up by the machine on its next tick.

pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

pub use router::build_router;
pub use server::ServerError;
pub use startup::{spawn_control, StartupError};
pub use state::AppState;
