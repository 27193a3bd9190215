//! Shared, serialized access to the puzzle machine.
//!
//! The driver loop and the control surface both act on the same
//! [`PuzzleMachine`]. [`PuzzleController`] wraps it in a single async
//! mutex so ticks and operator commands never interleave, and records
//! every transition into a bounded event log and a broadcast channel for
//! live subscribers.

use std::collections::VecDeque;
use std::sync::Arc;

use puzzlebox_types::{
    Answer, PuzzleEvent, PuzzleState, PuzzleStatus, PuzzleTransition, PuzzleUpdate, StepKind,
};
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use crate::input::PanelInputs;
use crate::machine::PuzzleMachine;

/// Number of recent events kept in memory.
pub const MAX_EVENTS: usize = 100;

/// Capacity of the live update channel.
const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Serialized owner of the [`PuzzleMachine`].
#[derive(Debug)]
pub struct PuzzleController {
    machine: Mutex<PuzzleMachine>,
    events: Mutex<VecDeque<PuzzleEvent>>,
    updates: broadcast::Sender<PuzzleUpdate>,
}

impl PuzzleController {
    /// Take ownership of a machine.
    pub fn new(machine: PuzzleMachine) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            machine: Mutex::new(machine),
            events: Mutex::new(VecDeque::with_capacity(MAX_EVENTS)),
            updates,
        }
    }

    /// Run one machine tick inside a poll window of its input source.
    ///
    /// Returns the recorded event if the tick caused a transition.
    pub async fn tick(&self) -> Option<PuzzleEvent> {
        let mut machine = self.machine.lock().await;
        let inputs = Arc::clone(machine.inputs());
        inputs.begin_poll();
        let transition = machine.update();
        inputs.end_poll();

        match transition {
            Some(transition) => Some(self.record(&machine, transition).await),
            None => None,
        }
    }

    /// Operator reset: back to `Locked` from any state.
    pub async fn reset(&self) -> PuzzleEvent {
        let mut machine = self.machine.lock().await;
        machine.reset();
        self.record(&machine, PuzzleTransition::OperatorReset).await
    }

    /// Operator override: jump to `Solved` from any state.
    pub async fn force_solve(&self) -> PuzzleEvent {
        let mut machine = self.machine.lock().await;
        let step = machine.current_step();
        machine.force_solve();
        self.record(&machine, PuzzleTransition::ForceSolved { step })
            .await
    }

    /// Current status snapshot.
    pub async fn status(&self) -> PuzzleStatus {
        self.machine.lock().await.status()
    }

    /// The index of the math step currently waiting for an answer, if any.
    pub async fn awaiting_answer(&self) -> Option<usize> {
        awaiting_step(&*self.machine.lock().await)
    }

    /// Store `answer` for the math step currently waiting for one.
    ///
    /// The step check and the store happen under the machine lock, so no
    /// tick or operator reset can slip in between. Returns the step index,
    /// or `None` (answer dropped) when no math step is waiting.
    pub async fn submit_answer(&self, panel: &PanelInputs, answer: Answer) -> Option<usize> {
        let machine = self.machine.lock().await;
        let step = awaiting_step(&machine)?;
        panel.submit_answer(answer);
        Some(step)
    }

    /// Up to `limit` most recent events, oldest first.
    pub async fn recent_events(&self, limit: usize) -> Vec<PuzzleEvent> {
        let events = self.events.lock().await;
        let skip = events.len().saturating_sub(limit);
        events.iter().skip(skip).cloned().collect()
    }

    /// Subscribe to live updates, one per recorded transition.
    pub fn subscribe(&self) -> broadcast::Receiver<PuzzleUpdate> {
        self.updates.subscribe()
    }

    /// Store and publish a transition while the machine lock is held, so
    /// the log order matches the order transitions happened in.
    async fn record(&self, machine: &PuzzleMachine, transition: PuzzleTransition) -> PuzzleEvent {
        let event = PuzzleEvent::record(transition);

        {
            let mut events = self.events.lock().await;
            if events.len() >= MAX_EVENTS {
                let _ = events.pop_front();
            }
            events.push_back(event.clone());
        }

        let update = PuzzleUpdate {
            event: event.clone(),
            status: machine.status(),
        };
        // No subscribers is fine.
        if self.updates.send(update).is_err() {
            debug!("No live subscribers for puzzle update");
        }

        event
    }
}

fn awaiting_step(machine: &PuzzleMachine) -> Option<usize> {
    if machine.state() != PuzzleState::InProgress {
        return None;
    }
    let step = machine.current_step();
    machine
        .config()
        .step(step)
        .filter(|spec| spec.kind() == StepKind::Math)
        .map(|_| step)
}
