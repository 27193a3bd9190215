//! End-to-end puzzle scenarios through the controller.
//!
//! Uses the software input panel and a manually advanced clock, so every
//! deadline is hit exactly. Each test drives the same path the driver
//! loop does: trigger inputs, advance time, tick.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use puzzlebox_core::clock::{Clock, ManualClock};
use puzzlebox_core::config::PuzzleFile;
use puzzlebox_core::controller::PuzzleController;
use puzzlebox_core::input::{InputSource, PanelInputs};
use puzzlebox_core::machine::PuzzleMachine;
use puzzlebox_core::output::{OutputSink, RecordingOutputs};
use puzzlebox_types::{Answer, PuzzleState, PuzzleTransition};

const TWO_STEP_PUZZLE: &str = r#"
puzzle:
  timeout: 60
  sequence:
    - type: input
      input: btn
      action: press
      max_delay: 5
    - type: math
      question: "2+2?"
      answer: 4
      max_delay: 10
"#;

struct Bench {
    controller: PuzzleController,
    panel: Arc<PanelInputs>,
    outputs: Arc<RecordingOutputs>,
    clock: Arc<ManualClock>,
}

impl Bench {
    fn from_yaml(yaml: &str) -> Self {
        let config = PuzzleFile::parse(yaml).unwrap().validate().unwrap();
        let panel = Arc::new(PanelInputs::new(true));
        let outputs = Arc::new(RecordingOutputs::new());
        let clock = Arc::new(ManualClock::new());
        let machine = PuzzleMachine::new(
            config,
            Arc::clone(&panel) as Arc<dyn InputSource>,
            Arc::clone(&outputs) as Arc<dyn OutputSink>,
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        Self {
            controller: PuzzleController::new(machine),
            panel,
            outputs,
            clock,
        }
    }

    fn at(&self, secs: u64) {
        self.clock.set(Duration::from_secs(secs));
    }

    async fn press(&self, input: &str) -> Option<PuzzleTransition> {
        self.panel.trigger(input, "press").unwrap();
        self.tick().await
    }

    async fn answer(&self, value: i64) -> Option<PuzzleTransition> {
        self.panel.submit_answer(Answer::from(value));
        self.tick().await
    }

    async fn tick(&self) -> Option<PuzzleTransition> {
        self.controller.tick().await.map(|event| event.transition)
    }

    async fn state_and_step(&self) -> (PuzzleState, usize) {
        let status = self.controller.status().await;
        (status.state, status.step)
    }
}

#[tokio::test]
async fn wrong_answer_then_full_solve() {
    let bench = Bench::from_yaml(TWO_STEP_PUZZLE);

    bench.at(0);
    assert_eq!(bench.press("start").await, Some(PuzzleTransition::Started));
    assert_eq!(bench.state_and_step().await, (PuzzleState::InProgress, 0));

    bench.at(2);
    assert_eq!(
        bench.press("btn").await,
        Some(PuzzleTransition::StepCompleted { step: 0 })
    );
    let status = bench.controller.status().await;
    assert_eq!(status.step, 1);
    assert_eq!(status.question, "2+2?");

    bench.at(5);
    assert_eq!(
        bench.answer(3).await,
        Some(PuzzleTransition::WrongAnswer {
            step: 1,
            submitted: Answer::from(3),
        })
    );
    assert_eq!(bench.state_and_step().await, (PuzzleState::Locked, 0));

    bench.at(10);
    assert_eq!(bench.press("start").await, Some(PuzzleTransition::Started));

    bench.at(11);
    assert_eq!(
        bench.press("btn").await,
        Some(PuzzleTransition::StepCompleted { step: 0 })
    );
    assert_eq!(bench.state_and_step().await, (PuzzleState::InProgress, 1));

    bench.at(15);
    assert_eq!(bench.answer(4).await, Some(PuzzleTransition::Solved));
    assert_eq!(bench.state_and_step().await, (PuzzleState::Solved, 2));
    assert_eq!(bench.controller.status().await.question, "");

    assert_eq!(
        bench.outputs.states(),
        vec![
            PuzzleState::Locked,
            PuzzleState::InProgress,
            PuzzleState::Locked,
            PuzzleState::InProgress,
            PuzzleState::Solved,
        ]
    );

    let transitions: Vec<_> = bench
        .controller
        .recent_events(10)
        .await
        .into_iter()
        .map(|event| event.transition)
        .collect();
    assert_eq!(transitions.len(), 6);
    assert_eq!(transitions.last(), Some(&PuzzleTransition::Solved));
}

#[tokio::test]
async fn idle_step_times_out_and_resets() {
    let bench = Bench::from_yaml(TWO_STEP_PUZZLE);
    let _ = bench.press("start").await;

    bench.at(5);
    assert_eq!(bench.tick().await, None);
    bench.clock.advance(Duration::from_millis(100));
    assert_eq!(
        bench.tick().await,
        Some(PuzzleTransition::StepTimeout { step: 0 })
    );
    assert_eq!(bench.state_and_step().await, (PuzzleState::Locked, 0));
}

#[tokio::test]
async fn overall_timeout_beats_step_success_in_same_tick() {
    let bench = Bench::from_yaml(
        r"
puzzle:
  timeout: 8
  sequence:
    - type: input
      input: a
      action: press
      max_delay: 6
    - type: input
      input: b
      action: press
      max_delay: 6
",
    );
    let _ = bench.press("start").await;

    bench.at(5);
    assert_eq!(
        bench.press("a").await,
        Some(PuzzleTransition::StepCompleted { step: 0 })
    );

    bench.at(9);
    assert_eq!(
        bench.press("b").await,
        Some(PuzzleTransition::OverallTimeout { step: 1 })
    );
    assert_eq!(bench.state_and_step().await, (PuzzleState::Locked, 0));
}

#[tokio::test]
async fn solved_survives_time_and_input_until_reset() {
    let bench = Bench::from_yaml(TWO_STEP_PUZZLE);
    let _ = bench.press("start").await;
    let _ = bench.press("btn").await;
    assert_eq!(bench.answer(4).await, Some(PuzzleTransition::Solved));

    bench.at(3600);
    assert_eq!(bench.press("btn").await, None);
    assert_eq!(bench.state_and_step().await, (PuzzleState::Solved, 2));

    let _ = bench.controller.reset().await;
    assert_eq!(bench.state_and_step().await, (PuzzleState::Locked, 0));
    let status = bench.controller.status().await;
    assert_eq!(status.puzzle_remaining_ms, None);
    assert_eq!(status.step_remaining_ms, None);
}

#[tokio::test]
async fn force_solve_mid_step_keeps_index() {
    let bench = Bench::from_yaml(TWO_STEP_PUZZLE);
    let _ = bench.press("start").await;
    let _ = bench.press("btn").await;

    let event = bench.controller.force_solve().await;
    assert_eq!(event.transition, PuzzleTransition::ForceSolved { step: 1 });
    assert_eq!(bench.state_and_step().await, (PuzzleState::Solved, 1));
}

#[tokio::test]
async fn decimal_answers_compare_exactly() {
    let bench = Bench::from_yaml(
        r#"
puzzle:
  timeout: 60
  sequence:
    - type: math
      question: "0.1 + 0.2?"
      answer: "0.3"
      max_delay: 10
"#,
    );
    let _ = bench.press("start").await;
    bench.panel.submit_answer("0.30".parse().unwrap());
    assert_eq!(bench.tick().await, Some(PuzzleTransition::Solved));
}

#[tokio::test]
async fn operator_reset_drops_answer_meant_for_previous_run() {
    let bench = Bench::from_yaml(TWO_STEP_PUZZLE);
    let _ = bench.press("start").await;

    bench.at(2);
    let _ = bench.press("btn").await;
    assert_eq!(
        bench
            .controller
            .submit_answer(&bench.panel, Answer::from(4))
            .await,
        Some(1)
    );

    let event = bench.controller.reset().await;
    assert_eq!(event.transition, PuzzleTransition::OperatorReset);
    assert!(!bench.panel.answer_pending());

    bench.at(10);
    assert_eq!(bench.press("start").await, Some(PuzzleTransition::Started));
    bench.at(11);
    let _ = bench.press("btn").await;

    bench.at(12);
    assert_eq!(bench.tick().await, None);
    assert_eq!(bench.state_and_step().await, (PuzzleState::InProgress, 1));
}

#[tokio::test]
async fn overall_timeout_drops_unread_answer() {
    let bench = Bench::from_yaml(
        r#"
puzzle:
  timeout: 8
  sequence:
    - type: input
      input: a
      action: press
      max_delay: 6
    - type: math
      question: "2+2?"
      answer: 4
      max_delay: 10
"#,
    );
    let _ = bench.press("start").await;
    bench.at(5);
    let _ = bench.press("a").await;

    bench.at(9);
    assert_eq!(
        bench.answer(4).await,
        Some(PuzzleTransition::OverallTimeout { step: 1 })
    );
    assert!(!bench.panel.answer_pending());

    bench.at(10);
    let _ = bench.press("start").await;
    bench.at(11);
    let _ = bench.press("a").await;

    bench.at(12);
    assert_eq!(bench.tick().await, None);
    assert_eq!(bench.state_and_step().await, (PuzzleState::InProgress, 1));
}
