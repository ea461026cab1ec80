mod common;

use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use umami_engine::{ChannelNotifier, EngineConfig, ExecutionEngine, ExecutionEvent};
use umami_pipeline::{Binding, PipelineDefinition, Stage};
use umami_task::TaskError;

use common::MockInvoker;

fn pipeline() -> PipelineDefinition {
  PipelineDefinition::new(
    "p",
    "events",
    vec![
      Stage::task("GenText", "gen_text", "GenTextResults", [
        ("DryRun", Binding::path("DryRun")),
      ]),
      Stage::terminal("Publish", "publish", Vec::<(String, Binding)>::new()),
    ],
    60_000,
  )
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ExecutionEvent>) -> Vec<ExecutionEvent> {
  let mut events = Vec::new();
  while let Ok(event) = rx.try_recv() {
    events.push(event);
  }
  events
}

#[tokio::test]
async fn successful_run_emits_the_full_sequence() {
  let (tx, mut rx) = mpsc::unbounded_channel();
  let invoker = MockInvoker::new()
    .on_ok("gen_text", json!({"DishName": "pho"}))
    .on_ok("publish", json!({}));
  let engine =
    ExecutionEngine::with_notifier(invoker.into_arc(), EngineConfig::default(), ChannelNotifier::new(tx));

  let execution = engine
    .execute(&pipeline(), json!({"DryRun": false}), CancellationToken::new())
    .await;
  assert!(execution.succeeded());

  let events = drain(&mut rx);
  let names: Vec<&str> = events
    .iter()
    .map(|e| match e {
      ExecutionEvent::ExecutionStarted { .. } => "started",
      ExecutionEvent::StageStarted { .. } => "stage_started",
      ExecutionEvent::StageCompleted { .. } => "stage_completed",
      ExecutionEvent::StageFailed { .. } => "stage_failed",
      ExecutionEvent::ExecutionSucceeded { .. } => "succeeded",
      ExecutionEvent::ExecutionFailed { .. } => "failed",
      ExecutionEvent::ExecutionTimedOut { .. } => "timed_out",
    })
    .collect();
  assert_eq!(
    names,
    vec![
      "started",
      "stage_started",
      "stage_completed",
      "stage_started",
      "stage_completed",
      "succeeded"
    ]
  );

  // Stage completion carries the task's output document.
  let stage_output = events.iter().find_map(|e| match e {
    ExecutionEvent::StageCompleted { stage, output, .. } if stage == "GenText" => Some(output),
    _ => None,
  });
  assert_eq!(stage_output, Some(&json!({"DishName": "pho"})));

  // The terminal stage's output is carried too, even though it is never
  // written to the context.
  let terminal_output = events.iter().find_map(|e| match e {
    ExecutionEvent::StageCompleted { stage, output, .. } if stage == "Publish" => Some(output),
    _ => None,
  });
  assert_eq!(terminal_output, Some(&json!({})));
}

#[tokio::test]
async fn failed_stage_emits_failure_events() {
  let (tx, mut rx) = mpsc::unbounded_channel();
  let invoker = MockInvoker::new().on("gen_text", |_| async {
    Err(TaskError::new("gen_text", json!({"Code": "Throttled"})))
  });
  let engine =
    ExecutionEngine::with_notifier(invoker.into_arc(), EngineConfig::default(), ChannelNotifier::new(tx));

  let execution = engine
    .execute(&pipeline(), json!({"DryRun": false}), CancellationToken::new())
    .await;
  assert!(!execution.succeeded());

  let events = drain(&mut rx);
  assert!(events.iter().any(|e| matches!(
    e,
    ExecutionEvent::StageFailed { stage, .. } if stage == "GenText"
  )));
  assert!(matches!(events.last(), Some(ExecutionEvent::ExecutionFailed { .. })));
}
