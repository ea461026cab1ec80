mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use umami_engine::{EngineConfig, ExecutionEngine, ExecutionStatus};
use umami_pipeline::{Binding, PipelineDefinition, Stage};
use umami_task::TaskError;

use common::MockInvoker;

fn fan_out_pipeline(branches: usize) -> PipelineDefinition {
  PipelineDefinition::new(
    "p",
    "fan out",
    vec![
      Stage::fan_out("GenImg", "gen_img", branches, "ParallelIndex", "Images", [
        ("Prompt", Binding::literal("a bowl of ramen")),
      ]),
      Stage::terminal("Publish", "publish", [("Images", Binding::path("Images"))]),
    ],
    60_000,
  )
}

#[tokio::test]
async fn branch_results_are_ordered_by_index() {
  // Later branches finish first; the result list must still be index-ordered.
  let invoker = MockInvoker::new()
    .on("gen_img", |input| async move {
      let index = input["ParallelIndex"].as_u64().unwrap();
      tokio::time::sleep(Duration::from_millis(40 - 10 * index)).await;
      Ok(json!({"ImgKey": format!("img_{index}.png")}))
    })
    .on_ok("publish", json!({}));

  let engine = ExecutionEngine::new(invoker.into_arc(), EngineConfig::default());
  let execution = engine
    .execute(&fan_out_pipeline(4), json!({}), CancellationToken::new())
    .await;

  assert_eq!(execution.status, ExecutionStatus::Succeeded);
  assert_eq!(
    execution.context.slots().get("Images"),
    Some(&json!([
      {"ImgKey": "img_0.png"},
      {"ImgKey": "img_1.png"},
      {"ImgKey": "img_2.png"},
      {"ImgKey": "img_3.png"},
    ]))
  );

  // One record per branch plus the terminal call.
  assert_eq!(execution.invocations.len(), 5);
  let branches: Vec<_> = execution.invocations[..4].iter().map(|i| i.branch).collect();
  assert_eq!(branches, vec![Some(0), Some(1), Some(2), Some(3)]);
}

#[tokio::test]
async fn each_branch_sees_its_own_index() {
  let seen = Arc::new(Mutex::new(Vec::new()));
  let record = seen.clone();
  let invoker = MockInvoker::new()
    .on("gen_img", move |input| {
      let record = record.clone();
      async move {
        record.lock().unwrap().push(input.clone());
        Ok(json!({"ImgKey": "x"}))
      }
    })
    .on_ok("publish", json!({}));

  let engine = ExecutionEngine::new(invoker.into_arc(), EngineConfig::default());
  let execution = engine
    .execute(&fan_out_pipeline(3), json!({}), CancellationToken::new())
    .await;
  assert!(execution.succeeded());

  let mut indexes: Vec<u64> = seen
    .lock()
    .unwrap()
    .iter()
    .map(|input| {
      // Shared bindings are identical across branches.
      assert_eq!(input["Prompt"], json!("a bowl of ramen"));
      input["ParallelIndex"].as_u64().unwrap()
    })
    .collect();
  indexes.sort_unstable();
  assert_eq!(indexes, vec![0, 1, 2]);
}

#[tokio::test]
async fn one_failed_branch_fails_the_stage() {
  let published = Arc::new(Mutex::new(0));
  let counter = published.clone();
  let invoker = MockInvoker::new()
    .on("gen_img", |input| async move {
      match input["ParallelIndex"].as_u64().unwrap() {
        2 => Err(TaskError::new("gen_img", json!({"Code": "ContentPolicy"}))),
        index => Ok(json!({"ImgKey": format!("img_{index}.png")})),
      }
    })
    .on("publish", move |_| {
      let counter = counter.clone();
      async move {
        *counter.lock().unwrap() += 1;
        Ok(json!({}))
      }
    });

  let engine = ExecutionEngine::new(invoker.into_arc(), EngineConfig::default());
  let execution = engine
    .execute(&fan_out_pipeline(4), json!({}), CancellationToken::new())
    .await;

  assert_eq!(execution.status, ExecutionStatus::Failed);
  // No partial list is written and the terminal stage never runs.
  assert!(execution.context.slots().get("Images").is_none());
  assert_eq!(*published.lock().unwrap(), 0);

  // Every branch was awaited and recorded, the failed one included.
  assert_eq!(execution.invocations.len(), 4);
  assert_eq!(execution.invocations.iter().filter(|i| i.succeeded()).count(), 3);

  let failure = execution.failure.unwrap().to_string();
  assert!(failure.contains("branch 2"), "unexpected failure: {failure}");
}

#[tokio::test]
async fn lowest_indexed_branch_failure_wins() {
  let invoker = MockInvoker::new().on("gen_img", |input| async move {
    let index = input["ParallelIndex"].as_u64().unwrap();
    if index >= 1 {
      Err(TaskError::new("gen_img", json!({"Branch": index})))
    } else {
      Ok(json!({"ImgKey": "img_0.png"}))
    }
  });

  let engine = ExecutionEngine::new(invoker.into_arc(), EngineConfig::default());
  let execution = engine
    .execute(&fan_out_pipeline(4), json!({}), CancellationToken::new())
    .await;

  let failure = execution.failure.unwrap().to_string();
  assert!(failure.contains("branch 1"), "unexpected failure: {failure}");
}
