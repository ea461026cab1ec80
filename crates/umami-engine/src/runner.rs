//! Task invocation plumbing: the single-attempt timed call, and the fan-out
//! barrier that runs branch calls concurrently.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use umami_task::{InvocationOutcome, TaskError, TaskInvocation, TaskInvoker};

use crate::error::EngineError;

/// Invoke a task once, under the per-task timeout. There are no retries: a
/// failure or timeout is final for the execution.
///
/// Always returns the audit record alongside the outcome, so the caller can
/// log every attempt including the failed ones.
pub(crate) async fn invoke_once(
  invoker: &dyn TaskInvoker,
  stage: &str,
  task: &str,
  branch: Option<usize>,
  input: Value,
  timeout: Duration,
) -> (TaskInvocation, Result<Value, EngineError>) {
  let started = Instant::now();
  let result = tokio::time::timeout(timeout, invoker.invoke(task, input.clone())).await;
  let duration_ms = started.elapsed().as_millis() as u64;

  let (outcome, result) = match result {
    Ok(Ok(output)) => (
      InvocationOutcome::Succeeded {
        output: output.clone(),
      },
      Ok(output),
    ),
    Ok(Err(err)) => (
      InvocationOutcome::Failed {
        payload: err.payload.clone(),
      },
      Err(EngineError::Task {
        stage: stage.to_string(),
        source: err,
      }),
    ),
    Err(_) => (
      InvocationOutcome::TimedOut,
      Err(EngineError::TaskTimeout {
        stage: stage.to_string(),
        task: task.to_string(),
        timeout_ms: timeout.as_millis() as u64,
      }),
    ),
  };

  let invocation = TaskInvocation {
    stage: stage.to_string(),
    task: task.to_string(),
    branch,
    input,
    outcome,
    duration_ms,
  };
  (invocation, result)
}

/// Run a fan-out stage: `branches` concurrent invocations of the same task,
/// each given its 0-based index under `index_param` on top of the shared
/// resolved input.
///
/// All branches are awaited even when one fails; the stage then fails with
/// the lowest-indexed branch error, and no partial result list is produced.
/// On success the branch outputs are assembled into a list ordered by branch
/// index.
pub(crate) async fn run_fan_out(
  invoker: Arc<dyn TaskInvoker>,
  stage: &str,
  task: &str,
  branches: usize,
  index_param: &str,
  base_input: Value,
  timeout: Duration,
  cancel: &CancellationToken,
) -> (Vec<TaskInvocation>, Result<Value, EngineError>) {
  let mut handles = Vec::with_capacity(branches);
  for branch in 0..branches {
    let invoker = invoker.clone();
    let stage = stage.to_string();
    let task = task.to_string();
    let input = branch_input(&base_input, index_param, branch);
    handles.push(tokio::spawn(async move {
      invoke_once(invoker.as_ref(), &stage, &task, Some(branch), input, timeout).await
    }));
  }

  let joined = tokio::select! {
    joined = futures::future::join_all(handles) => joined,
    _ = cancel.cancelled() => return (Vec::new(), Err(EngineError::Cancelled)),
  };

  let mut invocations = Vec::with_capacity(branches);
  let mut outputs = Vec::with_capacity(branches);
  let mut failure: Option<(usize, EngineError)> = None;

  for (branch, join_result) in joined.into_iter().enumerate() {
    match join_result {
      Ok((invocation, result)) => {
        invocations.push(invocation);
        match result {
          Ok(output) => outputs.push(output),
          Err(err) if failure.is_none() => failure = Some((branch, err)),
          Err(_) => {}
        }
      }
      Err(e) => {
        if failure.is_none() {
          failure = Some((
            branch,
            EngineError::Internal {
              message: format!("branch join error: {}", e),
            },
          ));
        }
      }
    }
  }

  match failure {
    Some((branch, err)) => (
      invocations,
      Err(EngineError::FanOut {
        stage: stage.to_string(),
        branch,
        source: Box::new(err),
      }),
    ),
    None => (invocations, Ok(Value::Array(outputs))),
  }
}

/// Overlay the branch index onto the shared resolved input document.
fn branch_input(base: &Value, index_param: &str, branch: usize) -> Value {
  let mut input = match base {
    Value::Object(map) => map.clone(),
    _ => serde_json::Map::new(),
  };
  input.insert(index_param.to_string(), Value::from(branch));
  Value::Object(input)
}
