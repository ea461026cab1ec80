use serde::{Deserialize, Serialize};

/// How one task invocation ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InvocationOutcome {
  /// The task returned an output document.
  Succeeded { output: serde_json::Value },
  /// The task reported a failure; payload carried verbatim.
  Failed { payload: serde_json::Value },
  /// The task did not respond within its allotted time.
  TimedOut,
}

/// Audit record of one call to an external task.
///
/// For a fan-out stage there are `branches` records, indexed 0-based; for
/// sequential stages `branch` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInvocation {
  /// The stage that issued the call.
  pub stage: String,
  /// The external task invoked.
  pub task: String,
  /// Branch index within a fan-out stage, if any.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub branch: Option<usize>,
  /// The resolved input document delivered to the task.
  pub input: serde_json::Value,
  /// Output document, error payload, or timeout.
  #[serde(flatten)]
  pub outcome: InvocationOutcome,
  /// Wall-clock duration of the call.
  pub duration_ms: u64,
}

impl TaskInvocation {
  /// Whether the invocation produced an output document.
  pub fn succeeded(&self) -> bool {
    matches!(self.outcome, InvocationOutcome::Succeeded { .. })
  }
}
