use chrono::{DateTime, Utc};
use serde::Serialize;
use umami_task::TaskInvocation;

use crate::context::DataContext;
use crate::error::EngineError;

/// How an execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
  /// The terminal stage completed.
  Succeeded,
  /// A stage failed: resolution error, task failure, per-task timeout, or a
  /// fan-out branch failure.
  Failed,
  /// The end-to-end execution timeout elapsed.
  TimedOut,
  /// Cancellation was requested before the execution could finish.
  Cancelled,
}

/// The full record of one execution: what ran, what each task saw and
/// returned, and how it ended.
#[derive(Debug, Serialize)]
pub struct Execution {
  pub execution_id: String,
  pub pipeline_id: String,
  pub started_at: DateTime<Utc>,
  pub finished_at: DateTime<Utc>,
  /// The seed document the execution began with.
  pub seed: serde_json::Value,
  pub status: ExecutionStatus,
  /// The error that ended the execution, when it did not succeed.
  #[serde(skip_serializing_if = "Option::is_none", serialize_with = "display_error")]
  pub failure: Option<EngineError>,
  /// The data context as it stood when the execution ended.
  pub context: DataContext,
  /// Every task invocation, in the order it was recorded.
  pub invocations: Vec<TaskInvocation>,
}

impl Execution {
  pub fn succeeded(&self) -> bool {
    self.status == ExecutionStatus::Succeeded
  }
}

fn display_error<S>(failure: &Option<EngineError>, serializer: S) -> Result<S::Ok, S::Error>
where
  S: serde::Serializer,
{
  match failure {
    Some(err) => serializer.serialize_str(&err.to_string()),
    None => serializer.serialize_none(),
  }
}
