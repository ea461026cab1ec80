use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A failure reported by an external task.
///
/// The payload is the task's own error document, opaque to the engine; task
/// error codes are never interpreted here.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("task '{task}' reported failure")]
pub struct TaskError {
  /// The task that failed.
  pub task: String,
  /// The task's error payload, carried verbatim.
  pub payload: serde_json::Value,
}

impl TaskError {
  pub fn new(task: impl Into<String>, payload: serde_json::Value) -> Self {
    Self {
      task: task.into(),
      payload,
    }
  }
}
