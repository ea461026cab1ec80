use async_trait::async_trait;

use crate::error::TaskError;

/// Synchronous request/response invocation of a named external task.
///
/// Implementations own the mapping from task name to a runnable artifact
/// (container image, local executable, remote function; the engine does not
/// care). The call blocks the invoking stage until the task returns; the
/// engine applies its own timeout around it and never retries.
#[async_trait]
pub trait TaskInvoker: Send + Sync {
  /// Invoke `task` with the resolved input document.
  async fn invoke(&self, task: &str, input: serde_json::Value)
  -> Result<serde_json::Value, TaskError>;
}
