//! Local task invoker: each task name maps to an executable in the data
//! directory's `tasks/` folder.
//!
//! The contract is stdin/stdout JSON: the resolved input document goes to the
//! task's stdin, the output document comes back on stdout. A non-zero exit
//! turns stderr into the task's error payload. Tasks that produce artifacts
//! get the store's directory through `UMAMI_ARTIFACT_DIR`.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use umami_task::{TaskError, TaskInvoker};

pub struct CommandInvoker {
  tasks_dir: PathBuf,
  artifact_dir: PathBuf,
}

impl CommandInvoker {
  pub fn new(tasks_dir: impl Into<PathBuf>, artifact_dir: impl Into<PathBuf>) -> Self {
    Self {
      tasks_dir: tasks_dir.into(),
      artifact_dir: artifact_dir.into(),
    }
  }

  fn error(task: &str, code: &str, message: String) -> TaskError {
    TaskError::new(task, json!({"Code": code, "Message": message}))
  }
}

#[async_trait]
impl TaskInvoker for CommandInvoker {
  async fn invoke(
    &self,
    task: &str,
    input: serde_json::Value,
  ) -> Result<serde_json::Value, TaskError> {
    let program = self.tasks_dir.join(task);

    let mut child = Command::new(&program)
      .env("UMAMI_ARTIFACT_DIR", &self.artifact_dir)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .spawn()
      .map_err(|e| {
        Self::error(task, "SpawnFailed", format!("{}: {}", program.display(), e))
      })?;

    let payload = serde_json::to_vec(&input)
      .map_err(|e| Self::error(task, "BadInput", e.to_string()))?;
    if let Some(stdin) = child.stdin.as_mut() {
      stdin
        .write_all(&payload)
        .await
        .map_err(|e| Self::error(task, "StdinClosed", e.to_string()))?;
    }
    drop(child.stdin.take());

    let output = child
      .wait_with_output()
      .await
      .map_err(|e| Self::error(task, "WaitFailed", e.to_string()))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
      return Err(TaskError::new(
        task,
        json!({"Code": "NonZeroExit", "Status": output.status.code(), "Stderr": stderr}),
      ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    if stdout.trim().is_empty() {
      return Ok(json!({}));
    }
    serde_json::from_str(stdout.trim())
      .map_err(|e| Self::error(task, "BadOutput", e.to_string()))
  }
}
