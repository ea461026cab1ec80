use thiserror::Error;

use umami_pipeline::PipelineError;
use umami_task::TaskError;

/// Anything that ends an execution short of the terminal stage.
#[derive(Debug, Error)]
pub enum EngineError {
  #[error("pipeline failed validation")]
  InvalidPipeline {
    #[source]
    source: PipelineError,
  },

  #[error("seed document must be a JSON object")]
  InvalidSeed,

  #[error("stage '{stage}' references path '{path}' which does not resolve")]
  UnresolvedPath { stage: String, path: String },

  #[error(
    "stage '{stage}' template '{template}' has {placeholders} placeholders but {args} arguments"
  )]
  TemplateMismatch {
    stage: String,
    template: String,
    placeholders: usize,
    args: usize,
  },

  #[error("stage '{stage}' failed")]
  Task {
    stage: String,
    #[source]
    source: TaskError,
  },

  #[error("stage '{stage}' task '{task}' did not respond within {timeout_ms}ms")]
  TaskTimeout {
    stage: String,
    task: String,
    timeout_ms: u64,
  },

  #[error("stage '{stage}' branch {branch} failed")]
  FanOut {
    stage: String,
    branch: usize,
    #[source]
    source: Box<EngineError>,
  },

  #[error("execution exceeded its {timeout_ms}ms timeout")]
  ExecutionTimeout { timeout_ms: u64 },

  #[error("execution was cancelled")]
  Cancelled,

  #[error("{message}")]
  Internal { message: String },
}
