use thiserror::Error;

/// Structural problems in a pipeline definition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
  #[error("pipeline has no stages")]
  Empty,

  #[error("pipeline has no terminal stage")]
  MissingTerminal,

  #[error("terminal stage '{stage}' must be the last stage")]
  TerminalNotLast { stage: String },

  #[error("duplicate stage name: {name}")]
  DuplicateStage { name: String },

  #[error("duplicate output key: {key}")]
  DuplicateOutputKey { key: String },

  #[error("fan-out stage '{stage}' declares zero branches")]
  NoBranches { stage: String },

  #[error("fan-out stage '{stage}' binds its index parameter '{param}' as a regular input")]
  IndexParamCollision { stage: String, param: String },

  #[error("invalid data path: '{path}'")]
  InvalidPath { path: String },

  #[error("format template '{template}' has {placeholders} slots but {args} arguments")]
  TemplateArity {
    template: String,
    placeholders: usize,
    args: usize,
  },
}
