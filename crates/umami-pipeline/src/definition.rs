use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::binding::{Binding, placeholder_count};
use crate::error::PipelineError;
use crate::stage::{Stage, StageKind};

/// An ordered pipeline of stages, ready to be walked by the engine.
///
/// A valid pipeline has at least one stage, exactly one terminal stage in
/// last position, unique stage names, and unique output keys. `timeout_ms`
/// bounds one entire execution end-to-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDefinition {
  pub pipeline_id: String,
  pub name: String,
  pub stages: Vec<Stage>,
  pub timeout_ms: u64,
}

impl PipelineDefinition {
  pub fn new(
    pipeline_id: impl Into<String>,
    name: impl Into<String>,
    stages: Vec<Stage>,
    timeout_ms: u64,
  ) -> Self {
    Self {
      pipeline_id: pipeline_id.into(),
      name: name.into(),
      stages,
      timeout_ms,
    }
  }

  /// The execution-wide timeout.
  pub fn timeout(&self) -> Duration {
    Duration::from_millis(self.timeout_ms)
  }

  /// Validate the pipeline's structure.
  pub fn validate(&self) -> Result<(), PipelineError> {
    if self.stages.is_empty() {
      return Err(PipelineError::Empty);
    }

    let mut names = HashSet::new();
    let mut output_keys = HashSet::new();

    for (i, stage) in self.stages.iter().enumerate() {
      if !names.insert(stage.name.as_str()) {
        return Err(PipelineError::DuplicateStage {
          name: stage.name.clone(),
        });
      }

      if let Some(key) = stage.output_key() {
        if !output_keys.insert(key) {
          return Err(PipelineError::DuplicateOutputKey {
            key: key.to_string(),
          });
        }
      }

      match &stage.kind {
        StageKind::Terminal { .. } => {
          if i + 1 != self.stages.len() {
            return Err(PipelineError::TerminalNotLast {
              stage: stage.name.clone(),
            });
          }
        }
        StageKind::FanOut {
          branches,
          index_param,
          ..
        } => {
          if *branches == 0 {
            return Err(PipelineError::NoBranches {
              stage: stage.name.clone(),
            });
          }
          if stage.inputs.contains_key(index_param) {
            return Err(PipelineError::IndexParamCollision {
              stage: stage.name.clone(),
              param: index_param.clone(),
            });
          }
        }
        StageKind::Task { .. } => {}
      }

      for binding in stage.inputs.values() {
        validate_binding(binding)?;
      }
    }

    match self.stages.last().map(|s| &s.kind) {
      Some(StageKind::Terminal { .. }) => Ok(()),
      _ => Err(PipelineError::MissingTerminal),
    }
  }
}

/// Check format-template arity, recursing into nested bindings.
fn validate_binding(binding: &Binding) -> Result<(), PipelineError> {
  if let Binding::Format { template, args } = binding {
    let placeholders = placeholder_count(template);
    if placeholders != args.len() {
      return Err(PipelineError::TemplateArity {
        template: template.clone(),
        placeholders,
        args: args.len(),
      });
    }
    for arg in args {
      validate_binding(arg)?;
    }
  }
  Ok(())
}
