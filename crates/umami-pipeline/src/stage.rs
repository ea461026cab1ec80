use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::binding::Binding;

/// The behavior of a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageKind {
  /// A single task invocation whose output is written under `output_key`.
  Task { task: String, output_key: String },

  /// `branches` concurrent invocations of the same task, differing only by
  /// the 0-based `index_param`. Results are written under `output_key` as a
  /// list ordered by branch index.
  FanOut {
    task: String,
    branches: usize,
    index_param: String,
    output_key: String,
  },

  /// The final task invocation. Completing it ends the execution as
  /// succeeded; its output is not written back.
  Terminal { task: String },
}

/// One pipeline step: a name, a kind, and the bindings that assemble its
/// input document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
  pub name: String,
  #[serde(flatten)]
  pub kind: StageKind,
  #[serde(default)]
  pub inputs: HashMap<String, Binding>,
}

impl Stage {
  /// A sequential task stage.
  pub fn task<S, I, K>(name: S, task: S, output_key: S, inputs: I) -> Self
  where
    S: Into<String>,
    I: IntoIterator<Item = (K, Binding)>,
    K: Into<String>,
  {
    Self {
      name: name.into(),
      kind: StageKind::Task {
        task: task.into(),
        output_key: output_key.into(),
      },
      inputs: collect_inputs(inputs),
    }
  }

  /// A bounded-parallel fan-out stage.
  pub fn fan_out<S, I, K>(
    name: S,
    task: S,
    branches: usize,
    index_param: S,
    output_key: S,
    inputs: I,
  ) -> Self
  where
    S: Into<String>,
    I: IntoIterator<Item = (K, Binding)>,
    K: Into<String>,
  {
    Self {
      name: name.into(),
      kind: StageKind::FanOut {
        task: task.into(),
        branches,
        index_param: index_param.into(),
        output_key: output_key.into(),
      },
      inputs: collect_inputs(inputs),
    }
  }

  /// The terminal stage, always last.
  pub fn terminal<S, I, K>(name: S, task: S, inputs: I) -> Self
  where
    S: Into<String>,
    I: IntoIterator<Item = (K, Binding)>,
    K: Into<String>,
  {
    Self {
      name: name.into(),
      kind: StageKind::Terminal { task: task.into() },
      inputs: collect_inputs(inputs),
    }
  }

  /// The external task this stage invokes.
  pub fn task_name(&self) -> &str {
    match &self.kind {
      StageKind::Task { task, .. } => task,
      StageKind::FanOut { task, .. } => task,
      StageKind::Terminal { task } => task,
    }
  }

  /// The data-context key this stage writes, if any.
  pub fn output_key(&self) -> Option<&str> {
    match &self.kind {
      StageKind::Task { output_key, .. } => Some(output_key),
      StageKind::FanOut { output_key, .. } => Some(output_key),
      StageKind::Terminal { .. } => None,
    }
  }
}

fn collect_inputs<I, K>(inputs: I) -> HashMap<String, Binding>
where
  I: IntoIterator<Item = (K, Binding)>,
  K: Into<String>,
{
  inputs
    .into_iter()
    .map(|(k, binding)| (k.into(), binding))
    .collect()
}
