//! Bindings: how a stage's input document is assembled at invocation time.
//!
//! A binding is resolved exactly once, when its stage is invoked, against the
//! execution's data context as it stands then. The variant set is closed on
//! purpose: there is no string-interpolation mini-language beyond positional
//! `{}` slots in [`Binding::Format`].

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// One segment of a [`DataPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// A field lookup in a JSON object.
  Field(String),
  /// An element lookup in a JSON array.
  Index(usize),
}

/// A dotted path into the execution's data context.
///
/// The first segment names a slot (a stage's output key or a seed field);
/// later segments descend into the slot's document. Purely numeric segments
/// index into arrays: `"Images.2.ImgKey"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataPath {
  segments: Vec<Segment>,
}

impl DataPath {
  /// Parse a dotted path string.
  pub fn parse(path: &str) -> Result<Self, PipelineError> {
    if path.is_empty() {
      return Err(PipelineError::InvalidPath {
        path: path.to_string(),
      });
    }

    let mut segments = Vec::new();
    for part in path.split('.') {
      if part.is_empty() {
        return Err(PipelineError::InvalidPath {
          path: path.to_string(),
        });
      }
      match part.parse::<usize>() {
        Ok(index) => segments.push(Segment::Index(index)),
        Err(_) => segments.push(Segment::Field(part.to_string())),
      }
    }

    Ok(Self { segments })
  }

  /// The path's segments, in order.
  pub fn segments(&self) -> &[Segment] {
    &self.segments
  }
}

impl std::fmt::Display for DataPath {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for (i, segment) in self.segments.iter().enumerate() {
      if i > 0 {
        f.write_str(".")?;
      }
      match segment {
        Segment::Field(name) => f.write_str(name)?,
        Segment::Index(index) => write!(f, "{}", index)?,
      }
    }
    Ok(())
  }
}

impl TryFrom<String> for DataPath {
  type Error = PipelineError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::parse(&value)
  }
}

impl From<DataPath> for String {
  fn from(path: DataPath) -> Self {
    path.to_string()
  }
}

/// System-provided context values available to every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextValue {
  /// The unique identifier of the current execution.
  ExecutionId,
  /// A token generated per execution, for artifact key naming.
  ArtifactToken,
}

/// A value expression resolved against the data context at invocation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Binding {
  /// A fixed JSON value, passed through unchanged.
  Literal { value: serde_json::Value },

  /// A reference into an earlier stage's output (or a seed field).
  Path { path: DataPath },

  /// A system-provided context value.
  Context { value: ContextValue },

  /// A string template with positional `{}` slots, each filled by a
  /// sub-binding. Strings interpolate raw; other values interpolate as
  /// compact JSON.
  Format { template: String, args: Vec<Binding> },
}

impl Binding {
  pub fn literal(value: impl Into<serde_json::Value>) -> Self {
    Self::Literal {
      value: value.into(),
    }
  }

  /// Build a path binding from a dotted string. Panics on a malformed path;
  /// use [`DataPath::parse`] directly when the path is not a compile-time
  /// constant.
  pub fn path(path: &str) -> Self {
    Self::Path {
      path: DataPath::parse(path).unwrap_or_else(|e| panic!("{}", e)),
    }
  }

  pub fn execution_id() -> Self {
    Self::Context {
      value: ContextValue::ExecutionId,
    }
  }

  pub fn artifact_token() -> Self {
    Self::Context {
      value: ContextValue::ArtifactToken,
    }
  }

  pub fn format(template: impl Into<String>, args: Vec<Binding>) -> Self {
    Self::Format {
      template: template.into(),
      args,
    }
  }
}

/// Count the positional `{}` slots in a format template.
pub fn placeholder_count(template: &str) -> usize {
  template.matches("{}").count()
}
