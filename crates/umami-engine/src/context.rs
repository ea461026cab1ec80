use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use umami_pipeline::{DataPath, Segment};

use crate::error::EngineError;

/// The per-execution data context.
///
/// Slots are written once: the seed's top-level fields at the start, then one
/// slot per completed stage under its output key. Bindings read slots through
/// [`DataContext::get`]; nothing ever overwrites an existing slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataContext {
  execution_id: String,
  artifact_token: String,
  slots: Map<String, Value>,
}

impl DataContext {
  /// Seed a fresh context. The seed must be a JSON object; its top-level
  /// fields become the initial slots.
  pub fn new(
    execution_id: impl Into<String>,
    artifact_token: impl Into<String>,
    seed: Value,
  ) -> Result<Self, EngineError> {
    let Value::Object(slots) = seed else {
      return Err(EngineError::InvalidSeed);
    };
    Ok(Self {
      execution_id: execution_id.into(),
      artifact_token: artifact_token.into(),
      slots,
    })
  }

  /// A context with no slots, for executions that fail before seeding.
  pub fn empty(execution_id: impl Into<String>, artifact_token: impl Into<String>) -> Self {
    Self {
      execution_id: execution_id.into(),
      artifact_token: artifact_token.into(),
      slots: Map::new(),
    }
  }

  pub fn execution_id(&self) -> &str {
    &self.execution_id
  }

  pub fn artifact_token(&self) -> &str {
    &self.artifact_token
  }

  /// Write a stage's output under its key. Refuses to overwrite.
  pub fn insert(&mut self, key: &str, value: Value) -> Result<(), EngineError> {
    if self.slots.contains_key(key) {
      return Err(EngineError::Internal {
        message: format!("output key '{key}' already written"),
      });
    }
    self.slots.insert(key.to_string(), value);
    Ok(())
  }

  /// Look up a dotted path. `None` when any segment is missing or the value
  /// shape does not match the segment kind.
  pub fn get(&self, path: &DataPath) -> Option<&Value> {
    let mut segments = path.segments().iter();
    let mut current = match segments.next()? {
      Segment::Field(name) => self.slots.get(name)?,
      Segment::Index(_) => return None,
    };
    for segment in segments {
      current = match segment {
        Segment::Field(name) => current.as_object()?.get(name)?,
        Segment::Index(index) => current.as_array()?.get(*index)?,
      };
    }
    Some(current)
  }

  /// The slots as they stand, for the execution record.
  pub fn slots(&self) -> &Map<String, Value> {
    &self.slots
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn ctx() -> DataContext {
    DataContext::new("exec-1", "tok", json!({"DryRun": false})).unwrap()
  }

  #[test]
  fn seed_fields_become_slots() {
    let ctx = ctx();
    let path = DataPath::parse("DryRun").unwrap();
    assert_eq!(ctx.get(&path), Some(&json!(false)));
  }

  #[test]
  fn rejects_non_object_seed() {
    let err = DataContext::new("exec-1", "tok", json!([1, 2])).unwrap_err();
    assert!(matches!(err, EngineError::InvalidSeed));
  }

  #[test]
  fn insert_refuses_overwrite() {
    let mut ctx = ctx();
    ctx.insert("GenTextResults", json!({"DishName": "ramen"})).unwrap();
    assert!(ctx.insert("GenTextResults", json!(null)).is_err());
    assert!(ctx.insert("DryRun", json!(true)).is_err());
  }

  #[test]
  fn nested_and_indexed_lookup() {
    let mut ctx = ctx();
    ctx
      .insert("Results", json!({"Images": [{"ImgKey": "a.png"}, {"ImgKey": "b.png"}]}))
      .unwrap();
    let path = DataPath::parse("Results.Images.1.ImgKey").unwrap();
    assert_eq!(ctx.get(&path), Some(&json!("b.png")));

    assert!(ctx.get(&DataPath::parse("Results.Missing").unwrap()).is_none());
    assert!(ctx.get(&DataPath::parse("Results.Images.5").unwrap()).is_none());
    assert!(ctx.get(&DataPath::parse("Results.Images.ImgKey").unwrap()).is_none());
  }
}
