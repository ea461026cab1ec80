//! Binding resolution: turning a stage's input bindings into the concrete
//! JSON document delivered to its task.

use std::collections::HashMap;

use serde_json::{Map, Value};
use thiserror::Error;
use umami_pipeline::{Binding, ContextValue, placeholder_count};

use crate::context::DataContext;

/// Resolution failures, before any task is invoked.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
  #[error("path '{path}' does not resolve")]
  UnresolvedPath { path: String },

  #[error("template '{template}' has {placeholders} placeholders but {args} arguments")]
  TemplateMismatch {
    template: String,
    placeholders: usize,
    args: usize,
  },
}

/// Resolve one binding against the data context.
pub fn resolve(binding: &Binding, ctx: &DataContext) -> Result<Value, ResolveError> {
  match binding {
    Binding::Literal { value } => Ok(value.clone()),
    Binding::Path { path } => {
      ctx
        .get(path)
        .cloned()
        .ok_or_else(|| ResolveError::UnresolvedPath {
          path: path.to_string(),
        })
    }
    Binding::Context { value } => Ok(match value {
      ContextValue::ExecutionId => Value::String(ctx.execution_id().to_string()),
      ContextValue::ArtifactToken => Value::String(ctx.artifact_token().to_string()),
    }),
    Binding::Format { template, args } => {
      let placeholders = placeholder_count(template);
      if placeholders != args.len() {
        return Err(ResolveError::TemplateMismatch {
          template: template.clone(),
          placeholders,
          args: args.len(),
        });
      }
      let mut out = String::with_capacity(template.len());
      let mut rest = template.as_str();
      for arg in args {
        let value = resolve(arg, ctx)?;
        let (head, tail) = match rest.split_once("{}") {
          Some(parts) => parts,
          // arity already checked
          None => break,
        };
        out.push_str(head);
        out.push_str(&render(&value));
        rest = tail;
      }
      out.push_str(rest);
      Ok(Value::String(out))
    }
  }
}

/// Resolve a stage's full input map into one JSON object document.
pub fn resolve_inputs(
  inputs: &HashMap<String, Binding>,
  ctx: &DataContext,
) -> Result<Value, ResolveError> {
  let mut doc = Map::with_capacity(inputs.len());
  for (param, binding) in inputs {
    doc.insert(param.clone(), resolve(binding, ctx)?);
  }
  Ok(Value::Object(doc))
}

/// Strings interpolate raw; every other value interpolates as compact JSON.
fn render(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn ctx() -> DataContext {
    let mut ctx = DataContext::new("exec-42", "a1b2c3", json!({"DryRun": false})).unwrap();
    ctx
      .insert("SelectImgResults", json!({"ImgKey": "a1b2c3_2.png", "Score": 9}))
      .unwrap();
    ctx
  }

  #[test]
  fn literal_passes_through() {
    let value = resolve(&Binding::literal(json!({"n": 1})), &ctx()).unwrap();
    assert_eq!(value, json!({"n": 1}));
  }

  #[test]
  fn path_reads_the_context() {
    let value = resolve(&Binding::path("SelectImgResults.ImgKey"), &ctx()).unwrap();
    assert_eq!(value, json!("a1b2c3_2.png"));
  }

  #[test]
  fn missing_path_is_an_error() {
    let err = resolve(&Binding::path("SelectImgResults.Nope"), &ctx()).unwrap_err();
    assert_eq!(
      err,
      ResolveError::UnresolvedPath {
        path: "SelectImgResults.Nope".to_string()
      }
    );
  }

  #[test]
  fn context_values_resolve() {
    assert_eq!(resolve(&Binding::execution_id(), &ctx()).unwrap(), json!("exec-42"));
    assert_eq!(resolve(&Binding::artifact_token(), &ctx()).unwrap(), json!("a1b2c3"));
  }

  #[test]
  fn format_interpolates_strings_raw_and_values_as_json() {
    let binding = Binding::format(
      "{}/edited_{}.png",
      vec![Binding::artifact_token(), Binding::path("SelectImgResults.Score")],
    );
    let value = resolve(&binding, &ctx()).unwrap();
    assert_eq!(value, json!("a1b2c3/edited_9.png"));
  }

  #[test]
  fn format_arity_mismatch() {
    let binding = Binding::format("{} and {}", vec![Binding::execution_id()]);
    let err = resolve(&binding, &ctx()).unwrap_err();
    assert!(matches!(err, ResolveError::TemplateMismatch { placeholders: 2, args: 1, .. }));
  }

  #[test]
  fn inputs_become_one_object() {
    let inputs = HashMap::from([
      ("ImgKey".to_string(), Binding::path("SelectImgResults.ImgKey")),
      ("DryRun".to_string(), Binding::path("DryRun")),
    ]);
    let doc = resolve_inputs(&inputs, &ctx()).unwrap();
    assert_eq!(doc, json!({"ImgKey": "a1b2c3_2.png", "DryRun": false}));
  }
}
