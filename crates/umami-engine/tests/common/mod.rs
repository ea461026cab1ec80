#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::{Value, json};
use umami_task::{TaskError, TaskInvoker};

type Handler = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, TaskError>> + Send + Sync>;

/// A scriptable invoker: one async handler per task name.
#[derive(Default)]
pub struct MockInvoker {
  handlers: HashMap<String, Handler>,
}

impl MockInvoker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a handler for `task`.
  pub fn on<F, Fut>(mut self, task: &str, handler: F) -> Self
  where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, TaskError>> + Send + 'static,
  {
    self
      .handlers
      .insert(task.to_string(), Arc::new(move |input| Box::pin(handler(input))));
    self
  }

  /// Register a handler that succeeds with a fixed output.
  pub fn on_ok(self, task: &str, output: Value) -> Self {
    self.on(task, move |_| {
      let output = output.clone();
      async move { Ok(output) }
    })
  }

  pub fn into_arc(self) -> Arc<dyn TaskInvoker> {
    Arc::new(self)
  }
}

#[async_trait]
impl TaskInvoker for MockInvoker {
  async fn invoke(&self, task: &str, input: Value) -> Result<Value, TaskError> {
    match self.handlers.get(task) {
      Some(handler) => handler(input).await,
      None => Err(TaskError::new(task, json!({"Code": "UnknownTask"}))),
    }
  }
}
