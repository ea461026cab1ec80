//! Execution events and notifiers for observability.
//!
//! Events are emitted as the engine walks a pipeline so consumers can observe
//! progress, persist state, stream to dashboards, etc.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during pipeline execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// An execution has started.
  ExecutionStarted {
    execution_id: String,
    pipeline_id: String,
  },

  /// A stage has started.
  StageStarted {
    execution_id: String,
    stage: String,
  },

  /// A stage has completed; `output` is the task's output document. For the
  /// terminal stage it is carried here even though nothing is written back to
  /// the data context.
  StageCompleted {
    execution_id: String,
    stage: String,
    output: serde_json::Value,
  },

  /// A stage has failed.
  StageFailed {
    execution_id: String,
    stage: String,
    error: String,
  },

  /// The terminal stage completed; the execution succeeded.
  ExecutionSucceeded { execution_id: String },

  /// The execution failed.
  ExecutionFailed { execution_id: String, error: String },

  /// The execution exceeded its end-to-end timeout.
  ExecutionTimedOut { execution_id: String },
}

/// Trait for receiving execution events.
///
/// The engine calls `notify` for each event - implementations decide what to
/// do with them (persist, broadcast, log, ignore, etc.).
pub trait ExecutionNotifier: Send + Sync {
  /// Called when an execution event occurs.
  fn notify(&self, event: ExecutionEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {
    // Intentionally empty
  }
}

/// A notifier that sends events to an unbounded channel.
///
/// Use this when you need to consume events asynchronously. The channel is
/// unbounded so a slow consumer never stalls the engine; event volume is low
/// (a handful per stage), so memory growth is unlikely in practice.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // Ignore send errors - receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
