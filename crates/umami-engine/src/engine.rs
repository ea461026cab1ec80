//! The pipeline execution engine.
//!
//! `ExecutionEngine` walks a validated pipeline stage by stage, resolving
//! each stage's bindings against the data context, invoking its task through
//! the configured [`TaskInvoker`], and writing the result back under the
//! stage's output key. Fan-out stages run their branches concurrently.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use umami_pipeline::{PipelineDefinition, Stage, StageKind};
use umami_task::{TaskInvocation, TaskInvoker};

use crate::context::DataContext;
use crate::error::EngineError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::execution::{Execution, ExecutionStatus};
use crate::resolve::{ResolveError, resolve_inputs};
use crate::runner::{invoke_once, run_fan_out};

/// Configuration for the execution engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// Timeout applied to every individual task invocation.
  pub task_timeout: Duration,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      task_timeout: Duration::from_secs(180),
    }
  }
}

/// The pipeline execution engine.
///
/// Generic over `N: ExecutionNotifier` to allow different notification
/// strategies. Use `ExecutionEngine::new()` for a default engine with no-op
/// notifications, or `ExecutionEngine::with_notifier()` to observe events.
pub struct ExecutionEngine<N: ExecutionNotifier = NoopNotifier> {
  invoker: Arc<dyn TaskInvoker>,
  config: EngineConfig,
  notifier: N,
}

impl ExecutionEngine<NoopNotifier> {
  /// Create an engine with no-op notifications.
  pub fn new(invoker: Arc<dyn TaskInvoker>, config: EngineConfig) -> Self {
    Self::with_notifier(invoker, config, NoopNotifier)
  }
}

impl<N: ExecutionNotifier> ExecutionEngine<N> {
  /// Create an engine with a custom notifier.
  pub fn with_notifier(invoker: Arc<dyn TaskInvoker>, config: EngineConfig, notifier: N) -> Self {
    Self {
      invoker,
      config,
      notifier,
    }
  }

  /// Execute one run of a pipeline from a seed document.
  ///
  /// Never panics and never returns early: the returned [`Execution`] record
  /// is the sole account of what happened, terminal status included. Each
  /// call is independent; overlapping executions share nothing.
  #[instrument(skip(self, pipeline, seed, cancel), fields(pipeline_id = %pipeline.pipeline_id))]
  pub async fn execute(
    &self,
    pipeline: &PipelineDefinition,
    seed: serde_json::Value,
    cancel: CancellationToken,
  ) -> Execution {
    let execution_id = uuid::Uuid::new_v4().to_string();
    let artifact_token = uuid::Uuid::new_v4().simple().to_string();
    let started_at = Utc::now();
    let seed_record = seed.clone();

    info!(%execution_id, pipeline_id = %pipeline.pipeline_id, "execution_started");
    self.notifier.notify(ExecutionEvent::ExecutionStarted {
      execution_id: execution_id.clone(),
      pipeline_id: pipeline.pipeline_id.clone(),
    });

    let mut invocations = Vec::new();
    let outcome = match self.prepare(pipeline, &execution_id, &artifact_token, seed) {
      Ok(mut ctx) => {
        let walk = self.walk(pipeline, &mut ctx, &mut invocations, &execution_id, &cancel);
        let outcome = match tokio::time::timeout(pipeline.timeout(), walk).await {
          Ok(result) => result,
          Err(_) => Err(EngineError::ExecutionTimeout {
            timeout_ms: pipeline.timeout_ms,
          }),
        };
        (ctx, outcome)
      }
      // Seed/validation failures still need a context for the record.
      Err(err) => (DataContext::empty(&execution_id, &artifact_token), Err(err)),
    };

    let (context, result) = outcome;
    let (status, failure) = match result {
      Ok(()) => (ExecutionStatus::Succeeded, None),
      Err(EngineError::Cancelled) => (ExecutionStatus::Cancelled, Some(EngineError::Cancelled)),
      Err(err @ EngineError::ExecutionTimeout { .. }) => (ExecutionStatus::TimedOut, Some(err)),
      Err(err) => (ExecutionStatus::Failed, Some(err)),
    };

    match status {
      ExecutionStatus::Succeeded => {
        info!(%execution_id, "execution_succeeded");
        self.notifier.notify(ExecutionEvent::ExecutionSucceeded {
          execution_id: execution_id.clone(),
        });
      }
      ExecutionStatus::TimedOut => {
        warn!(%execution_id, "execution_timed_out");
        self.notifier.notify(ExecutionEvent::ExecutionTimedOut {
          execution_id: execution_id.clone(),
        });
      }
      _ => {
        let error = failure
          .as_ref()
          .map(|e| e.to_string())
          .unwrap_or_default();
        warn!(%execution_id, %error, "execution_failed");
        self.notifier.notify(ExecutionEvent::ExecutionFailed {
          execution_id: execution_id.clone(),
          error,
        });
      }
    }

    Execution {
      execution_id,
      pipeline_id: pipeline.pipeline_id.clone(),
      started_at,
      finished_at: Utc::now(),
      seed: seed_record,
      status,
      failure,
      context,
      invocations,
    }
  }

  /// Validate the pipeline and seed the data context.
  fn prepare(
    &self,
    pipeline: &PipelineDefinition,
    execution_id: &str,
    artifact_token: &str,
    seed: serde_json::Value,
  ) -> Result<DataContext, EngineError> {
    pipeline
      .validate()
      .map_err(|source| EngineError::InvalidPipeline { source })?;
    DataContext::new(execution_id, artifact_token, seed)
  }

  /// Walk the stages in order until the terminal stage completes.
  async fn walk(
    &self,
    pipeline: &PipelineDefinition,
    ctx: &mut DataContext,
    invocations: &mut Vec<TaskInvocation>,
    execution_id: &str,
    cancel: &CancellationToken,
  ) -> Result<(), EngineError> {
    for stage in &pipeline.stages {
      if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
      }

      info!(execution_id, stage = %stage.name, task = %stage.task_name(), "stage_started");
      self.notifier.notify(ExecutionEvent::StageStarted {
        execution_id: execution_id.to_string(),
        stage: stage.name.clone(),
      });

      let result = self
        .run_stage(stage, ctx, invocations, cancel)
        .await;

      match result {
        Ok(output) => {
          if let Some(key) = stage.output_key() {
            ctx.insert(key, output.clone())?;
          }
          info!(execution_id, stage = %stage.name, "stage_completed");
          self.notifier.notify(ExecutionEvent::StageCompleted {
            execution_id: execution_id.to_string(),
            stage: stage.name.clone(),
            output,
          });
        }
        Err(err) => {
          warn!(execution_id, stage = %stage.name, error = %err, "stage_failed");
          self.notifier.notify(ExecutionEvent::StageFailed {
            execution_id: execution_id.to_string(),
            stage: stage.name.clone(),
            error: err.to_string(),
          });
          return Err(err);
        }
      }
    }
    Ok(())
  }

  /// Resolve a stage's inputs and invoke its task(s).
  ///
  /// Returns the value to write under the stage's output key; for the
  /// terminal stage the value is discarded by the caller.
  async fn run_stage(
    &self,
    stage: &Stage,
    ctx: &DataContext,
    invocations: &mut Vec<TaskInvocation>,
    cancel: &CancellationToken,
  ) -> Result<serde_json::Value, EngineError> {
    let input = resolve_inputs(&stage.inputs, ctx).map_err(|e| stage_resolve_error(stage, e))?;

    match &stage.kind {
      StageKind::Task { task, .. } | StageKind::Terminal { task } => {
        let (invocation, result) = invoke_once(
          self.invoker.as_ref(),
          &stage.name,
          task,
          None,
          input,
          self.config.task_timeout,
        )
        .await;
        invocations.push(invocation);
        result
      }
      StageKind::FanOut {
        task,
        branches,
        index_param,
        ..
      } => {
        let (branch_invocations, result) = run_fan_out(
          self.invoker.clone(),
          &stage.name,
          task,
          *branches,
          index_param,
          input,
          self.config.task_timeout,
          cancel,
        )
        .await;
        invocations.extend(branch_invocations);
        result
      }
    }
  }
}

fn stage_resolve_error(stage: &Stage, err: ResolveError) -> EngineError {
  match err {
    ResolveError::UnresolvedPath { path } => EngineError::UnresolvedPath {
      stage: stage.name.clone(),
      path,
    },
    ResolveError::TemplateMismatch {
      template,
      placeholders,
      args,
    } => EngineError::TemplateMismatch {
      stage: stage.name.clone(),
      template,
      placeholders,
      args,
    },
  }
}
