use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use umami_engine::{Execution, ExecutionEngine, ExecutionNotifier, NoopNotifier};
use umami_pipeline::PipelineDefinition;

use crate::schedule::{Schedule, should_run};

const DEFAULT_MAX_EVENT_AGE: Duration = Duration::from_secs(600);

/// Runs a pipeline on a cron schedule.
///
/// Each fire launches one execution as a detached task with a fresh clone of
/// the seed document. The scheduler never waits for an execution to finish
/// before sleeping toward the next fire, so a slow execution can overlap the
/// next one.
pub struct Scheduler<N: ExecutionNotifier + 'static = NoopNotifier> {
  engine: Arc<ExecutionEngine<N>>,
  pipeline: Arc<PipelineDefinition>,
  seed: serde_json::Value,
  schedule: Schedule,
  max_event_age: Duration,
}

impl<N: ExecutionNotifier + 'static> Scheduler<N> {
  pub fn new(
    engine: Arc<ExecutionEngine<N>>,
    pipeline: PipelineDefinition,
    seed: serde_json::Value,
    schedule: Schedule,
  ) -> Self {
    Self {
      engine,
      pipeline: Arc::new(pipeline),
      seed,
      schedule,
      max_event_age: DEFAULT_MAX_EVENT_AGE,
    }
  }

  /// Override the staleness window for delayed fires.
  pub fn with_max_event_age(mut self, max_event_age: Duration) -> Self {
    self.max_event_age = max_event_age;
    self
  }

  /// Launch one execution now, detached from the scheduling loop.
  pub fn fire_once(&self, cancel: CancellationToken) -> JoinHandle<Execution> {
    let engine = self.engine.clone();
    let pipeline = self.pipeline.clone();
    let seed = self.seed.clone();
    tokio::spawn(async move { engine.execute(&pipeline, seed, cancel).await })
  }

  /// Sleep-and-fire until cancelled.
  ///
  /// Executions launched before cancellation keep the child token they were
  /// given; cancelling the scheduler cancels them too.
  pub async fn run(&self, cancel: CancellationToken) {
    info!(
      pipeline_id = %self.pipeline.pipeline_id,
      cron = %self.schedule.expression(),
      "scheduler_started"
    );

    let mut after = Utc::now();
    loop {
      let Some(fire_at) = self.schedule.next_after(after) else {
        warn!(cron = %self.schedule.expression(), "schedule_exhausted");
        return;
      };

      let wait = (fire_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);
      tokio::select! {
        _ = tokio::time::sleep(wait) => {}
        _ = cancel.cancelled() => {
          info!("scheduler_stopped");
          return;
        }
      }

      let delivered_at = Utc::now();
      if should_run(fire_at, delivered_at, self.max_event_age) {
        info!(pipeline_id = %self.pipeline.pipeline_id, %fire_at, "schedule_fired");
        let _ = self.fire_once(cancel.child_token());
      } else {
        warn!(
          pipeline_id = %self.pipeline.pipeline_id,
          %fire_at,
          %delivered_at,
          "stale_fire_dropped"
        );
      }
      after = fire_at;
    }
  }
}
