use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
  #[error("invalid cron expression '{expr}'")]
  InvalidCron {
    expr: String,
    #[source]
    source: cron::error::Error,
  },
}
