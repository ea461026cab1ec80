use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::SchedulerError;

/// A parsed cron schedule (six-field expressions, seconds first).
#[derive(Debug, Clone)]
pub struct Schedule {
  expr: String,
  inner: cron::Schedule,
}

impl Schedule {
  pub fn parse(expr: &str) -> Result<Self, SchedulerError> {
    let inner = cron::Schedule::from_str(expr).map_err(|source| SchedulerError::InvalidCron {
      expr: expr.to_string(),
      source,
    })?;
    Ok(Self {
      expr: expr.to_string(),
      inner,
    })
  }

  pub fn expression(&self) -> &str {
    &self.expr
  }

  /// The first fire time strictly after `after`.
  pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    self.inner.after(&after).next()
  }
}

/// Whether a fire delivered at `delivered_at` is still fresh enough to run.
///
/// A fire older than `max_event_age` at delivery time is dropped rather than
/// run late; there is no retry for a dropped fire.
pub fn should_run(
  fired_at: DateTime<Utc>,
  delivered_at: DateTime<Utc>,
  max_event_age: Duration,
) -> bool {
  let age = delivered_at.signed_duration_since(fired_at);
  age <= chrono::Duration::from_std(max_event_age).unwrap_or(chrono::Duration::MAX)
}
