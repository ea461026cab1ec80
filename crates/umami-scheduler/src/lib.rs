//! Umami Scheduler
//!
//! Drives a pipeline from a cron expression: sleep to the next fire time,
//! drop stale fires that were delivered too late, and launch each remaining
//! fire as a detached execution. Overlapping executions are allowed; the
//! engine keeps them independent.

mod error;
mod schedule;
mod scheduler;

pub use error::SchedulerError;
pub use schedule::{Schedule, should_run};
pub use scheduler::Scheduler;
