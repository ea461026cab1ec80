//! Umami Engine
//!
//! The execution engine walks a pipeline definition for one execution:
//! resolve the stage's bindings against the data context, invoke the external
//! task (or the fan-out barrier), write the result under the stage's output
//! key, advance. The whole walk runs under one end-to-end timeout; any stage
//! error, fan-out branch error, or timeout ends the execution as failed.
//!
//! Executions are independent: each owns its data context, and nothing is
//! shared between overlapping runs.

mod context;
mod engine;
mod error;
mod events;
mod execution;
mod resolve;
mod runner;

pub use context::DataContext;
pub use engine::{EngineConfig, ExecutionEngine};
pub use error::EngineError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use execution::{Execution, ExecutionStatus};
pub use resolve::{ResolveError, resolve, resolve_inputs};
