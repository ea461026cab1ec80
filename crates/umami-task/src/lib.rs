//! Umami Task
//!
//! The boundary between the orchestration engine and the external compute
//! tasks it invokes. Tasks are opaque: they accept a JSON input document and
//! return a JSON output document or an error payload the engine carries
//! verbatim. One [`TaskInvoker`] call is exactly one attempt; retry, if
//! wanted, is the caller's explicit responsibility.

mod error;
mod invocation;
mod invoker;

pub use error::TaskError;
pub use invocation::{InvocationOutcome, TaskInvocation};
pub use invoker::TaskInvoker;
