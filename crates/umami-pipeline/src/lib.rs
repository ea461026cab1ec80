//! Umami Pipeline
//!
//! This crate contains the declarative pipeline definition types for umami.
//! A pipeline is an ordered list of stages (task, fan-out, terminal), each
//! declaring how its input document is assembled from earlier results via
//! bindings, and where its own result is written.
//!
//! Definitions are plain serializable values built by ordinary constructor
//! functions. They carry no behavior beyond structural validation; execution
//! lives in `umami-engine`.

mod binding;
mod definition;
mod error;
mod stage;

pub use binding::{Binding, ContextValue, DataPath, Segment, placeholder_count};
pub use definition::PipelineDefinition;
pub use error::PipelineError;
pub use stage::{Stage, StageKind};
