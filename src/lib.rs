//! Coursegen: AI content-generation orchestration.
//!
//! Turns a user-defined section outline into a container of persisted nodes, has an external
//! AI service generate content for them asynchronously, and writes the results back onto the
//! right nodes. `WorkflowDriver::run` is the entry point.

pub mod cli;
pub mod config;
pub mod correlation;
pub mod error;
pub mod generation;
pub mod logging;
pub mod progress;
pub mod reconcile;
pub mod service;
pub mod structure;
pub mod types;
pub mod workflow;

pub use correlation::CorrelationMap;
pub use error::{ServiceError, WorkflowError};
pub use progress::{NoProgress, Phase, ProgressSink, WorkflowProgress};
pub use reconcile::{NodeOutcome, ReconcileStatus, ReconciliationMiss};
pub use service::{GenerationService, PrimaryStore};
pub use types::{
    ContainerId, CorrelationId, FieldKind, PrimaryId, SectionSpec, StructureSpec, TaskId,
    WorkflowContext, WorkflowKind,
};
pub use workflow::{WorkflowDriver, WorkflowOptions, WorkflowResult};
