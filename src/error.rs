//! Error types for the content-generation orchestrator.
//!
//! Two layers: `ServiceError` describes a single failed call to the primary store or the
//! generation service; `WorkflowError` is the phase-tagged outcome of a whole run.

use crate::progress::Phase;
use crate::types::TaskId;
use std::time::Duration;
use thiserror::Error;

/// Per-call failures talking to an external service
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for ServiceError {
    fn from(err: config::ConfigError) -> Self {
        ServiceError::Config(err.to_string())
    }
}

/// Fatal outcome of a workflow run. Every variant knows the phase it aborted in.
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    #[error("Invalid structure spec: {0}")]
    InvalidSpec(String),

    #[error("Structuring failed: {source}")]
    Structuring {
        #[source]
        source: ServiceError,
    },

    #[error("Task submission failed: {source}")]
    Submission {
        #[source]
        source: ServiceError,
    },

    #[error("Generation failed for task {task_id}: {message}")]
    GenerationFailed { task_id: TaskId, message: String },

    #[error("Task {task_id} did not finish after {polls} polls ({elapsed:?})")]
    PollTimeout {
        task_id: TaskId,
        polls: u32,
        elapsed: Duration,
    },

    #[error("Generation service unavailable for task {task_id}: {source}")]
    StatusUnavailable {
        task_id: TaskId,
        #[source]
        source: ServiceError,
    },

    #[error("Workflow cancelled during {phase}")]
    Cancelled { phase: Phase },
}

impl WorkflowError {
    /// Phase in which the run was aborted.
    pub fn phase(&self) -> Phase {
        match self {
            WorkflowError::InvalidSpec(_) | WorkflowError::Structuring { .. } => {
                Phase::Structuring
            }
            WorkflowError::Submission { .. }
            | WorkflowError::GenerationFailed { .. }
            | WorkflowError::PollTimeout { .. }
            | WorkflowError::StatusUnavailable { .. } => Phase::Generating,
            WorkflowError::Cancelled { phase } => *phase,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkflowError::Cancelled { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, WorkflowError::PollTimeout { .. })
    }

    /// Stable short name for CLI output and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::InvalidSpec(_) => "invalid_spec",
            WorkflowError::Structuring { .. } => "structuring_error",
            WorkflowError::Submission { .. } => "submission_error",
            WorkflowError::GenerationFailed { .. } => "generation_failed",
            WorkflowError::PollTimeout { .. } => "poll_timeout",
            WorkflowError::StatusUnavailable { .. } => "status_unavailable",
            WorkflowError::Cancelled { .. } => "cancelled",
        }
    }
}
