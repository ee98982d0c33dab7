//! CLI output: what a command hands back to the binary and how errors read on the terminal.

use crate::reconcile::ReconcileStatus;
use crate::workflow::WorkflowResult;

/// Process exit status. Partial success is distinct from failure so scripts can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
    Partial,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
            ExitStatus::Partial => 2,
        }
    }

    pub fn for_result(result: &WorkflowResult) -> Self {
        match result.status {
            ReconcileStatus::Succeeded => ExitStatus::Success,
            ReconcileStatus::PartiallySucceeded => ExitStatus::Partial,
            ReconcileStatus::Failed => ExitStatus::Failure,
        }
    }
}

/// Rendered command output plus the exit status it implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub body: String,
    pub status: ExitStatus,
}

impl CommandOutput {
    pub fn success(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            status: ExitStatus::Success,
        }
    }

    pub fn with_status(body: impl Into<String>, status: ExitStatus) -> Self {
        Self {
            body: body.into(),
            status,
        }
    }
}

/// Map an error chain to a single line for stderr.
pub fn map_error(e: &anyhow::Error) -> String {
    format!("Error: {:#}", e)
}
