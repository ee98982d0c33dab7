//! Progress observability for workflow runs.
//!
//! Progress is an ephemeral side channel: the driver recomputes a `WorkflowProgress` on every
//! internal step and hands it to a caller-supplied `ProgressSink`. Nothing here is persisted.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;

/// The three externally observable phases of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "1_structuring")]
    Structuring,
    #[serde(rename = "2_generating")]
    Generating,
    #[serde(rename = "3_reconciling")]
    Reconciling,
}

impl Phase {
    pub fn number(self) -> u8 {
        match self {
            Phase::Structuring => 1,
            Phase::Generating => 2,
            Phase::Reconciling => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Structuring => "1_structuring",
            Phase::Generating => "2_generating",
            Phase::Reconciling => "3_reconciling",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowProgress {
    pub phase: Phase,
    /// 0-100 within the phase
    pub percent: u8,
    pub message: String,
}

impl WorkflowProgress {
    pub fn new(phase: Phase, percent: u8, message: impl Into<String>) -> Self {
        Self {
            phase,
            percent: percent.min(100),
            message: message.into(),
        }
    }

    /// Percent for `done` out of `total` steps; an empty phase counts as finished.
    pub fn ratio(phase: Phase, done: usize, total: usize, message: impl Into<String>) -> Self {
        let percent = if total == 0 {
            100
        } else {
            ((done.min(total) * 100) / total) as u8
        };
        Self::new(phase, percent, message)
    }
}

/// Observer for progress updates. Invoked zero or more times before a run resolves.
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: WorkflowProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(WorkflowProgress) + Send + Sync,
{
    fn report(&self, progress: WorkflowProgress) {
        self(progress)
    }
}

/// Channel-backed sink. A dropped receiver is not an error for the run.
impl ProgressSink for mpsc::UnboundedSender<WorkflowProgress> {
    fn report(&self, progress: WorkflowProgress) {
        let _ = self.send(progress);
    }
}

/// Sink that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _progress: WorkflowProgress) {}
}

/// Emits to a sink and mirrors every update into the trace log.
#[derive(Clone, Copy)]
pub(crate) struct ProgressReporter<'a> {
    sink: &'a dyn ProgressSink,
}

impl<'a> ProgressReporter<'a> {
    pub(crate) fn new(sink: &'a dyn ProgressSink) -> Self {
        Self { sink }
    }

    pub(crate) fn emit(&self, progress: WorkflowProgress) {
        debug!(
            phase = %progress.phase,
            percent = progress.percent,
            message = %progress.message,
            "workflow progress"
        );
        self.sink.report(progress);
    }
}
