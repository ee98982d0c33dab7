//! Workflow driver: the single entry point for a generation run.
//!
//! Sequences structuring → submission → polling → reconciliation. A fatal error in any phase
//! aborts the rest and comes back phase-tagged; per-node problems during reconciliation are
//! data in the `WorkflowResult`. Runs are not idempotent: every call creates a new container.

use crate::error::{ServiceError, WorkflowError};
use crate::generation::{GenerationRequest, PollPolicy, TaskPoller, TaskSubmitter};
use crate::progress::{ProgressReporter, ProgressSink};
use crate::reconcile::{NodeOutcome, ReconcileStatus, Reconciler, ReconciliationMiss};
use crate::service::{GenerationService, PrimaryStore};
use crate::structure::StructureBuilder;
use crate::types::{ContainerId, PrimaryId, StructureSpec, TaskId, WorkflowContext};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOptions {
    pub poll: PollPolicy,
    pub update_concurrency: usize,
    pub correlation_prefix: String,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            poll: PollPolicy::default(),
            update_concurrency: Reconciler::DEFAULT_CONCURRENCY,
            correlation_prefix: StructureBuilder::DEFAULT_CORRELATION_PREFIX.to_string(),
        }
    }
}

/// Local wall-clock time spent per phase, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimings {
    pub structuring_ms: u64,
    pub generating_ms: u64,
    pub reconciling_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub container_id: ContainerId,
    pub task_id: TaskId,
    pub created_node_ids: Vec<PrimaryId>,
    pub section_titles: BTreeMap<PrimaryId, String>,
    pub per_node_outcome: BTreeMap<PrimaryId, NodeOutcome>,
    pub misses: Vec<ReconciliationMiss>,
    /// Echoed verbatim from the generation service.
    pub ai_statistics: serde_json::Value,
    pub status: ReconcileStatus,
    pub started_at: DateTime<Utc>,
    pub timings: PhaseTimings,
}

impl WorkflowResult {
    pub fn is_full_success(&self) -> bool {
        self.status == ReconcileStatus::Succeeded
    }

    /// Sections that did not receive generated content, with the reason.
    pub fn unfinished_sections(&self) -> Vec<(PrimaryId, &str, String)> {
        self.per_node_outcome
            .iter()
            .filter_map(|(id, outcome)| {
                let reason = match outcome {
                    NodeOutcome::Updated => return None,
                    NodeOutcome::Failed { message } => format!("update failed: {}", message),
                    NodeOutcome::NotGenerated => "unresolved: no generated content".to_string(),
                };
                let title = self.section_titles.get(id).map(String::as_str).unwrap_or("");
                Some((*id, title, reason))
            })
            .collect()
    }
}

pub struct WorkflowDriver {
    store: Arc<dyn PrimaryStore>,
    generator: Arc<dyn GenerationService>,
    options: WorkflowOptions,
}

impl WorkflowDriver {
    pub fn new(store: Arc<dyn PrimaryStore>, generator: Arc<dyn GenerationService>) -> Self {
        Self::with_options(store, generator, WorkflowOptions::default())
    }

    pub fn with_options(
        store: Arc<dyn PrimaryStore>,
        generator: Arc<dyn GenerationService>,
        options: WorkflowOptions,
    ) -> Self {
        Self {
            store,
            generator,
            options,
        }
    }

    pub fn options(&self) -> &WorkflowOptions {
        &self.options
    }

    /// Runs one workflow. `progress` is invoked zero or more times before this resolves;
    /// cancelling `cancel` resolves the run with `WorkflowError::Cancelled`.
    pub async fn run(
        &self,
        spec: &StructureSpec,
        context: &WorkflowContext,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<WorkflowResult, WorkflowError> {
        let span = info_span!(
            "workflow",
            kind = context.kind.as_str(),
            container = %context.container_name
        );
        let outcome = self
            .run_phases(spec, context, ProgressReporter::new(progress), cancel)
            .instrument(span)
            .await;
        if let Err(err) = &outcome {
            error!(phase = %err.phase(), kind = err.kind(), error = %err, "Workflow aborted");
        }
        outcome
    }

    async fn run_phases(
        &self,
        spec: &StructureSpec,
        context: &WorkflowContext,
        progress: ProgressReporter<'_>,
        cancel: &CancellationToken,
    ) -> Result<WorkflowResult, WorkflowError> {
        let started_at = Utc::now();
        let mut timings = PhaseTimings::default();

        let phase_start = Instant::now();
        let built = StructureBuilder::new(self.store.as_ref())
            .with_correlation_prefix(&self.options.correlation_prefix)
            .build(spec, context, cancel, progress)
            .await?;
        timings.structuring_ms = phase_start.elapsed().as_millis() as u64;

        let phase_start = Instant::now();
        let request =
            GenerationRequest::build(built.container_id, &built.nodes, &built.correlations, context)
                .map_err(|reason| WorkflowError::Submission {
                    source: ServiceError::Rejected(reason),
                })?;
        let task = TaskSubmitter::new(self.generator.as_ref())
            .submit(&request, cancel)
            .await?;
        let task_id = task.task_id.clone();
        let mut task = TaskPoller::new(self.generator.as_ref(), self.options.poll)
            .poll_until_terminal(task, cancel, progress)
            .await?;
        let result = task
            .result
            .take()
            .ok_or_else(|| WorkflowError::StatusUnavailable {
                task_id: task_id.clone(),
                source: ServiceError::InvalidResponse("completed task has no result".to_string()),
            })?;
        timings.generating_ms = phase_start.elapsed().as_millis() as u64;

        let phase_start = Instant::now();
        let report = Reconciler::new(self.store.as_ref())
            .with_concurrency(self.options.update_concurrency)
            .reconcile(&result, &built.nodes, &built.correlations, cancel, progress)
            .await?;
        timings.reconciling_ms = phase_start.elapsed().as_millis() as u64;

        let status = report.status();
        info!(
            container_id = %built.container_id,
            task_id = %task_id,
            status = status.as_str(),
            "Workflow finished"
        );

        Ok(WorkflowResult {
            container_id: built.container_id,
            task_id,
            created_node_ids: built.node_ids(),
            section_titles: built
                .nodes
                .iter()
                .map(|n| (n.primary_id, n.title.clone()))
                .collect(),
            per_node_outcome: report.per_node,
            misses: report.misses,
            ai_statistics: result.statistics,
            status,
            started_at,
            timings,
        })
    }
}
