//! Result reconciler: maps generated content back onto the primary-store nodes.
//!
//! The generation service is not trusted to be complete or faithful about which nodes exist.
//! Generated nodes whose correlation id is unknown are recorded as misses and skipped; created
//! nodes the service omitted are reported as not generated. Update calls are independent of
//! each other and run with a bounded fan-out.

use crate::correlation::CorrelationMap;
use crate::error::WorkflowError;
use crate::generation::TaskResult;
use crate::progress::{Phase, ProgressReporter, WorkflowProgress};
use crate::service::PrimaryStore;
use crate::types::{CorrelationId, FieldKind, PrimaryId, StructureNode};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NodeOutcome {
    Updated,
    Failed { message: String },
    /// The service returned nothing for this node.
    NotGenerated,
}

impl NodeOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, NodeOutcome::Updated)
    }
}

/// A generated node whose correlation id maps to nothing this run created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationMiss {
    pub correlation_id: CorrelationId,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileStatus {
    Succeeded,
    PartiallySucceeded,
    Failed,
}

impl ReconcileStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReconcileStatus::Succeeded => "succeeded",
            ReconcileStatus::PartiallySucceeded => "partially_succeeded",
            ReconcileStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub per_node: BTreeMap<PrimaryId, NodeOutcome>,
    pub misses: Vec<ReconciliationMiss>,
}

impl ReconcileReport {
    pub fn status(&self) -> ReconcileStatus {
        let updated = self.per_node.values().filter(|o| o.is_updated()).count();
        if updated == 0 && !self.per_node.is_empty() {
            ReconcileStatus::Failed
        } else if updated < self.per_node.len() {
            ReconcileStatus::PartiallySucceeded
        } else {
            ReconcileStatus::Succeeded
        }
    }

    pub fn updated(&self) -> Vec<PrimaryId> {
        self.select(|o| o.is_updated())
    }

    pub fn failed(&self) -> Vec<(PrimaryId, &str)> {
        self.per_node
            .iter()
            .filter_map(|(id, outcome)| match outcome {
                NodeOutcome::Failed { message } => Some((*id, message.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn not_generated(&self) -> Vec<PrimaryId> {
        self.select(|o| matches!(o, NodeOutcome::NotGenerated))
    }

    fn select(&self, keep: impl Fn(&NodeOutcome) -> bool) -> Vec<PrimaryId> {
        self.per_node
            .iter()
            .filter(|(_, outcome)| keep(outcome))
            .map(|(id, _)| *id)
            .collect()
    }
}

struct UpdateJob {
    primary_id: PrimaryId,
    content: String,
    field_kind: FieldKind,
}

pub struct Reconciler<'a> {
    store: &'a dyn PrimaryStore,
    concurrency: usize,
}

impl<'a> Reconciler<'a> {
    pub const DEFAULT_CONCURRENCY: usize = 4;

    pub fn new(store: &'a dyn PrimaryStore) -> Self {
        Self {
            store,
            concurrency: Self::DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub(crate) async fn reconcile(
        &self,
        result: &TaskResult,
        nodes: &[StructureNode],
        correlations: &CorrelationMap,
        cancel: &CancellationToken,
        progress: ProgressReporter<'_>,
    ) -> Result<ReconcileReport, WorkflowError> {
        let mut report = ReconcileReport::default();
        let mut jobs: Vec<UpdateJob> = Vec::new();
        let mut job_index: HashMap<PrimaryId, usize> = HashMap::new();
        let created_kinds: HashMap<PrimaryId, &FieldKind> = nodes
            .iter()
            .map(|node| (node.primary_id, &node.field_kind))
            .collect();

        for generated in result.flatten() {
            let Some(primary_id) = correlations.resolve(&generated.correlation_id) else {
                warn!(
                    correlation_id = %generated.correlation_id,
                    title = %generated.title,
                    "Generated node has no matching primary node; skipping"
                );
                report.misses.push(ReconciliationMiss {
                    correlation_id: generated.correlation_id.clone(),
                    title: generated.title.clone(),
                });
                continue;
            };

            let job = UpdateJob {
                primary_id,
                content: generated.content.clone(),
                field_kind: generated
                    .field_kind
                    .clone()
                    .or_else(|| created_kinds.get(&primary_id).map(|kind| (*kind).clone()))
                    .unwrap_or_default(),
            };
            // A node returned twice is written once, with its last occurrence.
            match job_index.get(&primary_id) {
                Some(&existing) => {
                    debug!(primary_id = %primary_id, "Duplicate generated node; keeping last");
                    jobs[existing] = job;
                }
                None => {
                    job_index.insert(primary_id, jobs.len());
                    jobs.push(job);
                }
            }
        }

        let total = jobs.len();
        progress.emit(WorkflowProgress::ratio(
            Phase::Reconciling,
            0,
            total,
            format!("Applying {} generated sections", total),
        ));

        let store = self.store;
        let mut updates = stream::iter(jobs)
            .map(|job| async move {
                let outcome = store
                    .update_node(job.primary_id, &job.content, &job.field_kind)
                    .await;
                (job.primary_id, outcome)
            })
            .buffer_unordered(self.concurrency);

        let mut done = 0usize;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(applied = done, total, "Reconciliation cancelled");
                    return Err(WorkflowError::Cancelled { phase: Phase::Reconciling });
                }
                next = updates.next() => next,
            };
            let Some((primary_id, outcome)) = next else {
                break;
            };

            done += 1;
            let outcome = match outcome {
                Ok(()) => {
                    debug!(primary_id = %primary_id, "Node content updated");
                    NodeOutcome::Updated
                }
                Err(err) => {
                    warn!(primary_id = %primary_id, error = %err, "Node update failed");
                    NodeOutcome::Failed {
                        message: err.to_string(),
                    }
                }
            };
            report.per_node.insert(primary_id, outcome);
            progress.emit(WorkflowProgress::ratio(
                Phase::Reconciling,
                done,
                total,
                format!("Applied {}/{} sections", done, total),
            ));
        }

        for node in nodes {
            report
                .per_node
                .entry(node.primary_id)
                .or_insert(NodeOutcome::NotGenerated);
        }

        info!(
            status = report.status().as_str(),
            updated = report.updated().len(),
            failed = report.failed().len(),
            not_generated = report.not_generated().len(),
            misses = report.misses.len(),
            "Reconciliation finished"
        );
        Ok(report)
    }
}
