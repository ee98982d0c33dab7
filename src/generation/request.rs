//! Task submission: serialize the created structure into a generation request.

use crate::correlation::CorrelationMap;
use crate::error::WorkflowError;
use crate::generation::task::GenerationTask;
use crate::progress::Phase;
use crate::service::GenerationService;
use crate::types::{ContainerId, CorrelationId, FieldKind, StructureNode, WorkflowContext, WorkflowKind};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// One node as the generation service sees it. Correlation is always explicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationNodeRequest {
    pub correlation_id: CorrelationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_correlation_id: Option<CorrelationId>,
    pub title: String,
    pub content: String,
    pub field_kind: FieldKind,
    pub order_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_length: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub kind: WorkflowKind,
    pub container_id: ContainerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lesson_ids: Vec<String>,
    pub requested_by: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
    pub nodes: Vec<GenerationNodeRequest>,
}

impl GenerationRequest {
    /// Builds the request from the created nodes. Every node must already be in the map.
    pub fn build(
        container_id: ContainerId,
        nodes: &[StructureNode],
        correlations: &CorrelationMap,
        context: &WorkflowContext,
    ) -> Result<Self, String> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match correlations.correlation_for(node.primary_id) {
                Some(mapped) if *mapped == node.correlation_id => {}
                _ => {
                    return Err(format!(
                        "node {} has no correlation entry for '{}'",
                        node.primary_id, node.correlation_id
                    ))
                }
            }
            let parent_correlation_id = match node.parent_id {
                Some(parent) => Some(
                    correlations
                        .correlation_for(parent)
                        .cloned()
                        .ok_or_else(|| format!("parent {} of node {} is unmapped", parent, node.primary_id))?,
                ),
                None => None,
            };
            out.push(GenerationNodeRequest {
                correlation_id: node.correlation_id.clone(),
                parent_correlation_id,
                title: node.title.clone(),
                content: node.content.clone(),
                field_kind: node.field_kind.clone(),
                order_index: node.order_index,
                expected_length: node.expected_length,
            });
        }

        Ok(Self {
            kind: context.kind,
            container_id,
            subject: context.subject.clone(),
            book_id: context.book_id.clone(),
            lesson_ids: context.lesson_ids.clone(),
            requested_by: context.requested_by.clone(),
            extra: context.extra.clone(),
            nodes: out,
        })
    }
}

/// Hands a request to the generation service and returns a fresh task. No retries here.
pub struct TaskSubmitter<'a> {
    service: &'a dyn GenerationService,
}

impl<'a> TaskSubmitter<'a> {
    pub fn new(service: &'a dyn GenerationService) -> Self {
        Self { service }
    }

    pub async fn submit(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationTask, WorkflowError> {
        let submitted = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(WorkflowError::Cancelled { phase: Phase::Generating });
            }
            res = self.service.submit_task(request) => res,
        };

        match submitted {
            Ok(task_id) => {
                info!(
                    task_id = %task_id,
                    node_count = request.nodes.len(),
                    kind = request.kind.as_str(),
                    "Generation task submitted"
                );
                Ok(GenerationTask::new(task_id))
            }
            Err(source) => {
                warn!(error = %source, "Generation task submission failed");
                Err(WorkflowError::Submission { source })
            }
        }
    }
}
