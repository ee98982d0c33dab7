//! Structure builder: creates the container and its node tree in the primary store.
//!
//! Nodes are created one at a time in pre-order so a parent always exists before its children
//! and a failure at position k leaves nothing beyond k-1. Each created node is entered into the
//! correlation map only after its create call returned; a failed or cancelled create never
//! reaches the map.

use crate::correlation::CorrelationMap;
use crate::error::{ServiceError, WorkflowError};
use crate::progress::{Phase, ProgressReporter, WorkflowProgress};
use crate::service::{NewNode, PrimaryStore};
use crate::types::{ContainerId, CorrelationId, StructureNode, StructureSpec, WorkflowContext};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Output of the structuring phase.
#[derive(Debug, Clone)]
pub struct BuiltStructure {
    pub container_id: ContainerId,
    /// In creation order
    pub nodes: Vec<StructureNode>,
    pub correlations: CorrelationMap,
}

impl BuiltStructure {
    pub fn node_ids(&self) -> Vec<crate::types::PrimaryId> {
        self.nodes.iter().map(|n| n.primary_id).collect()
    }
}

pub struct StructureBuilder<'a> {
    store: &'a dyn PrimaryStore,
    correlation_prefix: &'a str,
}

impl<'a> StructureBuilder<'a> {
    pub const DEFAULT_CORRELATION_PREFIX: &'static str = "node_";

    pub fn new(store: &'a dyn PrimaryStore) -> Self {
        Self {
            store,
            correlation_prefix: Self::DEFAULT_CORRELATION_PREFIX,
        }
    }

    pub fn with_correlation_prefix(mut self, prefix: &'a str) -> Self {
        self.correlation_prefix = prefix;
        self
    }

    pub(crate) async fn build(
        &self,
        spec: &StructureSpec,
        context: &WorkflowContext,
        cancel: &CancellationToken,
        progress: ProgressReporter<'_>,
    ) -> Result<BuiltStructure, WorkflowError> {
        spec.validate().map_err(WorkflowError::InvalidSpec)?;
        let planned = spec.creation_order();
        let total = planned.len();

        progress.emit(WorkflowProgress::new(
            Phase::Structuring,
            0,
            format!("Creating '{}'", context.container_name),
        ));

        let created = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled()),
            res = self.store.create_container(&context.container_name, &context.container_description) => res,
        };
        let container_id = created.map_err(|source| {
            error!(error = %source, "Container creation failed");
            WorkflowError::Structuring { source }
        })?;
        info!(container_id = %container_id, sections = total, "Container created");

        let mut nodes: Vec<StructureNode> = Vec::with_capacity(total);
        let mut correlations = CorrelationMap::new();

        for (index, item) in planned.iter().enumerate() {
            let section = item.section;
            let parent_id = item.parent_index.map(|i| nodes[i].primary_id);
            let field_kind = section.field_kind.clone().unwrap_or_default();
            let request = NewNode {
                container_id,
                parent_id,
                title: section.title.clone(),
                content: section.description.clone().unwrap_or_default(),
                field_kind: field_kind.clone(),
                order_index: section.order_index,
            };

            let created = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled()),
                res = self.store.create_node(&request) => res,
            };
            let primary_id = created.map_err(|source| {
                error!(
                    index,
                    title = %section.title,
                    error = %source,
                    "Node creation failed; aborting structure"
                );
                WorkflowError::Structuring { source }
            })?;

            let correlation_id = CorrelationId::derive(self.correlation_prefix, primary_id);
            correlations
                .insert(correlation_id.clone(), primary_id)
                .map_err(|conflict| WorkflowError::Structuring {
                    source: ServiceError::InvalidResponse(conflict.to_string()),
                })?;
            debug!(
                index,
                primary_id = %primary_id,
                correlation_id = %correlation_id,
                "Node created"
            );

            nodes.push(StructureNode {
                primary_id,
                parent_id,
                title: request.title,
                content: request.content,
                field_kind,
                order_index: section.order_index,
                expected_length: section.expected_length,
                correlation_id,
            });

            progress.emit(WorkflowProgress::ratio(
                Phase::Structuring,
                index + 1,
                total,
                format!("Created section {}/{}: {}", index + 1, total, section.title),
            ));
        }

        Ok(BuiltStructure {
            container_id,
            nodes,
            correlations,
        })
    }
}

fn cancelled() -> WorkflowError {
    WorkflowError::Cancelled {
        phase: Phase::Structuring,
    }
}
