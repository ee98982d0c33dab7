//! External service contracts
//!
//! The orchestrator talks to two services it does not own: the primary store (authoritative
//! for containers and nodes) and the generation service (runs the AI job asynchronously).
//! Both are async traits so the driver can be exercised against HTTP clients or test doubles.

use crate::error::ServiceError;
use crate::generation::{GenerationRequest, TaskResult, TaskStatusReport};
use crate::types::{ContainerId, FieldKind, PrimaryId, TaskId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod http;
#[cfg(test)]
pub(crate) mod mock;

pub use http::{HttpGenerationService, HttpPrimaryStore};

/// Payload for a create-node call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNode {
    pub container_id: ContainerId,
    pub parent_id: Option<PrimaryId>,
    pub title: String,
    pub content: String,
    pub field_kind: FieldKind,
    pub order_index: u32,
}

/// Authoritative store of containers and their nodes
#[async_trait]
pub trait PrimaryStore: Send + Sync {
    async fn create_container(
        &self,
        name: &str,
        description: &str,
    ) -> Result<ContainerId, ServiceError>;

    async fn create_node(&self, node: &NewNode) -> Result<PrimaryId, ServiceError>;

    /// Replaces the node's content and field kind. Applying the same update twice is a no-op.
    async fn update_node(
        &self,
        primary_id: PrimaryId,
        content: &str,
        field_kind: &FieldKind,
    ) -> Result<(), ServiceError>;
}

/// Asynchronous AI job runner
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn submit_task(&self, request: &GenerationRequest) -> Result<TaskId, ServiceError>;

    /// Light heartbeat: status, progress and message only.
    async fn task_status(&self, task_id: &TaskId) -> Result<TaskStatusReport, ServiceError>;

    /// Full payload, only meaningful once the task has completed.
    async fn task_result(&self, task_id: &TaskId) -> Result<TaskResult, ServiceError>;
}
