//! Generation task state and result payloads.

use crate::error::ServiceError;
use crate::generation::status::{first_field, unwrap_envelope, TaskStatus, TaskStatusReport};
use crate::types::{CorrelationId, FieldKind, TaskId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Content the generation service produced for one node, echoed by correlation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedNode {
    #[serde(alias = "correlation_id")]
    pub correlation_id: CorrelationId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Absent when the service did not say; the node keeps the kind it was created with.
    #[serde(default, alias = "field_kind", skip_serializing_if = "Option::is_none")]
    pub field_kind: Option<FieldKind>,
    #[serde(default)]
    pub children: Vec<GeneratedNode>,
}

impl GeneratedNode {
    pub fn new(correlation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            correlation_id: CorrelationId::new(correlation_id),
            title: String::new(),
            content: content.into(),
            field_kind: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    #[serde(default)]
    pub nodes: Vec<GeneratedNode>,
    /// Node/word counts and timings, passed through untouched.
    #[serde(default)]
    pub statistics: Value,
}

impl TaskResult {
    pub fn new(nodes: Vec<GeneratedNode>) -> Self {
        Self {
            nodes,
            statistics: Value::Null,
        }
    }

    pub fn from_payload(payload: &Value) -> Result<Self, ServiceError> {
        let body = unwrap_envelope(payload);
        let nodes = match first_field(body, &["nodes", "sections", "items"]) {
            Some(raw) => serde_json::from_value::<Vec<GeneratedNode>>(raw.clone()).map_err(|e| {
                ServiceError::InvalidResponse(format!("malformed generated nodes: {}", e))
            })?,
            None => {
                return Err(ServiceError::InvalidResponse(format!(
                    "result payload has no nodes: {}",
                    body
                )))
            }
        };
        let statistics = first_field(body, &["statistics", "stats"])
            .cloned()
            .unwrap_or(Value::Null);
        Ok(Self { nodes, statistics })
    }

    /// Depth-first flattening of the returned tree.
    pub fn flatten(&self) -> Vec<&GeneratedNode> {
        fn visit<'a>(nodes: &'a [GeneratedNode], out: &mut Vec<&'a GeneratedNode>) {
            for node in nodes {
                out.push(node);
                visit(&node.children, out);
            }
        }
        let mut out = Vec::new();
        visit(&self.nodes, &mut out);
        out
    }
}

/// What applying a status report did to the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Changed,
    Unchanged,
    /// Task was already terminal; the report was dropped.
    IgnoredTerminal,
}

/// Local view of a task. Only ever changed from re-fetched service state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationTask {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub progress_percent: u8,
    pub message: Option<String>,
    pub result: Option<TaskResult>,
}

impl GenerationTask {
    pub fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            status: TaskStatus::Queued,
            progress_percent: 0,
            message: None,
            result: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Applies a status report. Terminal states are sticky, progress never goes backwards
    /// and a processing task does not fall back to queued.
    pub fn observe(&mut self, report: &TaskStatusReport) -> Observation {
        if self.is_terminal() {
            return Observation::IgnoredTerminal;
        }

        let before = (self.status, self.progress_percent, self.message.clone());

        self.status = match (self.status, report.status) {
            (TaskStatus::Processing, TaskStatus::Queued) => TaskStatus::Processing,
            (_, next) => next,
        };
        if let Some(percent) = report.progress_percent {
            self.progress_percent = self.progress_percent.max(percent.min(100));
        }
        if self.status == TaskStatus::Completed {
            self.progress_percent = 100;
        }
        if report.message.is_some() {
            self.message = report.message.clone();
        }

        if before == (self.status, self.progress_percent, self.message.clone()) {
            Observation::Unchanged
        } else {
            Observation::Changed
        }
    }

    /// Attaches the fetched payload. Ignored unless the task completed.
    pub fn attach_result(&mut self, result: TaskResult) {
        if self.status == TaskStatus::Completed {
            self.result = Some(result);
        }
    }
}
