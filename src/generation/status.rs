//! Status normalization: heterogeneous generation-service payloads into one internal model.

use crate::error::ServiceError;
use crate::types::TaskId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Case-insensitive parse over the synonyms services actually send.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" | "queued" | "waiting" | "submitted" => Some(TaskStatus::Queued),
            "running" | "in_progress" | "processing" | "started" | "generating" => {
                Some(TaskStatus::Processing)
            }
            "success" | "succeeded" | "completed" | "complete" | "done" | "finished" => {
                Some(TaskStatus::Completed)
            }
            "failed" | "failure" | "error" | "cancelled" | "canceled" => Some(TaskStatus::Failed),
            _ => None,
        }
    }
}

/// One normalized status poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusReport {
    pub status: TaskStatus,
    pub progress_percent: Option<u8>,
    pub message: Option<String>,
}

impl TaskStatusReport {
    pub fn new(status: TaskStatus) -> Self {
        Self {
            status,
            progress_percent: None,
            message: None,
        }
    }

    pub fn with_progress(mut self, percent: u8) -> Self {
        self.progress_percent = Some(percent.min(100));
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn from_payload(payload: &Value) -> Result<Self, ServiceError> {
        let body = unwrap_envelope(payload);
        let raw_status = first_field(body, &["status", "state", "task_status", "taskStatus"])
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ServiceError::InvalidResponse(format!("status payload has no status: {}", body))
            })?;
        let status = TaskStatus::parse(raw_status).ok_or_else(|| {
            ServiceError::InvalidResponse(format!("unknown task status '{}'", raw_status))
        })?;

        let progress_percent = first_field(
            body,
            &["progress", "progress_percent", "progressPercent", "percent"],
        )
        .and_then(parse_percent);

        let message = first_field(body, &["message", "msg", "detail", "error"])
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        Ok(Self {
            status,
            progress_percent,
            message,
        })
    }
}

/// Strips a `{code, data}` / `{success, data}` response envelope when present.
pub fn unwrap_envelope(payload: &Value) -> &Value {
    match payload {
        Value::Object(map)
            if map.contains_key("data")
                && (map.contains_key("code") || map.contains_key("success")) =>
        {
            &map["data"]
        }
        other => other,
    }
}

/// Reads a task id under any of the keys services use, as string or number.
pub fn parse_task_id(payload: &Value) -> Result<TaskId, ServiceError> {
    let body = unwrap_envelope(payload);
    match first_field(body, &["task_id", "taskId", "id"]) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(TaskId::new(s.trim())),
        Some(Value::Number(n)) => Ok(TaskId::new(n.to_string())),
        _ => Err(ServiceError::InvalidResponse(format!(
            "submit response has no task id: {}",
            body
        ))),
    }
}

/// First present value among `keys`. Nulls and blank strings count as absent.
pub(crate) fn first_field<'a>(body: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| body.get(*key))
        .find(|value| match value {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
}

fn parse_percent(value: &Value) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => {
            let f = n.as_f64()?;
            // 0.45 means 45%, 1.0 means done; integers are already percentages
            if n.is_f64() && f > 0.0 && f <= 1.0 {
                f * 100.0
            } else {
                f
            }
        }
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(0.0, 100.0) as u8)
}
