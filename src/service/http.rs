//! HTTP clients for the primary store and the generation service.
//!
//! Thin JSON-over-HTTP adapters. Responses may or may not be wrapped in a `{code, data}`
//! envelope; both shapes are accepted. No retries at this layer.

use crate::config::EndpointConfig;
use crate::error::ServiceError;
use crate::generation::status::{first_field, unwrap_envelope};
use crate::generation::{parse_task_id, GenerationRequest, TaskResult, TaskStatusReport};
use crate::service::{GenerationService, NewNode, PrimaryStore};
use crate::types::{ContainerId, FieldKind, PrimaryId, TaskId};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

fn map_http_error(error: reqwest::Error) -> ServiceError {
    if error.is_timeout() {
        ServiceError::RequestFailed(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ServiceError::RequestFailed(format!("Connection error: {}", error))
    } else if error.is_decode() {
        ServiceError::InvalidResponse(format!("Failed to decode response: {}", error))
    } else {
        ServiceError::RequestFailed(format!("HTTP error: {}", error))
    }
}

fn map_status(status: u16, body: String) -> ServiceError {
    match status {
        401 | 403 => ServiceError::AuthFailed(body),
        404 => ServiceError::NotFound(body),
        429 => ServiceError::RateLimited(body),
        400..=499 => ServiceError::Rejected(format!("status {}: {}", status, body)),
        _ => ServiceError::RequestFailed(format!("status {}: {}", status, body)),
    }
}

fn build_http_client(config: &EndpointConfig) -> Result<Client, ServiceError> {
    Client::builder()
        .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .build()
        .map_err(|e| ServiceError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Shared plumbing: base URL, bearer auth, status and body handling.
#[derive(Clone)]
struct JsonEndpoint {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl JsonEndpoint {
    fn new(config: &EndpointConfig) -> Result<Self, ServiceError> {
        if config.base_url.trim().is_empty() {
            return Err(ServiceError::Config("base_url is empty".to_string()));
        }
        Ok(Self {
            client: build_http_client(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value, ServiceError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(map_http_error)?;
        Self::read_json(response).await
    }

    async fn read_json(response: Response) -> Result<Value, ServiceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status(status.as_u16(), body));
        }
        let text = response.text().await.map_err(map_http_error)?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        let value: Value = serde_json::from_str(&text).map_err(|e| {
            ServiceError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;
        check_envelope(&value)?;
        Ok(value)
    }

    async fn get(&self, path: &str) -> Result<Value, ServiceError> {
        let url = self.url(path);
        debug!(%url, "GET");
        self.send(self.client.get(&url)).await
    }

    async fn post(&self, path: &str, body: &impl serde::Serialize) -> Result<Value, ServiceError> {
        let url = self.url(path);
        debug!(%url, "POST");
        self.send(self.client.post(&url).json(body)).await
    }

    async fn put(&self, path: &str, body: &impl serde::Serialize) -> Result<Value, ServiceError> {
        let url = self.url(path);
        debug!(%url, "PUT");
        self.send(self.client.put(&url).json(body)).await
    }
}

/// A 200 response can still carry an application-level failure in its envelope.
fn check_envelope(value: &Value) -> Result<(), ServiceError> {
    let Some(map) = value.as_object() else {
        return Ok(());
    };
    let failed = match (map.get("success"), map.get("code")) {
        (Some(Value::Bool(false)), _) => true,
        (_, Some(Value::Number(code))) => !matches!(code.as_i64(), Some(0) | Some(200..=299)),
        _ => false,
    };
    if failed {
        let message = first_field(value, &["message", "msg", "error"])
            .and_then(Value::as_str)
            .unwrap_or("request rejected by service");
        return Err(ServiceError::Rejected(message.to_string()));
    }
    Ok(())
}

fn parse_numeric_id(payload: &Value, what: &str) -> Result<u64, ServiceError> {
    let body = unwrap_envelope(payload);
    let raw = match body {
        Value::Number(_) | Value::String(_) => Some(body),
        _ => first_field(body, &["id", "nodeId", "node_id", "templateId", "containerId"]),
    };
    match raw {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .ok_or_else(|| ServiceError::InvalidResponse(format!("{} response has no id: {}", what, body)))
}

/// Primary store over HTTP.
///
/// - `POST {base}/containers` → `{id}`
/// - `POST {base}/containers/{containerId}/nodes` → `{id}`
/// - `PUT  {base}/nodes/{primaryId}`
pub struct HttpPrimaryStore {
    endpoint: JsonEndpoint,
}

impl HttpPrimaryStore {
    pub fn new(config: &EndpointConfig) -> Result<Self, ServiceError> {
        Ok(Self {
            endpoint: JsonEndpoint::new(config)?,
        })
    }
}

#[async_trait]
impl PrimaryStore for HttpPrimaryStore {
    async fn create_container(
        &self,
        name: &str,
        description: &str,
    ) -> Result<ContainerId, ServiceError> {
        let body = json!({ "name": name, "description": description });
        let response = self.endpoint.post("containers", &body).await?;
        parse_numeric_id(&response, "create container").map(ContainerId)
    }

    async fn create_node(&self, node: &NewNode) -> Result<PrimaryId, ServiceError> {
        let path = format!("containers/{}/nodes", node.container_id);
        let response = self.endpoint.post(&path, node).await?;
        parse_numeric_id(&response, "create node").map(PrimaryId)
    }

    async fn update_node(
        &self,
        primary_id: PrimaryId,
        content: &str,
        field_kind: &FieldKind,
    ) -> Result<(), ServiceError> {
        let body = json!({ "content": content, "fieldKind": field_kind });
        self.endpoint
            .put(&format!("nodes/{}", primary_id), &body)
            .await
            .map(|_| ())
    }
}

/// Generation service over HTTP.
///
/// - `POST {base}/tasks` → `{taskId}`
/// - `GET  {base}/tasks/{taskId}/status`
/// - `GET  {base}/tasks/{taskId}/result`
pub struct HttpGenerationService {
    endpoint: JsonEndpoint,
}

impl HttpGenerationService {
    pub fn new(config: &EndpointConfig) -> Result<Self, ServiceError> {
        Ok(Self {
            endpoint: JsonEndpoint::new(config)?,
        })
    }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn submit_task(&self, request: &GenerationRequest) -> Result<TaskId, ServiceError> {
        let response = self.endpoint.post("tasks", request).await?;
        parse_task_id(&response)
    }

    async fn task_status(&self, task_id: &TaskId) -> Result<TaskStatusReport, ServiceError> {
        let response = self
            .endpoint
            .get(&format!("tasks/{}/status", task_id))
            .await?;
        TaskStatusReport::from_payload(&response)
    }

    async fn task_result(&self, task_id: &TaskId) -> Result<TaskResult, ServiceError> {
        let response = self
            .endpoint
            .get(&format!("tasks/{}/result", task_id))
            .await?;
        TaskResult::from_payload(&response)
    }
}
