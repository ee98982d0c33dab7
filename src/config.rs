//! Configuration System
//!
//! Layered configuration for the CLI: built-in defaults, the user file, an optional explicit
//! file and `COURSEGEN__*` environment variables, in increasing precedence. The library itself
//! never reads configuration; `WorkflowOptions` and the HTTP clients are built from it.

use crate::error::ServiceError;
use crate::generation::PollPolicy;
use crate::logging::LoggingConfig;
use crate::workflow::WorkflowOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod sources;

pub use sources::{user_config_path, ENV_PREFIX};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoursegenConfig {
    #[serde(default)]
    pub primary_store: EndpointConfig,

    #[serde(default)]
    pub generation: EndpointConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub workflow: WorkflowSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One remote JSON service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default)]
    pub base_url: String,

    /// Sent as a bearer token when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    120_000
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl EndpointConfig {
    pub fn validate(&self) -> Result<(), String> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err("base_url cannot be empty".to_string());
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(format!("base_url must be an http(s) URL: {}", url));
        }
        if self.request_timeout_ms == 0 {
            return Err("request_timeout_ms must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Task polling cadence. `interval_ms` × `max_polls` is the hard generation timeout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_max_polls")]
    pub max_polls: u32,

    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,
}

fn default_interval_ms() -> u64 {
    PollPolicy::DEFAULT_INTERVAL.as_millis() as u64
}

fn default_max_polls() -> u32 {
    PollPolicy::DEFAULT_MAX_POLLS
}

fn default_max_consecutive_errors() -> u32 {
    PollPolicy::DEFAULT_MAX_CONSECUTIVE_ERRORS
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_polls: default_max_polls(),
            max_consecutive_errors: default_max_consecutive_errors(),
        }
    }
}

impl PollingConfig {
    pub fn to_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.interval_ms),
            max_polls: self.max_polls,
            max_consecutive_errors: self.max_consecutive_errors,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.interval_ms == 0 {
            return Err("interval_ms must be greater than zero".to_string());
        }
        if self.max_polls == 0 {
            return Err("max_polls must be greater than zero".to_string());
        }
        if self.max_consecutive_errors == 0 {
            return Err("max_consecutive_errors must be greater than zero".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSettings {
    /// Concurrent node updates during reconciliation
    #[serde(default = "default_update_concurrency")]
    pub update_concurrency: usize,

    #[serde(default = "default_correlation_prefix")]
    pub correlation_prefix: String,
}

fn default_update_concurrency() -> usize {
    4
}

fn default_correlation_prefix() -> String {
    "node_".to_string()
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            update_concurrency: default_update_concurrency(),
            correlation_prefix: default_correlation_prefix(),
        }
    }
}

impl WorkflowSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.update_concurrency == 0 {
            return Err("update_concurrency must be greater than zero".to_string());
        }
        if self.correlation_prefix.trim().is_empty() {
            return Err("correlation_prefix cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors, one per offending section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Endpoint(String, String),
    Polling(String),
    Workflow(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Endpoint(name, msg) => write!(f, "Endpoint '{}': {}", name, msg),
            ValidationError::Polling(msg) => write!(f, "Polling: {}", msg),
            ValidationError::Workflow(msg) => write!(f, "Workflow: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl CoursegenConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (name, endpoint) in [
            ("primary_store", &self.primary_store),
            ("generation", &self.generation),
        ] {
            if let Err(e) = endpoint.validate() {
                errors.push(ValidationError::Endpoint(name.to_string(), e));
            }
        }
        if let Err(e) = self.polling.validate() {
            errors.push(ValidationError::Polling(e));
        }
        if let Err(e) = self.workflow.validate() {
            errors.push(ValidationError::Workflow(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn workflow_options(&self) -> WorkflowOptions {
        WorkflowOptions {
            poll: self.polling.to_policy(),
            update_concurrency: self.workflow.update_concurrency,
            correlation_prefix: self.workflow.correlation_prefix.clone(),
        }
    }
}

/// Builds a `CoursegenConfig` from its layered sources.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    explicit_file: Option<PathBuf>,
    user_file: Option<PathBuf>,
    environment: Option<HashMap<String, String>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// User file from the standard location, process environment.
    pub fn new() -> Self {
        Self {
            explicit_file: None,
            user_file: user_config_path(),
            environment: None,
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }

    /// Overrides (or with `None`, disables) the user-level file.
    pub fn with_user_file(mut self, path: Option<PathBuf>) -> Self {
        self.user_file = path;
        self
    }

    /// Reads `COURSEGEN__*` keys from `vars` instead of the process environment.
    pub fn with_environment(mut self, vars: HashMap<String, String>) -> Self {
        self.environment = Some(vars);
        self
    }

    pub fn load(&self) -> Result<CoursegenConfig, ServiceError> {
        let mut builder = sources::builder_with_defaults()?;
        builder = sources::add_user_file(builder, self.user_file.as_deref());
        if let Some(path) = &self.explicit_file {
            builder = sources::add_explicit_file(builder, path);
        }
        builder = sources::add_environment(builder, self.environment.clone());
        Ok(builder.build()?.try_deserialize()?)
    }

    /// Defaults plus a single file; no user file or environment.
    pub fn load_from_file(path: &Path) -> Result<CoursegenConfig, ServiceError> {
        Self::new()
            .with_user_file(None)
            .with_file(path)
            .with_environment(HashMap::new())
            .load()
    }
}
