//! Shared test utilities for integration tests
//!
//! In-memory primary store and generation service with scripted responses, plus environment
//! isolation for config tests.

use async_trait::async_trait;
use coursegen::generation::{
    GeneratedNode, GenerationRequest, PollPolicy, TaskResult, TaskStatus, TaskStatusReport,
};
use coursegen::service::{GenerationService, NewNode, PrimaryStore};
use coursegen::workflow::WorkflowOptions;
use coursegen::{
    ContainerId, FieldKind, PrimaryId, SectionSpec, ServiceError, StructureSpec, TaskId,
    WorkflowContext, WorkflowKind,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Primary store that hands out sequential ids and records every call.
pub struct ScriptedStore {
    next_id: Mutex<u64>,
    failing_updates: Mutex<HashSet<PrimaryId>>,
    pub created: Mutex<Vec<(PrimaryId, NewNode)>>,
    pub updates: Mutex<Vec<(PrimaryId, String)>>,
    pub contents: Mutex<HashMap<PrimaryId, String>>,
}

impl ScriptedStore {
    pub fn starting_at(first_id: u64) -> Self {
        Self {
            next_id: Mutex::new(first_id),
            failing_updates: Mutex::new(HashSet::new()),
            created: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            contents: Mutex::new(HashMap::new()),
        }
    }

    pub fn fail_update_of(&self, id: PrimaryId) {
        self.failing_updates.lock().insert(id);
    }

    pub fn created_ids(&self) -> Vec<PrimaryId> {
        self.created.lock().iter().map(|(id, _)| *id).collect()
    }

    pub fn content_of(&self, id: PrimaryId) -> Option<String> {
        self.contents.lock().get(&id).cloned()
    }

    pub fn update_count(&self, id: PrimaryId) -> usize {
        self.updates.lock().iter().filter(|(u, _)| *u == id).count()
    }
}

#[async_trait]
impl PrimaryStore for ScriptedStore {
    async fn create_container(
        &self,
        _name: &str,
        _description: &str,
    ) -> Result<ContainerId, ServiceError> {
        Ok(ContainerId(7))
    }

    async fn create_node(&self, node: &NewNode) -> Result<PrimaryId, ServiceError> {
        let id = {
            let mut next = self.next_id.lock();
            let id = PrimaryId(*next);
            *next += 1;
            id
        };
        self.created.lock().push((id, node.clone()));
        self.contents.lock().insert(id, node.content.clone());
        Ok(id)
    }

    async fn update_node(
        &self,
        primary_id: PrimaryId,
        content: &str,
        _field_kind: &FieldKind,
    ) -> Result<(), ServiceError> {
        self.updates.lock().push((primary_id, content.to_string()));
        if self.failing_updates.lock().contains(&primary_id) {
            return Err(ServiceError::RequestFailed(format!(
                "node {} is locked",
                primary_id
            )));
        }
        self.contents.lock().insert(primary_id, content.to_string());
        Ok(())
    }
}

/// Generation service replaying a status script, then a default status forever.
pub struct ScriptedGenerator {
    statuses: Mutex<VecDeque<Result<TaskStatusReport, ServiceError>>>,
    default_status: Mutex<TaskStatusReport>,
    result: Mutex<Option<TaskResult>>,
    cancel_at: Mutex<Option<(u32, CancellationToken)>>,
    status_calls: Mutex<u32>,
    result_calls: Mutex<u32>,
    pub submitted: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            statuses: Mutex::new(VecDeque::new()),
            default_status: Mutex::new(TaskStatusReport::new(TaskStatus::Processing)),
            result: Mutex::new(None),
            cancel_at: Mutex::new(None),
            status_calls: Mutex::new(0),
            result_calls: Mutex::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// Processing at each listed percent, then completed with `nodes`.
    pub fn completing_with(progress: &[u8], nodes: Vec<GeneratedNode>) -> Self {
        let generator = Self::new();
        for percent in progress {
            generator.push_status(TaskStatusReport::new(TaskStatus::Processing).with_progress(*percent));
        }
        generator.push_status(TaskStatusReport::new(TaskStatus::Completed));
        generator.set_result(TaskResult::new(nodes));
        generator
    }

    pub fn push_status(&self, report: TaskStatusReport) {
        self.statuses.lock().push_back(Ok(report));
    }

    pub fn push_status_error(&self, error: ServiceError) {
        self.statuses.lock().push_back(Err(error));
    }

    pub fn set_default_status(&self, report: TaskStatusReport) {
        *self.default_status.lock() = report;
    }

    pub fn set_result(&self, result: TaskResult) {
        *self.result.lock() = Some(result);
    }

    /// Cancels `token` while answering the `call`-th status request (1-based).
    pub fn cancel_on_status_call(&self, call: u32, token: CancellationToken) {
        *self.cancel_at.lock() = Some((call, token));
    }

    pub fn status_calls(&self) -> u32 {
        *self.status_calls.lock()
    }

    pub fn result_calls(&self) -> u32 {
        *self.result_calls.lock()
    }
}

#[async_trait]
impl GenerationService for ScriptedGenerator {
    async fn submit_task(&self, request: &GenerationRequest) -> Result<TaskId, ServiceError> {
        self.submitted.lock().push(request.clone());
        Ok(TaskId::new("task-42"))
    }

    async fn task_status(&self, _task_id: &TaskId) -> Result<TaskStatusReport, ServiceError> {
        let call = {
            let mut calls = self.status_calls.lock();
            *calls += 1;
            *calls
        };
        if let Some((at, token)) = self.cancel_at.lock().as_ref() {
            if *at == call {
                token.cancel();
            }
        }
        let scripted = self.statuses.lock().pop_front();
        scripted.unwrap_or_else(|| Ok(self.default_status.lock().clone()))
    }

    async fn task_result(&self, task_id: &TaskId) -> Result<TaskResult, ServiceError> {
        *self.result_calls.lock() += 1;
        self.result
            .lock()
            .clone()
            .ok_or_else(|| ServiceError::NotFound(format!("no result for {}", task_id)))
    }
}

/// The three-section lesson outline used across scenarios.
pub fn lesson_spec() -> StructureSpec {
    StructureSpec::new(vec![
        SectionSpec::new("Objectives", 1).with_description("What students will learn"),
        SectionSpec::new("Activities", 2),
        SectionSpec::new("Homework", 3),
    ])
}

pub fn lesson_context() -> WorkflowContext {
    let mut context = WorkflowContext::new(WorkflowKind::LessonPlan, "Fractions 101", "instructor-7");
    context.subject = Some("math".to_string());
    context.lesson_ids = vec!["lesson-3".to_string()];
    context
}

pub fn options(interval: Duration, max_polls: u32) -> WorkflowOptions {
    WorkflowOptions {
        poll: PollPolicy {
            interval,
            max_polls,
            max_consecutive_errors: 3,
        },
        ..WorkflowOptions::default()
    }
}

/// Global mutex to serialize XDG environment variable access across all tests
static XDG_ENV_MUTEX: Mutex<()> = parking_lot::const_mutex(());

/// Runs `f` with `XDG_CONFIG_HOME` pointing at `test_dir` and no `COURSEGEN__*` variables,
/// restoring the environment afterwards.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = XDG_ENV_MUTEX.lock();
    let original = std::env::var_os("XDG_CONFIG_HOME");
    let coursegen_vars: Vec<(String, String)> = std::env::vars()
        .filter(|(k, _)| k.starts_with("COURSEGEN__"))
        .collect();
    for (key, _) in &coursegen_vars {
        std::env::remove_var(key);
    }
    std::env::set_var("XDG_CONFIG_HOME", test_dir.path());

    let result = f();

    match original {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }
    for (key, value) in coursegen_vars {
        std::env::set_var(key, value);
    }
    result
}
