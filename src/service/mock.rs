//! Scripted in-memory services for unit tests.

use crate::error::ServiceError;
use crate::generation::{GenerationRequest, TaskResult, TaskStatus, TaskStatusReport};
use crate::service::{GenerationService, NewNode, PrimaryStore};
use crate::types::{ContainerId, FieldKind, PrimaryId, TaskId};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

pub(crate) struct MockPrimaryStore {
    next_id: Mutex<u64>,
    fail_create_at: Mutex<Option<(usize, ServiceError)>>,
    fail_updates: Mutex<HashSet<PrimaryId>>,
    create_delay: Mutex<Option<Duration>>,
    pub(crate) created: Mutex<Vec<(PrimaryId, NewNode)>>,
    pub(crate) updates: Mutex<Vec<PrimaryId>>,
    pub(crate) contents: Mutex<HashMap<PrimaryId, (String, FieldKind)>>,
}

impl MockPrimaryStore {
    pub(crate) fn starting_at(first_id: u64) -> Self {
        Self {
            next_id: Mutex::new(first_id),
            fail_create_at: Mutex::new(None),
            fail_updates: Mutex::new(HashSet::new()),
            create_delay: Mutex::new(None),
            created: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            contents: Mutex::new(HashMap::new()),
        }
    }

    /// Fails the create call with zero-based index `index`.
    pub(crate) fn fail_create_at(&self, index: usize, error: ServiceError) {
        *self.fail_create_at.lock() = Some((index, error));
    }

    pub(crate) fn fail_update(&self, primary_id: PrimaryId) {
        self.fail_updates.lock().insert(primary_id);
    }

    pub(crate) fn delay_creates(&self, delay: Duration) {
        *self.create_delay.lock() = Some(delay);
    }

    pub(crate) fn created_ids(&self) -> Vec<PrimaryId> {
        self.created.lock().iter().map(|(id, _)| *id).collect()
    }

    pub(crate) fn content_of(&self, primary_id: PrimaryId) -> Option<String> {
        self.contents.lock().get(&primary_id).map(|(c, _)| c.clone())
    }
}

#[async_trait]
impl PrimaryStore for MockPrimaryStore {
    async fn create_container(
        &self,
        _name: &str,
        _description: &str,
    ) -> Result<ContainerId, ServiceError> {
        Ok(ContainerId(1))
    }

    async fn create_node(&self, node: &NewNode) -> Result<PrimaryId, ServiceError> {
        let delay = *self.create_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let index = self.created.lock().len();
        if let Some((fail_index, error)) = self.fail_create_at.lock().as_ref() {
            if *fail_index == index {
                return Err(error.clone());
            }
        }
        let id = {
            let mut next = self.next_id.lock();
            let id = PrimaryId(*next);
            *next += 1;
            id
        };
        self.created.lock().push((id, node.clone()));
        self.contents
            .lock()
            .insert(id, (node.content.clone(), node.field_kind.clone()));
        Ok(id)
    }

    async fn update_node(
        &self,
        primary_id: PrimaryId,
        content: &str,
        field_kind: &FieldKind,
    ) -> Result<(), ServiceError> {
        self.updates.lock().push(primary_id);
        if self.fail_updates.lock().contains(&primary_id) {
            return Err(ServiceError::RequestFailed(format!(
                "update of {} rejected",
                primary_id
            )));
        }
        self.contents
            .lock()
            .insert(primary_id, (content.to_string(), field_kind.clone()));
        Ok(())
    }
}

pub(crate) struct MockGenerationService {
    submit_error: Mutex<Option<ServiceError>>,
    statuses: Mutex<VecDeque<Result<TaskStatusReport, ServiceError>>>,
    default_status: Mutex<TaskStatusReport>,
    result: Mutex<Option<TaskResult>>,
    result_errors: Mutex<VecDeque<ServiceError>>,
    status_calls: Mutex<u32>,
    result_calls: Mutex<u32>,
    pub(crate) submitted: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerationService {
    pub(crate) fn new() -> Self {
        Self {
            submit_error: Mutex::new(None),
            statuses: Mutex::new(VecDeque::new()),
            default_status: Mutex::new(TaskStatusReport::new(TaskStatus::Processing)),
            result: Mutex::new(None),
            result_errors: Mutex::new(VecDeque::new()),
            status_calls: Mutex::new(0),
            result_calls: Mutex::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn fail_submit(&self, error: ServiceError) {
        *self.submit_error.lock() = Some(error);
    }

    pub(crate) fn push_status(&self, report: TaskStatusReport) {
        self.statuses.lock().push_back(Ok(report));
    }

    pub(crate) fn push_status_error(&self, error: ServiceError) {
        self.statuses.lock().push_back(Err(error));
    }

    /// Returned once the scripted statuses run out.
    pub(crate) fn set_default_status(&self, report: TaskStatusReport) {
        *self.default_status.lock() = report;
    }

    pub(crate) fn set_result(&self, result: TaskResult) {
        *self.result.lock() = Some(result);
    }

    pub(crate) fn push_result_error(&self, error: ServiceError) {
        self.result_errors.lock().push_back(error);
    }

    pub(crate) fn status_calls(&self) -> u32 {
        *self.status_calls.lock()
    }

    pub(crate) fn result_calls(&self) -> u32 {
        *self.result_calls.lock()
    }
}

#[async_trait]
impl GenerationService for MockGenerationService {
    async fn submit_task(&self, request: &GenerationRequest) -> Result<TaskId, ServiceError> {
        if let Some(error) = self.submit_error.lock().clone() {
            return Err(error);
        }
        self.submitted.lock().push(request.clone());
        Ok(TaskId::new("task-1"))
    }

    async fn task_status(&self, _task_id: &TaskId) -> Result<TaskStatusReport, ServiceError> {
        *self.status_calls.lock() += 1;
        let scripted = self.statuses.lock().pop_front();
        match scripted {
            Some(outcome) => outcome,
            None => Ok(self.default_status.lock().clone()),
        }
    }

    async fn task_result(&self, task_id: &TaskId) -> Result<TaskResult, ServiceError> {
        *self.result_calls.lock() += 1;
        if let Some(error) = self.result_errors.lock().pop_front() {
            return Err(error);
        }
        self.result
            .lock()
            .clone()
            .ok_or_else(|| ServiceError::NotFound(format!("no result for {}", task_id)))
    }
}
