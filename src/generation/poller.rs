//! Task poller: fixed-interval status polling until a terminal state, a timeout, or
//! cancellation.
//!
//! Status and result are separate calls. The status endpoint is a light heartbeat polled every
//! tick; the result endpoint is only hit once the task reports `completed`. The poll budget
//! (`max_polls` × `interval`) is a hard ceiling and its expiry is reported as a timeout, never
//! as a generation failure.

use crate::error::{ServiceError, WorkflowError};
use crate::generation::status::TaskStatus;
use crate::generation::task::{GenerationTask, Observation};
use crate::progress::{Phase, ProgressReporter, WorkflowProgress};
use crate::service::GenerationService;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_polls: u32,
    /// Consecutive failed status/result calls tolerated before giving up.
    pub max_consecutive_errors: u32,
}

impl PollPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);
    pub const DEFAULT_MAX_POLLS: u32 = 200;
    pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 3;

    /// Upper bound on how long a task is waited for.
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_polls
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            max_polls: Self::DEFAULT_MAX_POLLS,
            max_consecutive_errors: Self::DEFAULT_MAX_CONSECUTIVE_ERRORS,
        }
    }
}

pub struct TaskPoller<'a> {
    service: &'a dyn GenerationService,
    policy: PollPolicy,
}

impl<'a> TaskPoller<'a> {
    pub fn new(service: &'a dyn GenerationService, policy: PollPolicy) -> Self {
        Self { service, policy }
    }

    /// Drives `task` to a terminal state. On success the returned task is `completed` and
    /// carries its result.
    pub(crate) async fn poll_until_terminal(
        &self,
        mut task: GenerationTask,
        cancel: &CancellationToken,
        progress: ProgressReporter<'_>,
    ) -> Result<GenerationTask, WorkflowError> {
        let started = Instant::now();
        let mut consecutive_errors = 0u32;

        for poll in 1..=self.policy.max_polls {
            if !task.is_terminal() {
                let fetched = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(Self::cancelled(&task)),
                    res = self.service.task_status(&task.task_id) => res,
                };
                match fetched {
                    Ok(report) => {
                        consecutive_errors = 0;
                        if task.observe(&report) == Observation::Changed {
                            debug!(
                                task_id = %task.task_id,
                                poll,
                                status = task.status.as_str(),
                                progress = task.progress_percent,
                                "Task status changed"
                            );
                        }
                    }
                    Err(source) => {
                        self.record_error(&task, poll, &mut consecutive_errors, source)?;
                    }
                }
            }

            match task.status {
                TaskStatus::Failed => {
                    let message = task
                        .message
                        .clone()
                        .unwrap_or_else(|| "generation service reported failure".to_string());
                    warn!(task_id = %task.task_id, poll, message = %message, "Generation task failed");
                    return Err(WorkflowError::GenerationFailed {
                        task_id: task.task_id,
                        message,
                    });
                }
                TaskStatus::Completed => {
                    return self
                        .fetch_result(task, poll, started, consecutive_errors, cancel, progress)
                        .await;
                }
                TaskStatus::Queued | TaskStatus::Processing => {
                    let message = task
                        .message
                        .clone()
                        .unwrap_or_else(|| format!("Task {}", task.status.as_str()));
                    progress.emit(WorkflowProgress::new(
                        Phase::Generating,
                        task.progress_percent,
                        message,
                    ));
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Self::cancelled(&task)),
                _ = sleep(self.policy.interval) => {}
            }
        }

        let elapsed = started.elapsed();
        warn!(
            task_id = %task.task_id,
            polls = self.policy.max_polls,
            elapsed_ms = elapsed.as_millis() as u64,
            "Generation task timed out"
        );
        Err(WorkflowError::PollTimeout {
            task_id: task.task_id,
            polls: self.policy.max_polls,
            elapsed,
        })
    }

    /// Fetches the result of a completed task. The poll budget no longer applies here; only
    /// `max_consecutive_errors` bounds the retries.
    async fn fetch_result(
        &self,
        mut task: GenerationTask,
        poll: u32,
        started: Instant,
        mut consecutive_errors: u32,
        cancel: &CancellationToken,
        progress: ProgressReporter<'_>,
    ) -> Result<GenerationTask, WorkflowError> {
        loop {
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Self::cancelled(&task)),
                res = self.service.task_result(&task.task_id) => res,
            };
            match fetched {
                Ok(result) => {
                    info!(
                        task_id = %task.task_id,
                        polls = poll,
                        nodes = result.nodes.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Generation task completed"
                    );
                    progress.emit(WorkflowProgress::new(
                        Phase::Generating,
                        100,
                        "Generation completed",
                    ));
                    task.attach_result(result);
                    return Ok(task);
                }
                Err(source) => {
                    self.record_error(&task, poll, &mut consecutive_errors, source)?;
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Self::cancelled(&task)),
                _ = sleep(self.policy.interval) => {}
            }
        }
    }

    fn record_error(
        &self,
        task: &GenerationTask,
        poll: u32,
        consecutive_errors: &mut u32,
        source: ServiceError,
    ) -> Result<(), WorkflowError> {
        *consecutive_errors += 1;
        warn!(
            task_id = %task.task_id,
            poll,
            consecutive_errors = *consecutive_errors,
            error = %source,
            "Generation service call failed while polling"
        );
        if *consecutive_errors >= self.policy.max_consecutive_errors.max(1) {
            return Err(WorkflowError::StatusUnavailable {
                task_id: task.task_id.clone(),
                source,
            });
        }
        Ok(())
    }

    fn cancelled(task: &GenerationTask) -> WorkflowError {
        info!(task_id = %task.task_id, "Polling cancelled");
        WorkflowError::Cancelled {
            phase: Phase::Generating,
        }
    }
}
