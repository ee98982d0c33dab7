//! Generation-service side of a run: submit the structure, poll the task, read its result.

pub mod poller;
pub mod request;
pub mod status;
pub mod task;

pub use poller::{PollPolicy, TaskPoller};
pub use request::{GenerationNodeRequest, GenerationRequest, TaskSubmitter};
pub use status::{parse_task_id, TaskStatus, TaskStatusReport};
pub use task::{GeneratedNode, GenerationTask, Observation, TaskResult};
