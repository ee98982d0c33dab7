//! CLI domain: parse, route, output, and presentation only.
//! No orchestration here; the route table hands off to `WorkflowDriver` and the HTTP clients.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::{map_error, CommandOutput, ExitStatus};
pub use parse::{Cli, Commands, ConfigCommands, OutputFormat};
pub use presentation::{
    format_config_show, format_progress_line, format_task_status_json, format_task_status_text,
    format_validation_result, format_workflow_error_json, format_workflow_error_text,
    format_workflow_result_json, format_workflow_result_text,
};
pub use route::RunContext;
