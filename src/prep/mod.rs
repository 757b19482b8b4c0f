/// Per-kind transforms from parameters to command tokens.
mod command;
pub use command::{
    data_sync_tokens, deploy_flags, finish_command, java_tokens, join_classpath, SynthesisOptions,
    TargetOs, DEFAULT_FLINKX_LAUNCHER, DEFAULT_JAVA_LAUNCHER,
};

/// Turns resource references into paths.
mod resource_locator;
pub use resource_locator::ResourceLocator;

/// Utility for generating the `<app_id>_node.sh` script.
mod task_script_builder;
use task_script_builder::TaskScriptBuilder;

/// Drives a single task attempt from parsed spec to finished process.
mod task_runner;
pub use task_runner::{CommandArtifact, TaskRunner, TaskStatus};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Resource id {0} not found in resource catalog")]
    ResourceNotFound(i64),
    #[error("Can't {op} a task that is {state}")]
    InvalidTransition {
        op: &'static str,
        state: TaskStatus,
    },
    #[error("Task process exited with code {0}")]
    ExecutionFailure(i32),
}
